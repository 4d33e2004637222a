//! Access-token refresh
//!
//! Refreshes are single flight: callers queue on an async mutex, and a
//! caller that gets the lock after another caller already replaced the
//! token it was rejected with reuses the replacement instead of calling
//! the refresh endpoint again.

use super::{ClientError, SessionClient, error_message};
use crate::types::TokenResponse;
use tracing::{debug, info, warn};

impl SessionClient {
    /// Obtain a fresh access token after `stale` was rejected
    pub(crate) async fn refresh_after(&self, stale: Option<&str>) -> Result<String, ClientError> {
        let _guard = self.inner.refresh_lock.lock().await;

        if let Some(current) = self.access_token().await? {
            if stale != Some(current.as_str()) {
                debug!("Session was refreshed by a concurrent request, reusing its token");
                return Ok(current);
            }
        }

        self.request_new_token().await
    }

    /// Call the refresh endpoint and store the token it issues.
    /// The refresh credential travels in the cookie jar; the body is empty.
    async fn request_new_token(&self) -> Result<String, ClientError> {
        let response = self
            .inner
            .http
            .post(&self.inner.refresh_url)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "Token refresh request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(self.session_expired(format!(
                "token refresh rejected ({status}): {message}"
            )));
        }

        let tokens: TokenResponse = match response.json().await {
            Ok(tokens) => tokens,
            Err(e) => {
                return Err(self.session_expired(format!("unreadable refresh response: {e}")));
            }
        };
        if tokens.access_token.is_empty() {
            return Err(self.session_expired("refresh response carried no access token".into()));
        }

        self.inner.store.set(&tokens.access_token).await?;
        info!("Access token refreshed");
        Ok(tokens.access_token)
    }
}
