//! Authentication API client methods

use super::{ApiRequest, ClientError, SessionClient, ensure_success};
use crate::types::{LoginRequest, SignupRequest, TokenResponse};
use eventdesk_core::validation;
use reqwest::StatusCode;
use tracing::info;

impl SessionClient {
    /// Log in and store the issued access token
    ///
    /// The server also sets the refresh cookie, which lands in this
    /// client's cookie jar.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ClientError> {
        validation::validate_login(email, password)?;

        let request = ApiRequest::post("/auth/login").anonymous().json(&LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        })?;

        let response = self.send(&request).await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST
        ) {
            return Err(ClientError::InvalidCredentials(
                "Invalid email or password".into(),
            ));
        }

        let response = ensure_success(response).await?;
        let tokens: TokenResponse = serde_json::from_slice(&response.bytes().await?)?;
        if tokens.access_token.is_empty() {
            return Err(ClientError::InvalidCredentials(
                "Login response carried no access token".into(),
            ));
        }

        self.inner.store.set(&tokens.access_token).await?;
        info!(email = email.trim(), "Logged in");
        Ok(tokens)
    }

    /// Register a new account. Does not log in.
    pub async fn signup(
        &self,
        email: &str,
        name: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), ClientError> {
        validation::validate_signup(email, name, password, confirm_password)?;

        let request = ApiRequest::post("/auth/signup").anonymous().json(&SignupRequest {
            email: email.trim().to_string(),
            name: name.trim().to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        })?;

        self.execute_empty(&request).await?;
        info!(email = email.trim(), "Account registered");
        Ok(())
    }

    /// Forget the stored access token. Local only; the server is not called.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.inner.store.clear().await?;
        info!("Logged out");
        Ok(())
    }
}
