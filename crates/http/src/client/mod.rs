//! Session-aware API client

pub mod auth;
pub mod error;
pub mod events;
pub mod posters;
mod refresh;
pub mod request;

pub use error::ClientError;
pub use posters::PosterStore;
pub use request::ApiRequest;

use eventdesk_core::{MemorySessionStore, SessionStore};
use reqwest::cookie::Jar;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Callback run whenever a request fails because the session cannot be
/// recovered. Applications use it to send the user back to login.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Default refresh endpoint, relative to the base URL
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";

/// How many times a single request may trigger a token refresh
const MAX_REFRESH_ATTEMPTS: u32 = 1;

/// API client that carries the session
///
/// Every request gets the stored access token as a bearer credential. When
/// the server answers 401 the client refreshes the token once, using the
/// refresh cookie held in its cookie jar, and re-sends the request with the
/// new token. Concurrent requests that hit 401 together share one refresh.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    base_url: String,
    refresh_url: String,
    store: Arc<dyn SessionStore>,
    cookies: Arc<Jar>,
    refresh_lock: tokio::sync::Mutex<()>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl SessionClient {
    /// Create a new client with an in-memory session
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Absolute URL of the refresh endpoint
    pub fn refresh_url(&self) -> &str {
        &self.inner.refresh_url
    }

    /// Cookie jar holding the refresh credential
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.inner.cookies
    }

    /// The session store this client reads and writes
    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    /// Current access token, if any
    pub async fn access_token(&self) -> Result<Option<String>, ClientError> {
        Ok(self.inner.store.get().await?)
    }

    /// Send a request, refreshing the session once on 401
    ///
    /// Every response other than 401 is returned unchanged, error statuses
    /// included. A 401 on an anonymous request is returned unchanged too.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionExpired`] when the token cannot be
    /// refreshed, when the retried request is rejected again, or when the
    /// request does not allow refreshing. Transport failures are returned
    /// as [`ClientError::Request`] and are never retried.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let mut token = if request.is_authenticated() {
            self.access_token().await?
        } else {
            None
        };
        let mut attempt = 0;

        loop {
            let response = self.dispatch(request, token.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED || !request.is_authenticated() {
                return Ok(response);
            }

            if !request.allows_refresh() {
                return Err(self.session_expired(format!(
                    "{} {} was rejected and may not refresh",
                    request.method(),
                    request.path()
                )));
            }
            if attempt >= MAX_REFRESH_ATTEMPTS {
                return Err(self.session_expired(format!(
                    "{} {} was rejected after refreshing the session",
                    request.method(),
                    request.path()
                )));
            }

            attempt += 1;
            debug!(
                method = %request.method(),
                path = request.path(),
                attempt,
                "Access token rejected, refreshing session"
            );
            token = Some(self.refresh_after(token.as_deref()).await?);
        }
    }

    /// Send a request and decode a JSON success body
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request and discard the success body
    pub async fn execute_empty(&self, request: &ApiRequest) -> Result<(), ClientError> {
        let response = self.send(request).await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Build and transmit one attempt of `request`
    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.inner.base_url, request.path());
        let mut headers = request.headers().clone();
        headers.remove(header::AUTHORIZATION);

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ClientError::Configuration("access token is not a valid header value".into())
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        } else if request.is_authenticated() {
            debug!(path = request.path(), "No access token stored, sending without one");
        }

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url)
            .headers(headers);
        if !request.query_params().is_empty() {
            builder = builder.query(request.query_params());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(method = %request.method(), path = request.path(), "Sending request");
        Ok(builder.send().await?)
    }

    /// Report an unrecoverable authorization failure
    fn session_expired(&self, reason: String) -> ClientError {
        warn!(%reason, "Session cannot be recovered");
        if let Some(hook) = &self.inner.on_session_expired {
            hook();
        }
        ClientError::SessionExpired(reason)
    }
}

/// Pass a 2xx response through, turn anything else into a typed error
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response).await;
    Err(ClientError::from_status(status, message))
}

/// Best human-readable message from an error response: the `message` field
/// of a JSON body, else the raw text, else the status reason.
pub(crate) async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }

    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| status.to_string(), str::to_string)
    } else {
        text.to_string()
    }
}

/// Builder for SessionClient
#[derive(Default)]
pub struct SessionClientBuilder {
    base_url: Option<String>,
    refresh_path: Option<String>,
    store: Option<Arc<dyn SessionStore>>,
    cookies: Option<Arc<Jar>>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl SessionClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the refresh endpoint path (default `/auth/refresh-token`)
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Set where the access token is kept
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share a cookie jar, e.g. one restored from disk
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookies = Some(jar);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Run `hook` whenever the session turns out to be unrecoverable
    pub fn on_session_expired<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<SessionClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let refresh_path = self
            .refresh_path
            .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string());
        let refresh_url = if refresh_path.starts_with("http://") || refresh_path.starts_with("https://") {
            refresh_path
        } else {
            format!("{base_url}/{}", refresh_path.trim_start_matches('/'))
        };

        let cookies = self.cookies.unwrap_or_default();
        let mut client_builder = ClientBuilder::new().cookie_provider(Arc::clone(&cookies));

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder = client_builder.user_agent(concat!("eventdesk/", env!("CARGO_PKG_VERSION")));
        }

        let http = client_builder.build()?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));

        Ok(SessionClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                refresh_url,
                store,
                cookies,
                refresh_lock: tokio::sync::Mutex::new(()),
                on_session_expired: self.on_session_expired,
            }),
        })
    }
}
