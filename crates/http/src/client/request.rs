//! Immutable description of an API call
//!
//! An [`ApiRequest`] can be sent more than once: the session client builds
//! a fresh HTTP request from it for every attempt, with whatever access
//! token is current for that attempt.

use super::ClientError;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<JsonValue>,
    authenticated: bool,
    refresh: bool,
}

impl ApiRequest {
    /// Request for `path`, relative to the client's base URL
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            authenticated: true,
            refresh: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query-string pair
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query-string pairs
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Set a header. The Authorization header is managed by the client and
    /// is replaced whenever an access token is attached.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Serialization`] if `body` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send without the access token. A 401 on such a request is an
    /// ordinary response, not a session problem.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self.refresh = false;
        self
    }

    /// Attach the access token but never refresh it. A 401 is reported as
    /// an expired session straight away.
    #[must_use]
    pub fn without_refresh(mut self) -> Self {
        self.refresh = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&JsonValue> {
        self.body.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn allows_refresh(&self) -> bool {
        self.refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_to_authenticated_with_refresh() {
        let request = ApiRequest::get("/events");
        assert!(request.is_authenticated());
        assert!(request.allows_refresh());
        assert!(request.body().is_none());
    }

    #[test]
    fn anonymous_requests_never_refresh() {
        let request = ApiRequest::post("/auth/login").anonymous();
        assert!(!request.is_authenticated());
        assert!(!request.allows_refresh());
    }

    #[test]
    fn without_refresh_keeps_token() {
        let request = ApiRequest::get("/events").without_refresh();
        assert!(request.is_authenticated());
        assert!(!request.allows_refresh());
    }

    #[test]
    fn json_body_is_captured() {
        let request = ApiRequest::post("/events")
            .json(&json!({ "title": "Launch" }))
            .unwrap();
        assert_eq!(request.body(), Some(&json!({ "title": "Launch" })));
        assert_eq!(request.method(), &Method::POST);
    }
}
