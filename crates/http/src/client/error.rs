//! Errors returned by the session client and poster store

use eventdesk_core::{CoreError, ValidationError};
use thiserror::Error;

/// Everything that can go wrong talking to the events API or the poster store
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport error
    #[error("Could not reach the server: {0}")]
    Request(#[from] reqwest::Error),

    /// The session could not be recovered; the user has to log in again
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Login was rejected
    #[error("{0}")]
    InvalidCredentials(String),

    /// Any other non-2xx status, with the server's message
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed on an anonymous request
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// 404, e.g. an unknown event id
    #[error("Not found: {0}")]
    NotFound(String),

    /// 400, usually a rejected payload
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 403, e.g. a wrong confirmation password
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input rejected before sending
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Session storage failed
    #[error("Session storage error: {0}")]
    Session(#[from] CoreError),

    /// Object storage rejected an operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// Bad client or storage settings
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Map a non-2xx status to its variant
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// True when the caller must send the user back to login
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_REQUEST, "x".into()),
            ClientError::BadRequest(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, "x".into()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_GATEWAY, "x".into()),
            ClientError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn only_session_expiry_requires_login() {
        assert!(ClientError::SessionExpired("refresh rejected".into()).is_auth_expired());
        assert!(!ClientError::AuthenticationFailed("nope".into()).is_auth_expired());
        assert!(!ClientError::Validation(ValidationError::EmailRequired).is_auth_expired());
    }
}
