//! HTTP client for the events API
//!
//! [`SessionClient`] attaches the stored access token to every request and
//! recovers from an expired token by refreshing it once and retrying.

pub mod client;
pub mod types;

pub use client::{
    ApiRequest, ClientError, PosterStore, SessionClient, SessionClientBuilder,
    SessionExpiredHook,
};
pub use types::{EventPage, ListQuery, TokenResponse};
