//! Request and response bodies of the auth and events APIs

use eventdesk_core::{Event, EventStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Login request
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signup request
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Token response from the login and refresh endpoints
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    /// Some servers echo the refresh token in the body in addition to the cookie
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse").finish_non_exhaustive()
    }
}

/// Body of an event deletion. The API asks for the admin password again.
#[derive(Clone, Serialize)]
pub struct DeleteEventRequest {
    pub password: String,
}

/// One page of events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPage {
    #[serde(default)]
    pub data: Vec<Event>,
    #[serde(default)]
    pub total: u64,
}

impl EventPage {
    /// Number of pages needed to show `total` events `limit` at a time
    pub fn page_count(&self, limit: u32) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(limit))
    }
}

/// Paging, search and status filter for the event list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub status: Option<EventStatus>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 5,
            search: None,
            status: None,
        }
    }
}

impl ListQuery {
    /// Query-string pairs. Empty filters are left out.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];

        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search".to_string(), search.to_string()));
            }
        }
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.to_string()));
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_query_skips_empty_filters() {
        let query = ListQuery {
            search: Some("  ".to_string()),
            ..ListQuery::default()
        };

        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn list_query_includes_search_and_status() {
        let query = ListQuery {
            page: 3,
            limit: 10,
            search: Some("jazz".to_string()),
            status: Some(EventStatus::Completed),
        };

        let pairs = query.to_pairs();
        assert!(pairs.contains(&("search".to_string(), "jazz".to_string())));
        assert!(pairs.contains(&("status".to_string(), "Completed".to_string())));
        assert!(pairs.contains(&("page".to_string(), "3".to_string())));
    }

    #[test]
    fn event_page_tolerates_missing_fields() {
        let page: EventPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn page_count_rounds_up() {
        let page = EventPage {
            data: Vec::new(),
            total: 11,
        };
        assert_eq!(page.page_count(5), 3);
        assert_eq!(page.page_count(0), 0);
    }

    #[test]
    fn signup_uses_camel_case_confirmation() {
        let body = serde_json::to_value(SignupRequest {
            email: "a@b.com".to_string(),
            name: "Ada".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        })
        .unwrap();
        assert_eq!(body["confirmPassword"], "secret1");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let login = LoginRequest {
            email: "a@b.com".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{login:?}").contains("hunter22"));

        let tokens: TokenResponse =
            serde_json::from_value(json!({ "accessToken": "tok-123" })).unwrap();
        assert!(!format!("{tokens:?}").contains("tok-123"));
    }
}
