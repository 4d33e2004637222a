//! Events API client methods

use super::{ApiRequest, ClientError, SessionClient};
use crate::types::{DeleteEventRequest, EventPage, ListQuery};
use eventdesk_core::{Event, EventDraft, EventId, EventPatch, ValidationError};

impl SessionClient {
    /// List events, one page at a time
    pub async fn list_events(&self, query: &ListQuery) -> Result<EventPage, ClientError> {
        let request = ApiRequest::get("/events").query_pairs(query.to_pairs());
        self.execute(&request).await
    }

    /// Get a single event
    pub async fn get_event(&self, id: EventId) -> Result<Event, ClientError> {
        let request = ApiRequest::get(format!("/events/{id}"));
        self.execute(&request).await
    }

    /// Create an event
    pub async fn create_event(&self, draft: &EventDraft) -> Result<Event, ClientError> {
        draft.validate()?;
        let request = ApiRequest::post("/events").json(draft)?;
        self.execute(&request).await
    }

    /// Update the fields set in `patch`
    pub async fn update_event(&self, id: EventId, patch: &EventPatch) -> Result<Event, ClientError> {
        patch.validate()?;
        let request = ApiRequest::patch(format!("/events/{id}")).json(patch)?;
        self.execute(&request).await
    }

    /// Delete an event. The API wants the admin password as confirmation.
    pub async fn delete_event(&self, id: EventId, password: &str) -> Result<(), ClientError> {
        if password.is_empty() {
            return Err(ValidationError::PasswordRequired.into());
        }
        let request = ApiRequest::delete(format!("/events/{id}")).json(&DeleteEventRequest {
            password: password.to_string(),
        })?;
        self.execute_empty(&request).await
    }
}
