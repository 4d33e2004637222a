//! Eventdesk core types: events, session storage and form validation

pub mod error;
pub mod session;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "tests"))]
pub mod tests;

pub use error::{CoreError, CoreResult};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::{Event, EventDraft, EventId, EventPatch, EventStatus};
pub use validation::ValidationError;
