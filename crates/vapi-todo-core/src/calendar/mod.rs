//! Remote calendar mirror.
//!
//! [`CalendarApi`] is the seam between the sync orchestrator and Google
//! Calendar. Every operation returns `Result<_, RemoteError>`; callers decide
//! whether a failure matters (the orchestrator never lets one escape).

mod event;
mod google;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use event::{EventDraft, EventPatch, EventTime, RemoteEvent};
pub use google::GoogleCalendar;

use async_trait::async_trait;
use thiserror::Error;

/// Google Calendar v3 REST root.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Any failure of a remote calendar call.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Google authorization unavailable: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Calendar API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Remote event {0} not found")]
    NotFound(String),

    #[error("Unexpected calendar response: {0}")]
    InvalidResponse(String),
}

/// Create/update/delete/get against one calendar.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Insert an event and return its remote id.
    async fn create(&self, draft: &EventDraft) -> Result<String, RemoteError>;

    /// Fetch the event, apply the patch, write the merged event back.
    async fn update(&self, event_id: &str, patch: &EventPatch) -> Result<(), RemoteError>;

    async fn delete(&self, event_id: &str) -> Result<(), RemoteError>;

    async fn get(&self, event_id: &str) -> Result<RemoteEvent, RemoteError>;
}
