//! vapi-todo-core: to-dos, reminders and calendar entries for a voice
//! assistant, mirrored to Google Calendar.
//!
//! - [`storage`]: SQLite records and TOML configuration
//! - [`auth`]: Google OAuth credential lifecycle
//! - [`calendar`]: Google Calendar REST client
//! - [`sync`]: local mutations with best-effort calendar mirroring
//! - [`tools`]: tool-call envelopes and dispatch

pub mod auth;
pub mod calendar;
pub mod error;
pub mod records;
pub mod storage;
pub mod sync;
pub mod tools;

pub use auth::{Credential, CredentialSources, TokenStore};
pub use calendar::{CalendarApi, GoogleCalendar, RemoteError};
pub use error::{ConfigError, CoreError, DatabaseError, OAuthError, ValidationError};
pub use records::{CalendarEntry, NewCalendarEntry, NewReminder, NewTodo, Reminder, Todo};
pub use storage::{Config, Database};
pub use sync::SyncService;
pub use tools::{ToolName, ToolRequest, ToolResponse, ToolRouter};
