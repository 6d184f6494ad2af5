//! Google Calendar mirroring of local records.
//!
//! [`SyncService`] owns the database and an optional calendar client and
//! performs every record mutation. [`RecordKind`] describes the per-kind
//! storage calls and event templates it needs.

pub mod kinds;
pub mod service;


pub use kinds::{RecordKind, TodoChange, UpdatableKind};
pub use service::SyncService;
