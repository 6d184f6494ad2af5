//! How each record kind is stored and what its calendar event looks like.

use crate::calendar::{EventDraft, EventPatch};
use crate::error::DatabaseError;
use crate::records::{CalendarEntry, NewCalendarEntry, NewReminder, NewTodo, Reminder, Todo};
use crate::storage::{Database, Table};

const TODO_FALLBACK_DESCRIPTION: &str = "Task from VAPI Todo System";
const REMINDER_FOOTER: &str = "Reminder from VAPI Todo System";
const EVENT_FALLBACK_DESCRIPTION: &str = "Event from VAPI Todo System";

/// A local record that can be mirrored to a calendar event.
pub trait RecordKind: Sized + Send + Sync + 'static {
    /// Fields supplied when creating one.
    type New: Sync;

    /// Name used in logs and not-found errors.
    const LABEL: &'static str;
    const TABLE: Table;
    /// Whether creating one also creates a calendar event.
    const SYNC_REMOTE: bool = true;

    fn insert(db: &Database, new: &Self::New) -> Result<Self, DatabaseError>;
    fn get(db: &Database, id: i64) -> Result<Option<Self>, DatabaseError>;
    fn list(db: &Database) -> Result<Vec<Self>, DatabaseError>;

    fn id(&self) -> i64;
    fn remote_event_id(&self) -> Option<&str>;
    fn set_remote_event_id(&mut self, remote_event_id: String);

    fn event_draft(&self) -> EventDraft;
}

/// A record kind that supports an in-place change after creation.
pub trait UpdatableKind: RecordKind {
    type Change: Sync;

    /// Apply `change` to the stored row and to `record`.
    fn apply(db: &Database, record: &mut Self, change: &Self::Change) -> Result<(), DatabaseError>;

    /// Calendar change matching the record's current state.
    fn event_patch(&self) -> EventPatch;
}

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|s| !s.is_empty())
}

impl RecordKind for Todo {
    type New = NewTodo;
    const LABEL: &'static str = "todo";
    const TABLE: Table = Table::Todos;

    fn insert(db: &Database, new: &NewTodo) -> Result<Self, DatabaseError> {
        db.insert_todo(new)
    }

    fn get(db: &Database, id: i64) -> Result<Option<Self>, DatabaseError> {
        db.todo(id)
    }

    fn list(db: &Database) -> Result<Vec<Self>, DatabaseError> {
        db.todos()
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn remote_event_id(&self) -> Option<&str> {
        self.google_calendar_event_id.as_deref()
    }

    fn set_remote_event_id(&mut self, remote_event_id: String) {
        self.google_calendar_event_id = Some(remote_event_id);
    }

    fn event_draft(&self) -> EventDraft {
        let description = non_empty(&self.description).unwrap_or(TODO_FALLBACK_DESCRIPTION);
        EventDraft::new(format!("TODO: {}", self.title), Some(description.to_string()))
    }
}

/// Changes a todo accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoChange {
    Complete,
}

impl UpdatableKind for Todo {
    type Change = TodoChange;

    fn apply(db: &Database, record: &mut Self, change: &TodoChange) -> Result<(), DatabaseError> {
        match change {
            TodoChange::Complete => {
                if !db.set_todo_completed(record.id, true)? {
                    return Err(DatabaseError::QueryFailed(format!(
                        "todo {} no longer exists",
                        record.id
                    )));
                }
                record.completed = true;
            }
        }
        Ok(())
    }

    fn event_patch(&self) -> EventPatch {
        let (title, description) = if self.completed {
            (
                format!("COMPLETED: {}", self.title),
                format!(
                    "{}\n\nStatus: Completed",
                    self.description.as_deref().unwrap_or_default()
                ),
            )
        } else {
            let draft = self.event_draft();
            (draft.title, draft.description.unwrap_or_default())
        };
        EventPatch {
            title: Some(title),
            description: Some(description),
            ..EventPatch::default()
        }
    }
}

impl RecordKind for Reminder {
    type New = NewReminder;
    const LABEL: &'static str = "reminder";
    const TABLE: Table = Table::Reminders;

    fn insert(db: &Database, new: &NewReminder) -> Result<Self, DatabaseError> {
        db.insert_reminder(new)
    }

    fn get(db: &Database, id: i64) -> Result<Option<Self>, DatabaseError> {
        db.reminder(id)
    }

    fn list(db: &Database) -> Result<Vec<Self>, DatabaseError> {
        db.reminders()
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn remote_event_id(&self) -> Option<&str> {
        self.google_calendar_event_id.as_deref()
    }

    fn set_remote_event_id(&mut self, remote_event_id: String) {
        self.google_calendar_event_id = Some(remote_event_id);
    }

    fn event_draft(&self) -> EventDraft {
        EventDraft::new(
            format!("REMINDER: {}", self.reminder_text),
            Some(format!("Importance: {}\n{REMINDER_FOOTER}", self.importance)),
        )
    }
}

impl RecordKind for CalendarEntry {
    type New = NewCalendarEntry;
    const LABEL: &'static str = "calendar entry";
    const TABLE: Table = Table::CalendarEvents;

    fn insert(db: &Database, new: &NewCalendarEntry) -> Result<Self, DatabaseError> {
        db.insert_calendar_entry(new)
    }

    fn get(db: &Database, id: i64) -> Result<Option<Self>, DatabaseError> {
        db.calendar_entry(id)
    }

    fn list(db: &Database) -> Result<Vec<Self>, DatabaseError> {
        db.calendar_entries()
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn remote_event_id(&self) -> Option<&str> {
        self.google_calendar_event_id.as_deref()
    }

    fn set_remote_event_id(&mut self, remote_event_id: String) {
        self.google_calendar_event_id = Some(remote_event_id);
    }

    fn event_draft(&self) -> EventDraft {
        let description = non_empty(&self.description).unwrap_or(EVENT_FALLBACK_DESCRIPTION);
        EventDraft::new(self.title.clone(), Some(description.to_string()))
            .with_window(self.event_from, self.event_to)
    }
}
