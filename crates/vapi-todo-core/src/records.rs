//! Local record kinds and the shapes returned to tool callers.
//!
//! Each record carries `google_calendar_event_id`, the id of the mirrored
//! Google Calendar event. It is `None` until a remote create succeeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub google_calendar_event_id: Option<String>,
}

/// Fields supplied by a `createTodo` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
}

/// A free-text reminder with an importance label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub reminder_text: String,
    pub importance: String,
    pub google_calendar_event_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewReminder {
    pub reminder_text: String,
    pub importance: String,
}

/// A scheduled calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_from: DateTime<Utc>,
    pub event_to: DateTime<Utc>,
    pub google_calendar_event_id: Option<String>,
}

/// Fields supplied by an `addCalendarEntry` call, with the time window
/// already resolved (see [`crate::tools::timestamps`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendarEntry {
    pub title: String,
    pub description: Option<String>,
    pub event_from: DateTime<Utc>,
    pub event_to: DateTime<Utc>,
}

/// Todo as listed by `getTodos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl From<&Todo> for TodoResponse {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title.clone(),
            description: todo.description.clone(),
            completed: todo.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderResponse {
    pub id: i64,
    pub reminder_text: String,
    pub importance: String,
}

impl From<&Reminder> for ReminderResponse {
    fn from(reminder: &Reminder) -> Self {
        Self {
            id: reminder.id,
            reminder_text: reminder.reminder_text.clone(),
            importance: reminder.importance.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntryResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_from: DateTime<Utc>,
    pub event_to: DateTime<Utc>,
}

impl From<&CalendarEntry> for CalendarEntryResponse {
    fn from(entry: &CalendarEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            description: entry.description.clone(),
            event_from: entry.event_from,
            event_to: entry.event_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn todo_response_omits_back_reference() {
        let todo = Todo {
            id: 3,
            title: "Buy milk".to_string(),
            description: None,
            completed: false,
            google_calendar_event_id: Some("evt-1".to_string()),
        };
        let json = serde_json::to_value(TodoResponse::from(&todo)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "title": "Buy milk", "description": null, "completed": false})
        );
    }

    #[test]
    fn calendar_entry_response_serializes_rfc3339() {
        let entry = CalendarEntry {
            id: 1,
            title: "Standup".to_string(),
            description: Some("daily".to_string()),
            event_from: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            event_to: Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap(),
            google_calendar_event_id: None,
        };
        let json = serde_json::to_value(CalendarEntryResponse::from(&entry)).unwrap();
        assert_eq!(json["event_from"], "2024-01-01T10:00:00Z");
        assert_eq!(json["event_to"], "2024-01-01T11:00:00Z");
    }
}
