//! Event payloads exchanged with Google Calendar.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// `start` / `end` of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day events carry a date instead of a dateTime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn at(instant: DateTime<Utc>, time_zone: &str) -> Self {
        Self {
            date_time: Some(instant.to_rfc3339()),
            date: None,
            time_zone: Some(time_zone.to_string()),
        }
    }
}

/// An event as Google returns it.
///
/// Fields this crate does not model are kept in `extra` and written back
/// unchanged on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A new event. Missing start means now, missing end means one hour after start.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub time_zone: String,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
            start: None,
            end: None,
            time_zone: "UTC".to_string(),
        }
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Request body, with defaults resolved against `now`.
    pub fn to_event(&self, now: DateTime<Utc>) -> RemoteEvent {
        let start = self.start.unwrap_or(now);
        let end = self.end.unwrap_or(start + Duration::hours(1));
        RemoteEvent {
            summary: Some(self.title.clone()),
            description: Some(self.description.clone().unwrap_or_default()),
            start: Some(EventTime::at(start, &self.time_zone)),
            end: Some(EventTime::at(end, &self.time_zone)),
            ..RemoteEvent::default()
        }
    }
}

/// Partial change to an existing event. `None` leaves a field as it is.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPatch {
    /// An empty title is ignored.
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub time_zone: String,
}

impl Default for EventPatch {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            start: None,
            end: None,
            time_zone: "UTC".to_string(),
        }
    }
}

impl EventPatch {
    pub fn apply(&self, event: &mut RemoteEvent) {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            event.summary = Some(title.to_string());
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }
        if let Some(start) = self.start {
            event.start = Some(EventTime::at(start, &self.time_zone));
        }
        if let Some(end) = self.end {
            event.end = Some(EventTime::at(end, &self.time_zone));
        }
    }
}
