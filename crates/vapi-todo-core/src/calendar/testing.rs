//! In-memory [`CalendarApi`] that records every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{CalendarApi, EventDraft, EventPatch, RemoteError, RemoteEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Create(EventDraft),
    Update(String, EventPatch),
    Delete(String),
    Get(String),
}

/// Stores created events in memory. With `set_failing(true)` every call
/// fails with an `Api` error after being recorded.
#[derive(Default)]
pub struct RecordingCalendar {
    calls: Mutex<Vec<RecordedCall>>,
    events: Mutex<HashMap<String, RemoteEvent>>,
    next_id: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let calendar = Self::default();
        calendar.set_failing(true);
        calendar
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn event(&self, event_id: &str) -> Option<RemoteEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(event_id)
            .cloned()
    }

    fn record(&self, call: RecordedCall) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Api {
                status: 503,
                message: "Backend Error".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarApi for RecordingCalendar {
    async fn create(&self, draft: &EventDraft) -> Result<String, RemoteError> {
        self.record(RecordedCall::Create(draft.clone()))?;
        let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut event = draft.to_event(Utc::now());
        event.id = Some(id.clone());
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), event);
        Ok(id)
    }

    async fn update(&self, event_id: &str, patch: &EventPatch) -> Result<(), RemoteError> {
        self.record(RecordedCall::Update(event_id.to_string(), patch.clone()))?;
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| RemoteError::NotFound(event_id.to_string()))?;
        patch.apply(event);
        Ok(())
    }

    async fn delete(&self, event_id: &str) -> Result<(), RemoteError> {
        self.record(RecordedCall::Delete(event_id.to_string()))?;
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(event_id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(event_id.to_string()))
    }

    async fn get(&self, event_id: &str) -> Result<RemoteEvent, RemoteError> {
        self.record(RecordedCall::Get(event_id.to_string()))?;
        self.event(event_id)
            .ok_or_else(|| RemoteError::NotFound(event_id.to_string()))
    }
}
