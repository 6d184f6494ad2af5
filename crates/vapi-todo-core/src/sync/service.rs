//! Local mutations with a best-effort calendar mirror.
//!
//! Ordering per operation:
//! - create: insert locally, then create the event, then store its id
//! - update: write locally, then patch the event if the record has one
//! - delete: delete the event if the record has one, then delete locally
//!
//! Calendar failures are logged and never returned. Local writes are never
//! rolled back because of them.

use std::sync::{Arc, Mutex};

use super::kinds::{RecordKind, UpdatableKind};
use crate::calendar::CalendarApi;
use crate::error::{CoreError, DatabaseError};
use crate::storage::Database;

pub struct SyncService {
    db: Mutex<Database>,
    calendar: Option<Arc<dyn CalendarApi>>,
    time_zone: String,
}

impl SyncService {
    /// `calendar: None` keeps everything local.
    pub fn new(db: Database, calendar: Option<Arc<dyn CalendarApi>>) -> Self {
        Self {
            db: Mutex::new(db),
            calendar,
            time_zone: "UTC".to_string(),
        }
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    pub fn is_syncing(&self) -> bool {
        self.calendar.is_some()
    }

    /// Run `f` under the connection lock. The lock never outlives the call.
    fn with_db<T>(
        &self,
        f: impl FnOnce(&Database) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let db = self.db.lock().map_err(|_| DatabaseError::Locked)?;
        f(&db)
    }

    pub fn list<K: RecordKind>(&self) -> Result<Vec<K>, CoreError> {
        Ok(self.with_db(K::list)?)
    }

    pub fn get<K: RecordKind>(&self, id: i64) -> Result<K, CoreError> {
        self.with_db(|db| K::get(db, id))?.ok_or(CoreError::NotFound {
            kind: K::LABEL,
            id,
        })
    }

    /// Insert a record, then mirror it.
    ///
    /// The returned record carries the event id only if the event was
    /// created and its id stored.
    pub async fn create<K: RecordKind>(&self, new: &K::New) -> Result<K, CoreError> {
        let mut record = self.with_db(|db| K::insert(db, new))?;
        tracing::info!(kind = K::LABEL, record_id = record.id(), "created record");

        let calendar = match &self.calendar {
            Some(calendar) if K::SYNC_REMOTE => calendar,
            _ => return Ok(record),
        };

        let draft = record.event_draft().with_time_zone(self.time_zone.as_str());
        match calendar.create(&draft).await {
            Ok(remote_event_id) => {
                let stored = self.with_db(|db| {
                    db.set_remote_event_id(K::TABLE, record.id(), &remote_event_id)
                });
                match stored {
                    Ok(()) => {
                        tracing::debug!(
                            kind = K::LABEL,
                            record_id = record.id(),
                            remote_event_id = %remote_event_id,
                            "linked calendar event"
                        );
                        record.set_remote_event_id(remote_event_id);
                    }
                    Err(e) => tracing::warn!(
                        kind = K::LABEL,
                        record_id = record.id(),
                        remote_event_id = %remote_event_id,
                        error = %e,
                        "failed to store calendar event id"
                    ),
                }
            }
            Err(e) => tracing::warn!(
                kind = K::LABEL,
                record_id = record.id(),
                error = %e,
                "calendar event not created; record kept locally"
            ),
        }

        Ok(record)
    }

    /// Apply a change locally, then push it to the linked event.
    pub async fn update<K: UpdatableKind>(&self, id: i64, change: &K::Change) -> Result<K, CoreError> {
        let record = self
            .with_db(|db| {
                let Some(mut record) = K::get(db, id)? else {
                    return Ok(None);
                };
                K::apply(db, &mut record, change)?;
                Ok(Some(record))
            })?
            .ok_or(CoreError::NotFound {
                kind: K::LABEL,
                id,
            })?;
        tracing::info!(kind = K::LABEL, record_id = id, "updated record");

        if let (Some(remote_event_id), Some(calendar)) = (record.remote_event_id(), &self.calendar) {
            let mut patch = record.event_patch();
            patch.time_zone = self.time_zone.clone();
            if let Err(e) = calendar.update(remote_event_id, &patch).await {
                tracing::warn!(
                    kind = K::LABEL,
                    record_id = id,
                    remote_event_id = %remote_event_id,
                    error = %e,
                    "calendar event not updated"
                );
            }
        }

        Ok(record)
    }

    /// Delete the linked event, then the record.
    pub async fn delete<K: RecordKind>(&self, id: i64) -> Result<(), CoreError> {
        let record = self.get::<K>(id)?;

        if let (Some(remote_event_id), Some(calendar)) = (record.remote_event_id(), &self.calendar) {
            if let Err(e) = calendar.delete(remote_event_id).await {
                tracing::warn!(
                    kind = K::LABEL,
                    record_id = id,
                    remote_event_id = %remote_event_id,
                    error = %e,
                    "calendar event not deleted"
                );
            }
        }

        self.with_db(|db| db.delete(K::TABLE, id))?;
        tracing::info!(kind = K::LABEL, record_id = id, "deleted record");
        Ok(())
    }
}
