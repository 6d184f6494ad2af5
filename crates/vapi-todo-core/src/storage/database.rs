//! SQLite-based record storage.
//!
//! Provides persistent storage for:
//! - To-do items
//! - Reminders
//! - Calendar entries
//!
//! Every write is its own implicit transaction; nothing here spans
//! several statements, so a record and its calendar back-reference are
//! committed separately.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::migrations;
use crate::error::DatabaseError;
use crate::records::{CalendarEntry, NewCalendarEntry, NewReminder, NewTodo, Reminder, Todo};

/// Tables holding a record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Todos,
    Reminders,
    CalendarEvents,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Todos => "todos",
            Table::Reminders => "reminders",
            Table::CalendarEvents => "calendar_events",
        }
    }
}

/// SQLite database for the three record kinds.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `path`, creating file and schema if missing.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Todos ─────────────────────────────────────────────────────────────

    pub fn insert_todo(&self, new: &NewTodo) -> Result<Todo, DatabaseError> {
        self.conn.execute(
            "INSERT INTO todos (title, description, completed) VALUES (?1, ?2, 0)",
            params![new.title, new.description],
        )?;
        Ok(Todo {
            id: self.conn.last_insert_rowid(),
            title: new.title.clone(),
            description: new.description.clone(),
            completed: false,
            google_calendar_event_id: None,
        })
    }

    pub fn todo(&self, id: i64) -> Result<Option<Todo>, DatabaseError> {
        let todo = self
            .conn
            .query_row(
                "SELECT id, title, description, completed, google_calendar_event_id
                 FROM todos WHERE id = ?1",
                params![id],
                todo_from_row,
            )
            .optional()?;
        Ok(todo)
    }

    pub fn todos(&self) -> Result<Vec<Todo>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, completed, google_calendar_event_id
             FROM todos ORDER BY id",
        )?;
        let rows = stmt.query_map([], todo_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Returns `false` when no todo has this id.
    pub fn set_todo_completed(&self, id: i64, completed: bool) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE todos SET completed = ?1 WHERE id = ?2",
            params![completed, id],
        )?;
        Ok(changed > 0)
    }

    // ── Reminders ─────────────────────────────────────────────────────────

    pub fn insert_reminder(&self, new: &NewReminder) -> Result<Reminder, DatabaseError> {
        self.conn.execute(
            "INSERT INTO reminders (reminder_text, importance) VALUES (?1, ?2)",
            params![new.reminder_text, new.importance],
        )?;
        Ok(Reminder {
            id: self.conn.last_insert_rowid(),
            reminder_text: new.reminder_text.clone(),
            importance: new.importance.clone(),
            google_calendar_event_id: None,
        })
    }

    pub fn reminder(&self, id: i64) -> Result<Option<Reminder>, DatabaseError> {
        let reminder = self
            .conn
            .query_row(
                "SELECT id, reminder_text, importance, google_calendar_event_id
                 FROM reminders WHERE id = ?1",
                params![id],
                reminder_from_row,
            )
            .optional()?;
        Ok(reminder)
    }

    pub fn reminders(&self) -> Result<Vec<Reminder>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, reminder_text, importance, google_calendar_event_id
             FROM reminders ORDER BY id",
        )?;
        let rows = stmt.query_map([], reminder_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Calendar entries ──────────────────────────────────────────────────

    pub fn insert_calendar_entry(
        &self,
        new: &NewCalendarEntry,
    ) -> Result<CalendarEntry, DatabaseError> {
        self.conn.execute(
            "INSERT INTO calendar_events (title, description, event_from, event_to)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                new.title,
                new.description,
                new.event_from.to_rfc3339(),
                new.event_to.to_rfc3339(),
            ],
        )?;
        Ok(CalendarEntry {
            id: self.conn.last_insert_rowid(),
            title: new.title.clone(),
            description: new.description.clone(),
            event_from: new.event_from,
            event_to: new.event_to,
            google_calendar_event_id: None,
        })
    }

    pub fn calendar_entry(&self, id: i64) -> Result<Option<CalendarEntry>, DatabaseError> {
        let entry = self
            .conn
            .query_row(
                "SELECT id, title, description, event_from, event_to, google_calendar_event_id
                 FROM calendar_events WHERE id = ?1",
                params![id],
                calendar_entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn calendar_entries(&self) -> Result<Vec<CalendarEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, event_from, event_to, google_calendar_event_id
             FROM calendar_events ORDER BY id",
        )?;
        let rows = stmt.query_map([], calendar_entry_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Shared ────────────────────────────────────────────────────────────

    /// Store the remote event id on a record.
    pub fn set_remote_event_id(
        &self,
        table: Table,
        id: i64,
        remote_event_id: &str,
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE {} SET google_calendar_event_id = ?1 WHERE id = ?2",
            table.name()
        );
        self.conn.execute(&sql, params![remote_event_id, id])?;
        Ok(())
    }

    /// Delete a record. Returns whether a row was removed.
    pub fn delete(&self, table: Table, id: i64) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
        let removed = self.conn.execute(&sql, params![id])?;
        Ok(removed > 0)
    }
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
        google_calendar_event_id: row.get(4)?,
    })
}

fn reminder_from_row(row: &Row<'_>) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        reminder_text: row.get(1)?,
        importance: row.get(2)?,
        google_calendar_event_id: row.get(3)?,
    })
}

fn calendar_entry_from_row(row: &Row<'_>) -> rusqlite::Result<CalendarEntry> {
    Ok(CalendarEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        event_from: timestamp_column(row, 3)?,
        event_to: timestamp_column(row, 4)?,
        google_calendar_event_id: row.get(5)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
