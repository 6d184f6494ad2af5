//! Database schema migrations for vapi-todo.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use indoc::indoc;
use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: the three record tables.
///
/// Every table carries a nullable `google_calendar_event_id` holding the id
/// of the mirrored Google Calendar event, if one was created.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS todos (
            id                       INTEGER PRIMARY KEY AUTOINCREMENT,
            title                    TEXT NOT NULL DEFAULT '',
            description              TEXT,
            completed                INTEGER NOT NULL DEFAULT 0,
            google_calendar_event_id TEXT
        );

        CREATE TABLE IF NOT EXISTS reminders (
            id                       INTEGER PRIMARY KEY AUTOINCREMENT,
            reminder_text            TEXT NOT NULL DEFAULT '',
            importance               TEXT NOT NULL DEFAULT '',
            google_calendar_event_id TEXT
        );

        CREATE TABLE IF NOT EXISTS calendar_events (
            id                       INTEGER PRIMARY KEY AUTOINCREMENT,
            title                    TEXT NOT NULL DEFAULT '',
            description              TEXT,
            event_from               TEXT NOT NULL,
            event_to                 TEXT NOT NULL,
            google_calendar_event_id TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_todos_title ON todos(title);
        CREATE INDEX IF NOT EXISTS idx_calendar_events_title ON calendar_events(title);
    "})?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);

        for table in ["todos", "reminders", "calendar_events"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = 'google_calendar_event_id'",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "{table} lacks google_calendar_event_id");
        }
    }

    #[test]
    fn test_migration_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute("INSERT INTO todos (title) VALUES ('keep me')", [])
            .unwrap();

        migrate(&conn).unwrap();

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }
}
