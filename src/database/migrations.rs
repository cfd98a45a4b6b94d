//! Schema migrations for the course tabs SQLite store.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// Safe to call on every startup.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Courses, course tabs and course authors")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: courses, their ordered tabs, and who may author them.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS courses (
            course_key TEXT PRIMARY KEY,
            updated_at INTEGER NOT NULL,
            updated_by TEXT
        );

        CREATE TABLE IF NOT EXISTS course_tabs (
            course_key TEXT NOT NULL,
            position INTEGER NOT NULL,
            tab_id TEXT NOT NULL,
            tab_type TEXT NOT NULL,
            locator TEXT,
            name TEXT NOT NULL DEFAULT '',
            is_movable INTEGER NOT NULL DEFAULT 0,
            is_hideable INTEGER NOT NULL DEFAULT 0,
            is_hidden INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (course_key, tab_id),
            FOREIGN KEY (course_key) REFERENCES courses(course_key) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_course_tabs_position ON course_tabs(course_key, position);

        CREATE TABLE IF NOT EXISTS course_authors (
            course_key TEXT NOT NULL,
            user_id TEXT NOT NULL,
            PRIMARY KEY (course_key, user_id),
            FOREIGN KEY (course_key) REFERENCES courses(course_key) ON DELETE CASCADE
        );
        ",
    )?;
    Ok(())
}
