//! SQLite connection for the course tabs store.

use std::path::Path;

use rusqlite::Connection;

use super::migrations;
use crate::types::settings::TabsSettings;

/// Path value that selects a throwaway in-memory store.
pub const IN_MEMORY: &str = ":memory:";

/// Owns the store's connection. The schema is migrated on open, so a
/// `Database` value always has its tables in place.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the store file at `path`.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the file cannot be opened or a migration fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        Self::migrated(Connection::open(path)?)
    }

    /// Opens a store that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::migrated(Connection::open_in_memory()?)
    }

    /// Opens the store configured in `settings.database_path`.
    pub fn from_settings(settings: &TabsSettings) -> Result<Self, rusqlite::Error> {
        if settings.database_path == IN_MEMORY {
            Self::open_in_memory()
        } else {
            Self::open(&settings.database_path)
        }
    }

    fn migrated(conn: Connection) -> Result<Self, rusqlite::Error> {
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
