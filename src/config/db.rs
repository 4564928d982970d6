//! `SQLite` backed settings store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument, trace};

use super::store::{KeyValueStore, entry_size};
use crate::error::{PssError, Result};

/// Capacity granted to a store opened without an explicit quota.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// SQLite schema for settings storage.
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
";

/// Persistent key/value store.
///
/// Values are kept as text exactly as the caller serialized them. A byte
/// quota emulates the capacity limit of the host storage so that callers
/// exercise the same overflow paths in production and tests.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    quota: Option<usize>,
}

impl SqliteStore {
    /// Opens or creates a database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PssError::Storage(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        debug!(path = %path.display(), "Opening settings database");
        let conn = Connection::open(path)
            .map_err(|e| PssError::Storage(format!("Failed to open database: {e}")))?;

        let store = Self::from_connection(conn)?;
        info!(path = %path.display(), "Settings database ready");
        Ok(store)
    }

    /// Creates an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            PssError::Storage(format!("Failed to create in-memory database: {e}"))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| PssError::Storage(format!("Failed to initialize schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
            quota: Some(DEFAULT_QUOTA_BYTES),
        })
    }

    /// Replace the byte quota (`None` removes the limit).
    #[must_use]
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    /// Bytes used by every entry except `key`.
    fn usage_excluding(conn: &Connection, key: &str) -> Result<usize> {
        let used: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM settings WHERE key != ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(used).unwrap_or(0))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PssError::Storage("settings database lock poisoned".to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;

        if let Some(quota) = self.quota {
            let needed = entry_size(key, value);
            let available = quota.saturating_sub(Self::usage_excluding(&conn, key)?);
            if needed > available {
                return Err(PssError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        trace!(key, len = value.len(), "settings write");
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM settings ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
