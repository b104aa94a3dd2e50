//! SQLite connection handling.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::schema;

/// Database connection wrapper.
///
/// Thread-safe via internal Mutex. All database operations acquire the lock.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and migrates it.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::DirectoryError {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
        let db = Self::from_connection(conn)?;
        info!(path = %path.display(), "Opened database");
        Ok(db)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let added = schema::migrate(&conn)?;
        if added > 0 {
            info!(columns = added, "Migrated database schema");
        } else {
            debug!("Database schema up to date");
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquires the connection.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Check database connectivity
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }
}

/// Current unix time in seconds.
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_file_and_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db/pickntrust.sqlite");

        let db = Database::open(&path).unwrap();
        db.ping().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pickntrust.sqlite");

        drop(Database::open(&path).unwrap());
        Database::open(&path).unwrap().ping().unwrap();
    }
}
