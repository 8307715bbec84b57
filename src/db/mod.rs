//! Database layer: reminder persistence and the minimal task-row surface the
//! scheduler joins through.
//!
//! The SQLite database stands in for the remote relational store; everything
//! above this layer talks to the adapter methods, never to SQL.

pub mod reminders;
pub mod tasks;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id            TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    title         TEXT NOT NULL,
    due_date      TEXT,
    due_time      TEXT,
    reminder_type TEXT NOT NULL DEFAULT 'none',
    completed     INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS reminders (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id       TEXT NOT NULL UNIQUE REFERENCES tasks(id) ON DELETE CASCADE,
    reminder_type TEXT NOT NULL,
    reminder_time TEXT NOT NULL,
    is_sent       INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_reminders_time ON reminders(is_sent, reminder_time);
CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);
";

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent access
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Create tables and indexes. Idempotent.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap();
        f(&mut conn)
    }
}

/// Canonical timestamp encoding for the reminders table: RFC 3339 UTC with
/// whole seconds ("2025-06-01T08:30:00Z"). Fixed-width, so TEXT comparison
/// orders the same as the instants themselves.
pub fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp back to UTC. Lenient about offsets other than Z.
pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ts_round_trips_and_truncates_subseconds() {
        let now = Utc::now();
        let encoded = ts(now);
        let decoded = parse_ts(&encoded).unwrap();
        assert_eq!(decoded.timestamp(), now.timestamp());
        assert_eq!(encoded, ts(decoded));
    }

    #[test]
    fn ts_orders_lexically() {
        let a = parse_ts("2025-06-01T08:30:00Z").unwrap();
        let b = parse_ts("2025-06-01T09:00:00Z").unwrap();
        assert!(ts(a) < ts(b));
    }
}
