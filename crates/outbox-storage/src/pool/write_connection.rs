//! Single write connection behind a mutex. Writes within one context are serialized;
//! SQLite's file lock serializes them across contexts.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use outbox_core::config::defaults::DEFAULT_BUSY_TIMEOUT_MS;
use outbox_core::errors::OutboxResult;

use super::pragmas::{apply_pragmas, verify_wal_mode};
use crate::{internal_err, to_storage_err};

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> OutboxResult<Self> {
        let conn = Connection::open(path).map_err(to_storage_err)?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        if !verify_wal_mode(&conn)? {
            tracing::warn!(path = %path.display(), "WAL mode not active, readers will block on writes");
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> OutboxResult<Self> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        apply_pragmas(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the write lock and execute a closure with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> OutboxResult<T>
    where
        F: FnOnce(&Connection) -> OutboxResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| internal_err(format!("write connection lock poisoned: {e}")))?;
        f(&guard)
    }
}
