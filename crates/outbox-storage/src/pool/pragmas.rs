//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL so the page and the worker can read while the other writes,
//! NORMAL sync, busy timeout so concurrent contexts wait instead of failing.

use rusqlite::Connection;

use outbox_core::errors::OutboxResult;

use crate::to_storage_err;

/// Apply write-side pragmas.
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> OutboxResult<()> {
    conn.busy_timeout(std::time::Duration::from_millis(u64::from(busy_timeout_ms)))
        .map_err(to_storage_err)?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Apply read-only pragmas to a read connection.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout_ms: u32) -> OutboxResult<()> {
    conn.busy_timeout(std::time::Duration::from_millis(u64::from(busy_timeout_ms)))
        .map_err(to_storage_err)?;
    conn.execute_batch(
        "
        PRAGMA query_only = ON;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Verify that WAL mode is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> OutboxResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(to_storage_err)?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
