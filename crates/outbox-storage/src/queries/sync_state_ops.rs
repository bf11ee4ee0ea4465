//! Key/value rows of the sync_state table.

use rusqlite::{params, Connection, OptionalExtension};

use outbox_core::errors::OutboxResult;

use crate::to_storage_err;

pub const LAST_SYNC_AT: &str = "last_sync_at";

pub fn get_value(conn: &Connection, key: &str) -> OutboxResult<Option<String>> {
    conn.query_row(
        "SELECT value FROM sync_state WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(to_storage_err)
}

pub fn set_value(conn: &Connection, key: &str, value: &str) -> OutboxResult<()> {
    conn.execute(
        "INSERT INTO sync_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        params![key, value],
    )
    .map_err(to_storage_err)?;
    Ok(())
}
