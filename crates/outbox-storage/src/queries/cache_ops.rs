//! Namespaced response cache rows.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};

use outbox_core::errors::{OutboxResult, StorageError};
use outbox_core::models::CacheEntry;

use super::parse_time;
use crate::to_storage_err;

pub fn get_entry(conn: &Connection, namespace: &str, key: &str) -> OutboxResult<Option<CacheEntry>> {
    let row = conn
        .query_row(
            "SELECT status, headers, body, stored_at FROM cache_entries
             WHERE namespace = ?1 AND cache_key = ?2",
            params![namespace, key],
            |row| {
                Ok((
                    row.get::<_, u16>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()
        .map_err(to_storage_err)?;

    let Some((status, headers, body, stored_at)) = row else {
        return Ok(None);
    };
    let headers: BTreeMap<String, String> =
        serde_json::from_str(&headers).map_err(|e| StorageError::CorruptRecord {
            id: 0,
            reason: format!("cache entry {namespace}/{key} headers: {e}"),
        })?;
    Ok(Some(CacheEntry {
        namespace: namespace.to_string(),
        key: key.to_string(),
        status,
        headers,
        body,
        stored_at: parse_time(0, "stored_at", &stored_at)?,
    }))
}

/// Insert or replace.
pub fn upsert_entry(conn: &Connection, entry: &CacheEntry) -> OutboxResult<()> {
    let headers = serde_json::to_string(&entry.headers)?;
    conn.execute(
        "INSERT INTO cache_entries (namespace, cache_key, status, headers, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(namespace, cache_key) DO UPDATE SET
            status = excluded.status,
            headers = excluded.headers,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            entry.namespace,
            entry.key,
            entry.status,
            headers,
            entry.body,
            entry.stored_at.to_rfc3339(),
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn list_namespaces(conn: &Connection) -> OutboxResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT namespace FROM cache_entries ORDER BY namespace")
        .map_err(to_storage_err)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_storage_err)?;
    Ok(names)
}

pub fn delete_namespace(conn: &Connection, namespace: &str) -> OutboxResult<usize> {
    conn.execute(
        "DELETE FROM cache_entries WHERE namespace = ?1",
        params![namespace],
    )
    .map_err(to_storage_err)
}

pub fn count_entries(conn: &Connection, namespace: &str) -> OutboxResult<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE namespace = ?1",
            params![namespace],
            |row| row.get(0),
        )
        .map_err(to_storage_err)?;
    Ok(count as usize)
}
