//! Append, list, delete, retry bookkeeping, and dead-lettering for queued mutations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use outbox_core::errors::{OutboxResult, StorageError};
use outbox_core::models::{DeadLetter, MutationSpec, QueuedMutation};

use super::parse_time;
use crate::to_storage_err;

const SELECT_COLUMNS: &str =
    "id, url, method, headers, body, timestamp, retry_count, next_attempt_at, last_error";

/// Raw row, decoded outside the rusqlite closure so JSON and time errors
/// surface as `CorruptRecord`.
struct MutationRow {
    id: i64,
    url: String,
    method: String,
    headers: String,
    body: String,
    timestamp: String,
    retry_count: u32,
    next_attempt_at: Option<String>,
    last_error: Option<String>,
}

impl MutationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            method: row.get(2)?,
            headers: row.get(3)?,
            body: row.get(4)?,
            timestamp: row.get(5)?,
            retry_count: row.get(6)?,
            next_attempt_at: row.get(7)?,
            last_error: row.get(8)?,
        })
    }

    fn decode(self) -> OutboxResult<QueuedMutation> {
        let headers: BTreeMap<String, String> =
            serde_json::from_str(&self.headers).map_err(|e| StorageError::CorruptRecord {
                id: self.id,
                reason: format!("headers: {e}"),
            })?;
        let next_attempt_at = match self.next_attempt_at.as_deref() {
            Some(raw) => Some(parse_time(self.id, "next_attempt_at", raw)?),
            None => None,
        };
        Ok(QueuedMutation {
            id: self.id,
            timestamp: parse_time(self.id, "timestamp", &self.timestamp)?,
            url: self.url,
            method: self.method,
            headers,
            body: self.body,
            retry_count: self.retry_count,
            next_attempt_at,
            last_error: self.last_error,
        })
    }
}

/// Insert a new record and return its assigned id.
pub fn insert_mutation(conn: &Connection, spec: &MutationSpec) -> OutboxResult<i64> {
    let headers = serde_json::to_string(&spec.headers)?;
    conn.execute(
        "INSERT INTO mutations (url, method, headers, body, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            spec.url,
            spec.method,
            headers,
            spec.body,
            spec.timestamp.to_rfc3339(),
        ],
    )
    .map_err(to_storage_err)?;
    Ok(conn.last_insert_rowid())
}

/// Every pending record in ascending id order.
pub fn list_mutations(conn: &Connection) -> OutboxResult<Vec<QueuedMutation>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM mutations ORDER BY id ASC"))
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map([], MutationRow::from_row)
        .map_err(to_storage_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_storage_err)?;
    rows.into_iter().map(MutationRow::decode).collect()
}

pub fn get_mutation(conn: &Connection, id: i64) -> OutboxResult<Option<QueuedMutation>> {
    let row = conn
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM mutations WHERE id = ?1"),
            params![id],
            MutationRow::from_row,
        )
        .optional()
        .map_err(to_storage_err)?;
    row.map(MutationRow::decode).transpose()
}

/// Delete one record. Absent ids are ignored.
pub fn delete_mutation(conn: &Connection, id: i64) -> OutboxResult<()> {
    conn.execute("DELETE FROM mutations WHERE id = ?1", params![id])
        .map_err(to_storage_err)?;
    Ok(())
}

pub fn clear_mutations(conn: &Connection) -> OutboxResult<usize> {
    conn.execute("DELETE FROM mutations", [])
        .map_err(to_storage_err)
}

pub fn count_mutations(conn: &Connection) -> OutboxResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM mutations", [], |row| row.get(0))
        .map_err(to_storage_err)?;
    Ok(count as usize)
}

/// Bump the retry counter and store the failure. Returns the new count.
pub fn record_failure(
    conn: &Connection,
    id: i64,
    error: &str,
    next_attempt_at: Option<DateTime<Utc>>,
) -> OutboxResult<u32> {
    conn.query_row(
        "UPDATE mutations
         SET retry_count = retry_count + 1, last_error = ?2, next_attempt_at = ?3
         WHERE id = ?1
         RETURNING retry_count",
        params![id, error, next_attempt_at.map(|t| t.to_rfc3339())],
        |row| row.get::<_, u32>(0),
    )
    .optional()
    .map_err(to_storage_err)?
    .ok_or_else(|| StorageError::NotFound { id }.into())
}

/// Move a record to the dead-letter table. Atomic: the record is either
/// still queued or dead-lettered, never both and never neither.
pub fn move_to_dead_letter(conn: &Connection, id: i64, reason: &str) -> OutboxResult<()> {
    let tx = conn.unchecked_transaction().map_err(to_storage_err)?;
    let moved = tx
        .execute(
            "INSERT INTO dead_letters
                (id, url, method, headers, body, timestamp, retry_count, last_error,
                 reason, dead_lettered_at)
             SELECT id, url, method, headers, body, timestamp, retry_count, last_error, ?2, ?3
             FROM mutations WHERE id = ?1",
            params![id, reason, Utc::now().to_rfc3339()],
        )
        .map_err(to_storage_err)?;
    if moved == 0 {
        return Err(StorageError::NotFound { id }.into());
    }
    tx.execute("DELETE FROM mutations WHERE id = ?1", params![id])
        .map_err(to_storage_err)?;
    tx.commit().map_err(to_storage_err)?;
    Ok(())
}

pub fn list_dead_letters(conn: &Connection) -> OutboxResult<Vec<DeadLetter>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, url, method, headers, body, timestamp, retry_count, NULL, last_error,
                    reason, dead_lettered_at
             FROM dead_letters ORDER BY id ASC",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                MutationRow::from_row(row)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
            ))
        })
        .map_err(to_storage_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_storage_err)?;

    rows.into_iter()
        .map(|(row, reason, at)| {
            let id = row.id;
            Ok(DeadLetter {
                mutation: row.decode()?,
                reason,
                dead_lettered_at: parse_time(id, "dead_lettered_at", &at)?,
            })
        })
        .collect()
}
