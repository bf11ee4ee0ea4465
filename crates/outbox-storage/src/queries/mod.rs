pub mod cache_ops;
pub mod mutation_ops;
pub mod sync_state_ops;

use chrono::{DateTime, Utc};
use outbox_core::errors::{OutboxResult, StorageError};

/// Parse an RFC 3339 column, reporting the owning row on failure.
pub(crate) fn parse_time(id: i64, column: &str, raw: &str) -> OutboxResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::CorruptRecord {
                id,
                reason: format!("{column}: {e}"),
            }
            .into()
        })
}
