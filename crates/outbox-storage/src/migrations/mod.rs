//! Schema migrations using PRAGMA user_version.

pub mod v001_mutation_queue;
pub mod v002_response_cache;
pub mod v003_sync_state;

use rusqlite::Connection;

use outbox_core::errors::{OutboxResult, StorageError};

use crate::to_storage_err;

/// Latest schema version.
pub const LATEST_VERSION: u32 = 3;

/// Run all pending migrations, each in its own transaction.
pub fn run_migrations(conn: &Connection) -> OutboxResult<u32> {
    let current = current_version(conn)?;

    let migrations: &[(&str, u32)] = &[
        (v001_mutation_queue::MIGRATION_SQL, 1),
        (v002_response_cache::MIGRATION_SQL, 2),
        (v003_sync_state::MIGRATION_SQL, 3),
    ];

    let mut applied = 0;
    for (sql, version) in migrations {
        if current >= *version {
            continue;
        }
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| migration_err(*version, e))?;
        tx.execute_batch(sql).map_err(|e| migration_err(*version, e))?;
        tx.pragma_update(None, "user_version", version)
            .map_err(|e| migration_err(*version, e))?;
        tx.commit().map_err(|e| migration_err(*version, e))?;
        tracing::info!(version = version, "applied migration");
        applied += 1;
    }

    Ok(applied)
}

/// Get the current schema version.
pub fn current_version(conn: &Connection) -> OutboxResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(to_storage_err)
}

fn migration_err(version: u32, e: rusqlite::Error) -> outbox_core::OutboxError {
    // A file we cannot write is an unavailable store, not a schema bug.
    match to_storage_err(e) {
        err if err.is_store_unavailable() => err,
        err => StorageError::MigrationFailed {
            version,
            reason: err.to_string(),
        }
        .into(),
    }
}
