//! # outbox-storage
//!
//! SQLite-backed durable store shared by every execution context.
//! One database file holds the mutation queue, the dead-letter table,
//! the response cache namespaces, and sync bookkeeping.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use outbox_core::errors::{OutboxError, StorageError};
use rusqlite::ErrorCode;

/// Map a SQLite error to the storage error taxonomy.
///
/// Conditions that mean "the store cannot be used at all" become
/// `StorageError::Unavailable` so callers never mistake them for success.
pub(crate) fn to_storage_err(e: rusqlite::Error) -> OutboxError {
    let unavailable = match &e {
        rusqlite::Error::SqliteFailure(err, _) => matches!(
            err.code,
            ErrorCode::CannotOpen
                | ErrorCode::ReadOnly
                | ErrorCode::DiskFull
                | ErrorCode::PermissionDenied
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure
        ),
        _ => false,
    };
    if unavailable {
        StorageError::Unavailable {
            reason: e.to_string(),
        }
        .into()
    } else {
        StorageError::SqliteError {
            message: e.to_string(),
        }
        .into()
    }
}

/// Lock poisoning or similar failures outside SQLite itself.
pub(crate) fn internal_err(message: impl Into<String>) -> OutboxError {
    StorageError::SqliteError {
        message: message.into(),
    }
    .into()
}
