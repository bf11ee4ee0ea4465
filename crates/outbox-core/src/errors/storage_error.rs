//! Storage-layer errors for the durable queue and cache.

use super::error_code::{self, OutboxErrorCode};

/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store cannot be opened or written (disabled, read-only, quota, corrupt file).
    /// Never treated as a successful enqueue.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("queued mutation {id} not found")]
    NotFound { id: i64 },

    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },
}

impl OutboxErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => error_code::STORE_UNAVAILABLE,
            Self::SqliteError { .. } | Self::CorruptRecord { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::NotFound { .. } => error_code::RECORD_NOT_FOUND,
        }
    }
}
