//! Error handling for the outbox.
//! One error enum per subsystem, `thiserror` only, aggregated by `OutboxError`.

pub mod config_error;
pub mod error_code;
pub mod storage_error;
pub mod transport_error;
pub mod worker_error;

pub use config_error::ConfigError;
pub use error_code::OutboxErrorCode;
pub use storage_error::StorageError;
pub use transport_error::TransportError;
pub use worker_error::WorkerError;

/// Result alias used across the workspace.
pub type OutboxResult<T> = Result<T, OutboxError>;

/// Umbrella error. Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

impl OutboxError {
    /// Whether the durable store could not be opened or written.
    ///
    /// Callers of `queue_mutation` must surface this to the user: the write
    /// was not persisted.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Unavailable { .. }))
    }

    /// Whether the failure came from the network boundary (no response).
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for OutboxError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            reason: e.to_string(),
        }
    }
}

impl OutboxErrorCode for OutboxError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Transport(e) => e.error_code(),
            Self::Worker(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Serialization { .. } => error_code::SERIALIZATION_ERROR,
        }
    }
}
