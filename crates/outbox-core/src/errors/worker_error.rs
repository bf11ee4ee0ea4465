//! Cache-intercepting worker errors.

use super::error_code::{self, OutboxErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Pre-warming a static asset failed; installation is all-or-nothing.
    #[error("install of generation {generation} failed on {asset}: {reason}")]
    InstallFailed {
        generation: String,
        asset: String,
        reason: String,
    },

    #[error("invalid worker state: expected {expected}, found {found}")]
    InvalidState { expected: String, found: String },

    #[error("no active worker controls this client")]
    NoActiveWorker,

    #[error("worker runtime has stopped")]
    RuntimeStopped,

    #[error("worker did not answer {operation} within {timeout_ms}ms")]
    SyncTimeout { operation: String, timeout_ms: u64 },

    #[error("worker reported failure: {reason}")]
    Remote { reason: String },
}

impl OutboxErrorCode for WorkerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InstallFailed { .. } => error_code::WORKER_INSTALL_FAILED,
            Self::InvalidState { .. } => error_code::WORKER_STATE,
            Self::NoActiveWorker | Self::RuntimeStopped | Self::Remote { .. } => {
                error_code::WORKER_UNAVAILABLE
            }
            Self::SyncTimeout { .. } => error_code::SYNC_TIMEOUT,
        }
    }
}
