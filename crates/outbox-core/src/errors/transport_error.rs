//! Network boundary errors: the request produced no HTTP response.

use super::error_code::{self, OutboxErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network unreachable for {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl OutboxErrorCode for TransportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => error_code::NETWORK_UNREACHABLE,
            Self::Timeout { .. } => error_code::NETWORK_TIMEOUT,
            Self::InvalidRequest { .. } => error_code::INVALID_REQUEST,
        }
    }
}
