//! Stable string codes for every error variant, for logs and UI mapping.

pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const RECORD_NOT_FOUND: &str = "RECORD_NOT_FOUND";
pub const NETWORK_UNREACHABLE: &str = "NETWORK_UNREACHABLE";
pub const NETWORK_TIMEOUT: &str = "NETWORK_TIMEOUT";
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
pub const WORKER_INSTALL_FAILED: &str = "WORKER_INSTALL_FAILED";
pub const WORKER_STATE: &str = "WORKER_STATE";
pub const WORKER_UNAVAILABLE: &str = "WORKER_UNAVAILABLE";
pub const SYNC_TIMEOUT: &str = "SYNC_TIMEOUT";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";

/// Implemented by every error enum in the workspace.
pub trait OutboxErrorCode {
    fn error_code(&self) -> &'static str;
}
