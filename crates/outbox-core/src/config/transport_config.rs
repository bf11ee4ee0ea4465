use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Accept gzip-encoded responses.
    pub gzip: bool,
    /// Extra attempts on a transport-level failure inside one call.
    /// Replays rely on the sync engine for retries, so this stays 0 by default.
    pub max_retries: u32,
    /// Initial backoff between transport retries (doubles each retry).
    pub initial_backoff_ms: u64,
    /// Maximum backoff between transport retries.
    pub max_backoff_ms: u64,
    /// Optional `User-Agent` header.
    pub user_agent: Option<String>,
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::DEFAULT_REQUEST_TIMEOUT_SECS,
            gzip: defaults::DEFAULT_GZIP,
            max_retries: defaults::DEFAULT_TRANSPORT_RETRIES,
            initial_backoff_ms: defaults::DEFAULT_TRANSPORT_BACKOFF_MS,
            max_backoff_ms: defaults::DEFAULT_TRANSPORT_MAX_BACKOFF_MS,
            user_agent: None,
        }
    }
}
