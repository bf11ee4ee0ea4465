use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// How a failed record affects later records in the same drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    /// Strict FIFO pass; every record is an independent unit of work.
    #[default]
    Independent,
    /// Strict FIFO pass; once a record for a resource fails or is deferred,
    /// later records for the same resource wait for the next drain.
    ResourceBarrier,
}

/// Synchronization engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Failed replays (of any kind) before a record is dead-lettered.
    pub max_attempts: u32,
    /// Permanent rejections (non-retryable 4xx) before a record is dead-lettered.
    pub max_rejections: u32,
    /// Backoff after the first failed replay, doubled per attempt.
    pub initial_retry_delay_ms: u64,
    /// Upper bound on the backoff.
    pub max_retry_delay_ms: u64,
    pub ordering: OrderingMode,
    /// How long a client waits for the worker to answer a manual sync.
    pub manual_sync_timeout_secs: u64,
    /// Interval of the periodic background sync; 0 disables it.
    pub periodic_sync_interval_secs: u64,
}

impl SyncConfig {
    pub fn manual_sync_timeout(&self) -> Duration {
        Duration::from_secs(self.manual_sync_timeout_secs)
    }

    pub fn periodic_sync_interval(&self) -> Option<Duration> {
        (self.periodic_sync_interval_secs > 0)
            .then(|| Duration::from_secs(self.periodic_sync_interval_secs))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::DEFAULT_MAX_RETRY_ATTEMPTS,
            max_rejections: defaults::DEFAULT_MAX_REJECTIONS,
            initial_retry_delay_ms: defaults::DEFAULT_INITIAL_RETRY_DELAY_MS,
            max_retry_delay_ms: defaults::DEFAULT_MAX_RETRY_DELAY_MS,
            ordering: OrderingMode::default(),
            manual_sync_timeout_secs: defaults::DEFAULT_MANUAL_SYNC_TIMEOUT_SECS,
            periodic_sync_interval_secs: defaults::DEFAULT_PERIODIC_SYNC_INTERVAL_SECS,
        }
    }
}
