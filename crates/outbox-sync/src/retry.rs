//! Failure classification and retry scheduling for replayed mutations.

use std::time::Duration;

use outbox_core::config::SyncConfig;
use outbox_core::constants::CONFLICT_STATUS;
use outbox_core::errors::TransportError;
use outbox_core::models::CapturedResponse;

/// How a replay attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 2xx.
    Success,
    /// 409: the server holds newer state. Server wins, the record is dropped.
    Conflict,
    /// No response, 408, 425, 429, or 5xx.
    Transient,
    /// Any other status. The server understood and refused.
    Permanent,
}

pub fn classify(result: &Result<CapturedResponse, TransportError>) -> FailureClass {
    match result {
        Err(_) => FailureClass::Transient,
        Ok(resp) => classify_status(resp.status),
    }
}

pub fn classify_status(status: u16) -> FailureClass {
    match status {
        200..=299 => FailureClass::Success,
        CONFLICT_STATUS => FailureClass::Conflict,
        408 | 425 | 429 | 500..=599 => FailureClass::Transient,
        _ => FailureClass::Permanent,
    }
}

/// What to do with a record after a failed replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep it queued; next eligible attempt after `delay`.
    Retry { delay: Duration },
    /// Give up and move it to the dead-letter table.
    DeadLetter { reason: String },
}

/// Capped exponential backoff with deterministic jitter, plus attempt caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_rejections: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            max_rejections: config.max_rejections,
            initial_delay: Duration::from_millis(config.initial_retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
        }
    }

    /// Delay before attempt number `attempt + 1` of record `id`.
    ///
    /// `initial * 2^(attempt-1)`, shaved by up to 20% using a hash of
    /// `(id, attempt)` so records failing together do not retry together,
    /// then capped at `max_delay`.
    pub fn backoff(&self, id: i64, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let base = self
            .initial_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);

        let mut seed = [0u8; 12];
        seed[..8].copy_from_slice(&id.to_le_bytes());
        seed[8..].copy_from_slice(&attempt.to_le_bytes());
        let hash = blake3::hash(&seed);
        let mut first = [0u8; 8];
        first.copy_from_slice(&hash.as_bytes()[..8]);
        let fraction = u64::from_le_bytes(first) as f64 / u64::MAX as f64;

        base.mul_f64(1.0 - 0.2 * fraction)
    }

    /// Decide the fate of a record that has now failed `failures` times.
    pub fn decide(&self, class: FailureClass, id: i64, failures: u32) -> RetryDecision {
        match class {
            FailureClass::Permanent if failures >= self.max_rejections => {
                RetryDecision::DeadLetter {
                    reason: format!("rejected {failures} times"),
                }
            }
            _ if failures >= self.max_attempts => RetryDecision::DeadLetter {
                reason: format!("gave up after {failures} attempts"),
            },
            _ => RetryDecision::Retry {
                delay: self.backoff(id, failures),
            },
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}
