use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a drain did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another drain holds the single-flight guard.
    InFlight,
    /// The context's connectivity view is offline.
    Offline,
}

/// What happened to one record during a drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayOutcome {
    /// 2xx, record deleted.
    Synced { status: u16 },
    /// Server rejected the write as stale; server state wins and the record is dropped.
    Conflict { status: u16 },
    /// Failure that may heal; the record stays queued.
    Retrying {
        status: Option<u16>,
        attempt: u32,
        error: String,
    },
    /// Non-retryable rejection; the record stays queued until the rejection cap.
    Rejected { status: u16, attempt: u32 },
    /// Attempt or rejection cap reached; the record moved to the dead-letter table.
    DeadLettered {
        status: Option<u16>,
        reason: String,
    },
    /// Backoff window still open; not attempted.
    Deferred { next_attempt_at: DateTime<Utc> },
    /// An earlier record for the same resource did not go through in this drain.
    Blocked,
}

impl ReplayOutcome {
    /// Whether the record was replayed against the network in this drain.
    pub fn was_attempted(&self) -> bool {
        !matches!(self, Self::Deferred { .. } | Self::Blocked)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }

    /// Whether the record left the queue without being confirmed.
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::DeadLettered { .. })
    }
}

/// Per-record entry of a [`SyncReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub id: i64,
    pub method: String,
    pub url: String,
    pub outcome: ReplayOutcome,
}

/// Result of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Records replayed against the network.
    pub attempted: usize,
    pub succeeded: usize,
    /// Attempted records that were not confirmed (includes conflicts and dead letters).
    pub failed: usize,
    /// Failed records removed from the queue (conflicts and dead letters).
    pub dropped: usize,
    /// Records skipped because their backoff window is still open.
    pub deferred: usize,
    /// Records held behind an earlier failure on the same resource.
    pub blocked: usize,
    /// Records still queued after the drain.
    pub remaining: usize,
    /// Set when the drain did not run at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    pub outcomes: Vec<MutationOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Fold one record's outcome into the counters.
    pub fn record(&mut self, id: i64, method: &str, url: &str, outcome: ReplayOutcome) {
        if outcome.was_attempted() {
            self.attempted += 1;
            if outcome.is_success() {
                self.succeeded += 1;
            } else {
                self.failed += 1;
            }
            if outcome.is_dropped() {
                self.dropped += 1;
            }
        } else if matches!(outcome, ReplayOutcome::Blocked) {
            self.blocked += 1;
        } else {
            self.deferred += 1;
        }
        self.outcomes.push(MutationOutcome {
            id,
            method: method.to_string(),
            url: url.to_string(),
            outcome,
        });
    }

    /// No failures, nothing left behind.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_none() && self.failed == 0 && self.deferred == 0 && self.blocked == 0
    }
}
