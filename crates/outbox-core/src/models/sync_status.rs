use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Drain progress as shown to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Records confirmed by the most recent drain.
    pub success_count: usize,
    /// Records not confirmed by the most recent drain.
    pub failure_count: usize,
}

/// Everything a UI needs to render connectivity and queue depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSnapshot {
    pub is_online: bool,
    pub queued_count: usize,
    pub is_syncing: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
}
