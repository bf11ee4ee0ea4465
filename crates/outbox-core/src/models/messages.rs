use serde::{Deserialize, Serialize};

use super::mutation::MutationSummary;
use super::worker_state::WorkerState;

/// Broadcast from the worker to every open client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// A drain finished. `count` is the number of records confirmed.
    SyncComplete {
        count: usize,
        succeeded: usize,
        failed: usize,
        total: usize,
    },
    /// The worker deferred a write and persisted it.
    MutationQueued {
        id: i64,
        url: String,
        method: String,
    },
    /// The server rejected a replayed write as stale; the record was dropped.
    ConflictResolved {
        id: i64,
        url: String,
        status: u16,
        server_body: Option<String>,
    },
    /// The worker generation controlling the client changed state.
    StateChanged { generation: String, state: WorkerState },
}

/// Answer to a queue-status query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatusReport {
    pub queue_size: usize,
    pub mutations: Vec<MutationSummary>,
}
