use outbox_core::models::{SyncStatus, WorkerMessage};

/// Notifications delivered to facade subscribers, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A write was persisted. `queued_count` already includes it.
    MutationQueued { id: i64, queued_count: usize },
    QueueCleared { removed: usize },
    ConnectivityChanged { is_online: bool },
    SyncStarted,
    SyncFinished { status: SyncStatus, remaining: usize },
    /// A replay from this page was rejected as stale and dropped.
    Conflict { id: i64, url: String, status: u16 },
    /// Anything the worker broadcast.
    Worker(WorkerMessage),
}
