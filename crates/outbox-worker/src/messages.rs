//! Page → worker control messages.

use std::sync::mpsc::Sender;

use outbox_core::models::{QueueStatusReport, SyncReport};

/// Request posted by a page to the worker. Replies travel on the embedded
/// channel; a dropped receiver just discards the reply.
#[derive(Debug)]
pub enum ClientMessage {
    /// Activate the waiting generation now.
    SkipWaiting,
    /// Drain immediately, ignoring backoff windows.
    ManualSync {
        reply: Sender<Result<SyncReport, String>>,
    },
    GetQueueStatus {
        reply: Sender<Result<QueueStatusReport, String>>,
    },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SkipWaiting => "SKIP_WAITING",
            Self::ManualSync { .. } => "MANUAL_SYNC",
            Self::GetQueueStatus { .. } => "GET_QUEUE_STATUS",
        }
    }
}
