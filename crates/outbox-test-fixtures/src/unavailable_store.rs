use chrono::{DateTime, Utc};

use outbox_core::errors::{OutboxResult, StorageError};
use outbox_core::models::{DeadLetter, MutationSpec, QueuedMutation};
use outbox_core::traits::IMutationQueue;

/// A queue whose backing store cannot be opened (storage disabled, quota
/// exhausted). Every operation fails with `StorageError::Unavailable`.
#[derive(Debug, Default)]
pub struct UnavailableStore;

fn unavailable<T>() -> OutboxResult<T> {
    Err(StorageError::Unavailable {
        reason: "storage disabled".to_string(),
    }
    .into())
}

impl IMutationQueue for UnavailableStore {
    fn append(&self, _spec: &MutationSpec) -> OutboxResult<i64> {
        unavailable()
    }

    fn list_all(&self) -> OutboxResult<Vec<QueuedMutation>> {
        unavailable()
    }

    fn delete_by_id(&self, _id: i64) -> OutboxResult<()> {
        unavailable()
    }

    fn clear(&self) -> OutboxResult<usize> {
        unavailable()
    }

    fn get(&self, _id: i64) -> OutboxResult<Option<QueuedMutation>> {
        unavailable()
    }

    fn count(&self) -> OutboxResult<usize> {
        unavailable()
    }

    fn record_failure(
        &self,
        _id: i64,
        _error: &str,
        _next_attempt_at: Option<DateTime<Utc>>,
    ) -> OutboxResult<u32> {
        unavailable()
    }

    fn dead_letter(&self, _id: i64, _reason: &str) -> OutboxResult<()> {
        unavailable()
    }

    fn list_dead_letters(&self) -> OutboxResult<Vec<DeadLetter>> {
        unavailable()
    }
}
