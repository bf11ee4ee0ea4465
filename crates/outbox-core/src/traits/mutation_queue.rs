use chrono::{DateTime, Utc};

use crate::errors::OutboxResult;
use crate::models::{DeadLetter, MutationSpec, QueuedMutation};

/// Durable FIFO of write intents, shared by every execution context.
///
/// Every operation is atomic with respect to every other. A failure to open
/// the store surfaces as `StorageError::Unavailable`, never as an empty queue.
pub trait IMutationQueue: Send + Sync {
    // --- Core ---
    /// Persist a new record and return its id. Ids are strictly increasing
    /// and never reused, even after the record is deleted.
    fn append(&self, spec: &MutationSpec) -> OutboxResult<i64>;
    /// Every pending record in ascending id order.
    fn list_all(&self) -> OutboxResult<Vec<QueuedMutation>>;
    /// Remove one record. Deleting an absent id is a no-op.
    fn delete_by_id(&self, id: i64) -> OutboxResult<()>;
    /// Remove every pending record; returns how many were removed.
    fn clear(&self) -> OutboxResult<usize>;

    // --- Lookup ---
    fn get(&self, id: i64) -> OutboxResult<Option<QueuedMutation>>;
    fn count(&self) -> OutboxResult<usize>;

    // --- Retry bookkeeping ---
    /// Increment the record's retry counter, store the error and the next
    /// eligible attempt time. Returns the new retry count.
    fn record_failure(
        &self,
        id: i64,
        error: &str,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> OutboxResult<u32>;
    /// Move a record out of the queue into the dead-letter table.
    fn dead_letter(&self, id: i64, reason: &str) -> OutboxResult<()>;
    fn list_dead_letters(&self) -> OutboxResult<Vec<DeadLetter>>;
}
