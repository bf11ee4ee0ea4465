use chrono::{DateTime, Utc};

use crate::errors::OutboxResult;

/// Small key/value record of drain bookkeeping that outlives a context.
pub trait ISyncStateStore: Send + Sync {
    fn last_sync_at(&self) -> OutboxResult<Option<DateTime<Utc>>>;
    fn set_last_sync_at(&self, at: DateTime<Utc>) -> OutboxResult<()>;
}
