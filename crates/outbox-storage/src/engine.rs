//! StorageEngine: owns the ConnectionPool, runs migrations on open, and
//! implements the queue, cache, and sync-state traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use outbox_core::config::StorageConfig;
use outbox_core::errors::OutboxResult;
use outbox_core::models::{CacheEntry, DeadLetter, MutationSpec, QueuedMutation};
use outbox_core::traits::{IMutationQueue, IResponseCache, ISyncStateStore};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{cache_ops, mutation_ops, sync_state_ops};

/// Durable store shared by the page and the worker.
///
/// Several engines may open the same file; SQLite serializes their writes.
pub struct StorageEngine {
    pool: ConnectionPool,
    /// File-backed engines read through the read pool. In-memory engines
    /// route reads through the writer because pooled in-memory connections
    /// are separate databases.
    use_read_pool: bool,
}

impl StorageEngine {
    /// Open a file-backed store with default pool settings.
    pub fn open(path: &Path) -> OutboxResult<Self> {
        Self::open_with_config(path, &StorageConfig::default())
    }

    pub fn open_with_config(path: &Path, config: &StorageConfig) -> OutboxResult<Self> {
        let pool = ConnectionPool::open(path, config.read_pool_size, config.busy_timeout_ms)?;
        let engine = Self {
            pool,
            use_read_pool: true,
        };
        engine.initialize()?;
        tracing::debug!(path = %path.display(), "opened outbox store");
        Ok(engine)
    }

    /// Open the store at `config.db_path`.
    pub fn from_config(config: &StorageConfig) -> OutboxResult<Self> {
        Self::open_with_config(Path::new(&config.db_path), config)
    }

    /// In-memory store (for tests and ephemeral contexts).
    pub fn open_in_memory() -> OutboxResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self {
            pool,
            use_read_pool: false,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> OutboxResult<()> {
        self.pool.writer.with_conn(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn schema_version(&self) -> OutboxResult<u32> {
        self.with_reader(migrations::current_version)
    }

    fn with_reader<F, T>(&self, f: F) -> OutboxResult<T>
    where
        F: FnOnce(&Connection) -> OutboxResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn(f)
        }
    }
}

impl IMutationQueue for StorageEngine {
    fn append(&self, spec: &MutationSpec) -> OutboxResult<i64> {
        let id = self
            .pool
            .writer
            .with_conn(|conn| mutation_ops::insert_mutation(conn, spec))?;
        tracing::debug!(id, method = %spec.method, url = %spec.url, "mutation persisted");
        Ok(id)
    }

    fn list_all(&self) -> OutboxResult<Vec<QueuedMutation>> {
        self.with_reader(mutation_ops::list_mutations)
    }

    fn delete_by_id(&self, id: i64) -> OutboxResult<()> {
        self.pool
            .writer
            .with_conn(|conn| mutation_ops::delete_mutation(conn, id))
    }

    fn clear(&self) -> OutboxResult<usize> {
        self.pool.writer.with_conn(mutation_ops::clear_mutations)
    }

    fn get(&self, id: i64) -> OutboxResult<Option<QueuedMutation>> {
        self.with_reader(|conn| mutation_ops::get_mutation(conn, id))
    }

    fn count(&self) -> OutboxResult<usize> {
        self.with_reader(mutation_ops::count_mutations)
    }

    fn record_failure(
        &self,
        id: i64,
        error: &str,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> OutboxResult<u32> {
        self.pool
            .writer
            .with_conn(|conn| mutation_ops::record_failure(conn, id, error, next_attempt_at))
    }

    fn dead_letter(&self, id: i64, reason: &str) -> OutboxResult<()> {
        self.pool
            .writer
            .with_conn(|conn| mutation_ops::move_to_dead_letter(conn, id, reason))?;
        tracing::warn!(id, reason, "mutation dead-lettered");
        Ok(())
    }

    fn list_dead_letters(&self) -> OutboxResult<Vec<DeadLetter>> {
        self.with_reader(mutation_ops::list_dead_letters)
    }
}

impl IResponseCache for StorageEngine {
    fn get_entry(&self, namespace: &str, key: &str) -> OutboxResult<Option<CacheEntry>> {
        self.with_reader(|conn| cache_ops::get_entry(conn, namespace, key))
    }

    fn put_entry(&self, entry: &CacheEntry) -> OutboxResult<()> {
        self.pool
            .writer
            .with_conn(|conn| cache_ops::upsert_entry(conn, entry))
    }

    fn namespaces(&self) -> OutboxResult<Vec<String>> {
        self.with_reader(cache_ops::list_namespaces)
    }

    fn delete_namespace(&self, namespace: &str) -> OutboxResult<usize> {
        self.pool
            .writer
            .with_conn(|conn| cache_ops::delete_namespace(conn, namespace))
    }

    fn entry_count(&self, namespace: &str) -> OutboxResult<usize> {
        self.with_reader(|conn| cache_ops::count_entries(conn, namespace))
    }
}

impl ISyncStateStore for StorageEngine {
    fn last_sync_at(&self) -> OutboxResult<Option<DateTime<Utc>>> {
        let raw = self.with_reader(|conn| {
            sync_state_ops::get_value(conn, sync_state_ops::LAST_SYNC_AT)
        })?;
        raw.map(|value| crate::queries::parse_time(0, sync_state_ops::LAST_SYNC_AT, &value))
            .transpose()
    }

    fn set_last_sync_at(&self, at: DateTime<Utc>) -> OutboxResult<()> {
        self.pool.writer.with_conn(|conn| {
            sync_state_ops::set_value(conn, sync_state_ops::LAST_SYNC_AT, &at.to_rfc3339())
        })
    }
}
