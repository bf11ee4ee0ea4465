//! Two-tier response cache.
//!
//! L1 (moka, in-process) → L2 (durable namespaces behind `IResponseCache`).
//! Write-through: every put lands in both tiers. L2 hits are promoted to L1.

pub mod l1_memory;

pub use l1_memory::L1MemoryCache;

use std::sync::Arc;
use std::time::Duration;

use outbox_core::config::WorkerConfig;
use outbox_core::errors::OutboxResult;
use outbox_core::models::{CacheEntry, CapturedResponse};
use outbox_core::traits::IResponseCache;
use outbox_observability::events;

/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHitTier {
    L1,
    L2,
    Miss,
}

pub struct ResponseCache {
    l1: L1MemoryCache,
    l2: Arc<dyn IResponseCache>,
}

impl ResponseCache {
    pub fn new(l2: Arc<dyn IResponseCache>, l1_capacity: u64, l1_ttl: Duration) -> Self {
        Self {
            l1: L1MemoryCache::new(l1_capacity, l1_ttl),
            l2,
        }
    }

    pub fn from_config(l2: Arc<dyn IResponseCache>, config: &WorkerConfig) -> Self {
        Self::new(l2, config.l1_capacity, Duration::from_secs(config.l1_ttl_secs))
    }

    pub fn get(&self, namespace: &str, key: &str) -> OutboxResult<(Option<CacheEntry>, CacheHitTier)> {
        if let Some(entry) = self.l1.get(namespace, key) {
            tracing::trace!(namespace, key, tier = "L1", "cache hit");
            return Ok((Some(entry), CacheHitTier::L1));
        }
        match self.l2.get_entry(namespace, key)? {
            Some(entry) => {
                tracing::trace!(namespace, key, tier = "L2", "cache hit");
                self.l1.insert(entry.clone());
                Ok((Some(entry), CacheHitTier::L2))
            }
            None => Ok((None, CacheHitTier::Miss)),
        }
    }

    /// Lookup that degrades to a miss when the durable tier fails.
    pub fn lookup(&self, namespace: &str, key: &str) -> Option<CacheEntry> {
        match self.get(namespace, key) {
            Ok((entry, _)) => entry,
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    pub fn put(&self, entry: CacheEntry) -> OutboxResult<()> {
        self.l2.put_entry(&entry)?;
        self.l1.insert(entry);
        Ok(())
    }

    /// Refresh `key` from a live response. Failures are logged, never fatal.
    pub fn refresh(&self, namespace: &str, key: &str, response: &CapturedResponse) {
        if let Err(e) = self.put(CacheEntry::from_response(namespace, key, response)) {
            events::cache_write_failed(namespace, key, &e.to_string());
        }
    }

    pub fn namespaces(&self) -> OutboxResult<Vec<String>> {
        self.l2.namespaces()
    }

    pub fn entry_count(&self, namespace: &str) -> OutboxResult<usize> {
        self.l2.entry_count(namespace)
    }

    pub fn delete_namespace(&self, namespace: &str) -> OutboxResult<usize> {
        let removed = self.l2.delete_namespace(namespace)?;
        self.l1.clear();
        Ok(removed)
    }

    /// Delete every namespace not in `keep`. Returns what was purged.
    pub fn purge_except(&self, keep: &[String]) -> OutboxResult<Vec<(String, usize)>> {
        let mut purged = Vec::new();
        for namespace in self.l2.namespaces()? {
            if keep.contains(&namespace) {
                continue;
            }
            let removed = self.l2.delete_namespace(&namespace)?;
            events::cache_purged(&namespace, removed);
            purged.push((namespace, removed));
        }
        if !purged.is_empty() {
            self.l1.clear();
        }
        Ok(purged)
    }
}
