//! L1 in-memory response cache using moka.
//!
//! TinyLFU admission, bounded capacity, per-entry TTL. Never authoritative:
//! every entry also lives in the durable tier.

use std::time::Duration;

use moka::sync::Cache;

use outbox_core::models::CacheEntry;

pub struct L1MemoryCache {
    cache: Cache<String, CacheEntry>,
}

impl L1MemoryCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    fn slot(namespace: &str, key: &str) -> String {
        format!("{namespace}\u{1f}{key}")
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<CacheEntry> {
        self.cache.get(&Self::slot(namespace, key))
    }

    pub fn insert(&self, entry: CacheEntry) {
        self.cache
            .insert(Self::slot(&entry.namespace, &entry.key), entry);
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invalidate everything. Used on namespace purges.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
