use crate::errors::OutboxResult;
use crate::models::CacheEntry;

/// Namespaced store of last known-good responses.
pub trait IResponseCache: Send + Sync {
    fn get_entry(&self, namespace: &str, key: &str) -> OutboxResult<Option<CacheEntry>>;
    /// Insert or replace the entry for `(namespace, key)`.
    fn put_entry(&self, entry: &CacheEntry) -> OutboxResult<()>;
    /// Every namespace holding at least one entry, sorted.
    fn namespaces(&self) -> OutboxResult<Vec<String>>;
    /// Drop a namespace and all its entries. Returns the number of entries removed.
    fn delete_namespace(&self, namespace: &str) -> OutboxResult<usize>;
    fn entry_count(&self, namespace: &str) -> OutboxResult<usize>;
}
