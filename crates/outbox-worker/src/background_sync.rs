//! Background-sync tag registry.
//!
//! A tag asks the worker to drain the queue the next time it believes the
//! network is reachable. Tags persist until a drain actually runs, so a tag
//! registered by a page that has since closed still fires.

use std::collections::BTreeSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct BackgroundSync {
    tags: Mutex<BTreeSet<String>>,
}

impl BackgroundSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the tag was not already pending.
    pub fn register(&self, tag: &str) -> bool {
        let inserted = self
            .tags
            .lock()
            .map(|mut tags| tags.insert(tag.to_string()))
            .unwrap_or(false);
        if inserted {
            tracing::debug!(tag, "background sync registered");
        }
        inserted
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.tags.lock().map(|t| t.contains(tag)).unwrap_or(false)
    }

    pub fn pending(&self) -> Vec<String> {
        self.tags
            .lock()
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn complete(&self, tag: &str) {
        if let Ok(mut tags) = self.tags.lock() {
            tags.remove(tag);
        }
    }

    /// Remove and return every pending tag.
    pub fn take_pending(&self) -> Vec<String> {
        self.tags
            .lock()
            .map(|mut t| std::mem::take(&mut *t).into_iter().collect())
            .unwrap_or_default()
    }
}
