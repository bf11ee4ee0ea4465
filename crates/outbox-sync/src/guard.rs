//! Single-flight guard for queue drains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// At most one drain holds the guard at a time. Share one `Arc<SyncGuard>`
/// between every engine that drains the same store.
#[derive(Debug, Default)]
pub struct SyncGuard {
    running: AtomicBool,
}

impl SyncGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Take the guard, or `None` if a drain is already in flight.
    pub fn try_acquire(self: &Arc<Self>) -> Option<SyncTicket> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SyncTicket {
                guard: Arc::clone(self),
            })
    }
}

/// Held for the duration of one drain. Released on drop, so early returns,
/// errors, and panics all reset the guard.
#[derive(Debug)]
pub struct SyncTicket {
    guard: Arc<SyncGuard>,
}

impl Drop for SyncTicket {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::SeqCst);
    }
}
