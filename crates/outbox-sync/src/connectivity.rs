//! Connectivity monitor: one execution context's view of the network.
//!
//! Each context owns its own monitor. Views are allowed to disagree for a
//! while; they converge as each context receives platform signals.

use std::sync::atomic::{AtomicBool, Ordering};

use outbox_core::models::ConnectivityChange;
use outbox_observability::events;

use crate::observer::{ObserverRegistry, Subscription};

pub struct ConnectivityMonitor {
    context: String,
    online: AtomicBool,
    observers: ObserverRegistry<ConnectivityChange>,
}

impl ConnectivityMonitor {
    pub fn new(context: impl Into<String>, initially_online: bool) -> Self {
        Self {
            context: context.into(),
            online: AtomicBool::new(initially_online),
            observers: ObserverRegistry::new(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Feed a platform connectivity signal. Listeners fire only when the
    /// state actually changes; returns whether it did.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }
        events::connectivity_changed(&self.context, online);
        self.observers.notify(&ConnectivityChange::now(online));
        true
    }

    pub fn go_online(&self) -> bool {
        self.set_online(true)
    }

    pub fn go_offline(&self) -> bool {
        self.set_online(false)
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConnectivityChange) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }
}

impl std::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("context", &self.context)
            .field("online", &self.is_online())
            .finish()
    }
}
