//! # outbox-sync
//!
//! Drains the durable queue against the live network.
//!
//! - `ObserverRegistry` / `Subscription`: ordered listeners with explicit unsubscribe
//! - `ConnectivityMonitor`: one context's edge-triggered online/offline view
//! - `RetryPolicy`: failure classification, capped exponential backoff, dead-lettering
//! - `SyncGuard`: single-flight flag shared by every engine draining one store
//! - `SyncEngine`: the FIFO drain itself

pub mod connectivity;
pub mod engine;
pub mod guard;
pub mod observer;
pub mod retry;

pub use connectivity::ConnectivityMonitor;
pub use engine::{sync_on_reconnect, SyncEngine, SyncEvent, SyncMode};
pub use guard::{SyncGuard, SyncTicket};
pub use observer::{ObserverRegistry, Subscription};
pub use retry::{classify, FailureClass, RetryDecision, RetryPolicy};
