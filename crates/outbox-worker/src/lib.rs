//! # outbox-worker
//!
//! The long-lived background context. Intercepts every outbound request,
//! serves safe reads from cache when the network is gone, defers unsafe
//! writes into the durable queue, and drains that queue when the platform
//! signals connectivity.
//!
//! - `router`: classifies a request (mutation, cacheable API read, API pass-through, static asset)
//! - `cache`: moka L1 in front of the durable namespaced cache
//! - `worker`: one generation, its install/activate lifecycle and fetch strategies
//! - `registration`: active/waiting generations and client control
//! - `runtime`: the event loop thread that outlives any client

pub mod background_sync;
pub mod cache;
pub mod clients;
mod fetch;
pub mod messages;
pub mod registration;
pub mod router;
pub mod runtime;
pub mod worker;

pub use background_sync::BackgroundSync;
pub use cache::{CacheHitTier, ResponseCache};
pub use clients::{ClientId, ClientRegistry};
pub use messages::ClientMessage;
pub use registration::WorkerRegistration;
pub use router::{RequestRoute, Router};
pub use runtime::{RuntimeEvent, WorkerHandle, WorkerRuntime};
pub use worker::{Worker, WorkerServices};
