//! # outbox-client
//!
//! The in-page facade over the outbox. Holds no private queue state: every
//! count and listing is read from the durable store. Replay is delegated to
//! the worker when one is attached, otherwise to a page-local sync engine.

pub mod client;
pub mod events;
mod worker_link;

pub use client::{ClientBuilder, OfflineClient, PAGE_CONTEXT};
pub use events::ClientEvent;
