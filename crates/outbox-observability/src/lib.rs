//! # outbox-observability
//!
//! Subscriber setup, span macros, and the structured events emitted by the
//! queue, sync engine, and worker.

pub mod tracing_setup;

pub use tracing_setup::{events, init_from_config, init_tracing};
