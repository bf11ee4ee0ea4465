//! # outbox-core
//!
//! Foundation crate for the offline mutation outbox.
//! Defines the queue record, request/response shapes, worker messages,
//! the storage/transport/cache traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::OutboxConfig;
pub use errors::{OutboxError, OutboxResult};
pub use models::{
    CapturedResponse, MutationSpec, OutboundRequest, QueuedMutation, ResponseSource, SyncReport,
};
