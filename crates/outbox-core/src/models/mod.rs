//! Data model shared by the queue, the worker, the sync engine, and clients.

pub mod cache_entry;
pub mod connectivity;
pub mod messages;
pub mod mutation;
pub mod request;
pub mod response;
pub mod sync_report;
pub mod sync_status;
pub mod worker_state;

pub use cache_entry::CacheEntry;
pub use connectivity::ConnectivityChange;
pub use messages::{QueueStatusReport, WorkerMessage};
pub use mutation::{DeadLetter, MutationSpec, MutationSummary, QueuedMutation};
pub use request::{OutboundRequest, RequestMode};
pub use response::{CapturedResponse, ResponseSource};
pub use sync_report::{MutationOutcome, ReplayOutcome, SkipReason, SyncReport};
pub use sync_status::{OfflineSnapshot, SyncStatus};
pub use worker_state::WorkerState;
