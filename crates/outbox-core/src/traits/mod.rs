mod mutation_queue;
mod response_cache;
mod sync_state;
mod transport;

pub use mutation_queue::IMutationQueue;
pub use response_cache::IResponseCache;
pub use sync_state::ISyncStateStore;
pub use transport::ITransport;
