//! Span definitions per operation: sync drain, worker fetch, install, activation.

/// Span around one drain of the queue.
#[macro_export]
macro_rules! sync_span {
    ($context:expr, $mode:expr) => {
        tracing::info_span!("outbox.sync", context = %$context, mode = ?$mode)
    };
}

/// Span around one intercepted request.
#[macro_export]
macro_rules! fetch_span {
    ($method:expr, $url:expr) => {
        tracing::debug_span!("outbox.fetch", method = %$method, url = %$url)
    };
}

/// Span around install or activation of one worker generation.
#[macro_export]
macro_rules! lifecycle_span {
    ($phase:expr, $generation:expr) => {
        tracing::info_span!("outbox.lifecycle", phase = %$phase, generation = %$generation)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const SYNC: &str = "outbox.sync";
    pub const FETCH: &str = "outbox.fetch";
    pub const LIFECYCLE: &str = "outbox.lifecycle";
}
