/// Outbox system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Background-sync tag registered whenever a mutation is deferred.
pub const SYNC_TAG: &str = "sync-mutations";

/// Tag fired by the periodic background sync.
pub const PERIODIC_SYNC_TAG: &str = "sync-mutations-periodic";

/// Status returned with a deferred (queued) mutation response.
pub const DEFERRED_STATUS: u16 = 202;

/// Status returned when the network is unreachable and nothing is cached.
pub const UNAVAILABLE_STATUS: u16 = 503;

/// HTTP status the server uses to reject a stale write.
pub const CONFLICT_STATUS: u16 = 409;

/// Header stamped on responses synthesized or served by the worker.
pub const SOURCE_HEADER: &str = "x-outbox-source";
