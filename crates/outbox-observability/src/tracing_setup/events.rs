//! Structured log events for key outbox operations.
//!
//! Each function emits a `tracing` event with an `event` field naming it.

use outbox_core::models::{SkipReason, SyncReport, WorkerState};

pub fn mutation_queued(id: i64, method: &str, url: &str, source: &str) {
    tracing::info!(
        event = "mutation_queued",
        id = id,
        method = %method,
        url = %url,
        source = %source,
        "mutation queued"
    );
}

pub fn mutation_synced(id: i64, status: u16) {
    tracing::debug!(event = "mutation_synced", id = id, status = status, "mutation synced");
}

/// The server rejected the write as stale; its state wins.
pub fn mutation_conflict(id: i64, url: &str, status: u16) {
    tracing::warn!(
        event = "mutation_conflict",
        id = id,
        url = %url,
        status = status,
        "mutation dropped on conflict"
    );
}

pub fn mutation_retry_scheduled(id: i64, attempt: u32, error: &str, delay_ms: u64) {
    tracing::info!(
        event = "mutation_retry_scheduled",
        id = id,
        attempt = attempt,
        error = %error,
        delay_ms = delay_ms,
        "mutation replay failed, retry scheduled"
    );
}

pub fn mutation_dead_lettered(id: i64, reason: &str) {
    tracing::warn!(
        event = "mutation_dead_lettered",
        id = id,
        reason = %reason,
        "mutation dead-lettered"
    );
}

pub fn sync_skipped(context: &str, reason: SkipReason) {
    tracing::debug!(
        event = "sync_skipped",
        context = %context,
        reason = ?reason,
        "sync skipped"
    );
}

pub fn sync_completed(context: &str, report: &SyncReport) {
    tracing::info!(
        event = "sync_completed",
        context = %context,
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed,
        dropped = report.dropped,
        deferred = report.deferred,
        blocked = report.blocked,
        remaining = report.remaining,
        "sync completed"
    );
}

pub fn connectivity_changed(context: &str, is_online: bool) {
    tracing::info!(
        event = "connectivity_changed",
        context = %context,
        is_online = is_online,
        "connectivity changed"
    );
}

pub fn worker_state_changed(generation: &str, state: WorkerState) {
    tracing::info!(
        event = "worker_state_changed",
        generation = %generation,
        state = %state,
        "worker state changed"
    );
}

pub fn install_failed(generation: &str, asset: &str, reason: &str) {
    tracing::error!(
        event = "install_failed",
        generation = %generation,
        asset = %asset,
        reason = %reason,
        "worker install failed"
    );
}

pub fn cache_purged(namespace: &str, entries: usize) {
    tracing::info!(
        event = "cache_purged",
        namespace = %namespace,
        entries = entries,
        "stale cache namespace purged"
    );
}

/// A read was served from cache because the network was unreachable.
pub fn served_from_cache(url: &str) {
    tracing::debug!(event = "served_from_cache", url = %url, "served from cache");
}

pub fn cache_write_failed(namespace: &str, key: &str, error: &str) {
    tracing::warn!(
        event = "cache_write_failed",
        namespace = %namespace,
        key = %key,
        error = %error,
        "cache write failed"
    );
}
