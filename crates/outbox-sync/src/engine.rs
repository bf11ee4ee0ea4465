//! SyncEngine: drains the durable queue in strict FIFO order.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use chrono::Utc;

use outbox_core::config::{OrderingMode, SyncConfig};
use outbox_core::errors::{OutboxError, OutboxResult, StorageError};
use outbox_core::models::{QueuedMutation, ReplayOutcome, SkipReason, SyncReport};
use outbox_core::traits::{IMutationQueue, ISyncStateStore, ITransport};
use outbox_observability::{events, sync_span};

use crate::connectivity::ConnectivityMonitor;
use crate::guard::SyncGuard;
use crate::observer::{ObserverRegistry, Subscription};
use crate::retry::{classify, FailureClass, RetryDecision, RetryPolicy};

/// Whether a drain honours per-record backoff windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Connectivity edges, background-sync tags, periodic ticks.
    #[default]
    Scheduled,
    /// Explicit user request: every queued record is attempted.
    Force,
}

/// Notifications emitted by a drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started,
    /// A replay hit 409 and the record was dropped.
    Conflict {
        id: i64,
        url: String,
        status: u16,
        server_body: Option<String>,
    },
    Completed(SyncReport),
}

/// Replays queued mutations against the network.
///
/// One engine per execution context. Engines draining the same store must
/// share a `SyncGuard`.
pub struct SyncEngine {
    context: String,
    queue: Arc<dyn IMutationQueue>,
    transport: Arc<dyn ITransport>,
    connectivity: Arc<ConnectivityMonitor>,
    guard: Arc<SyncGuard>,
    policy: RetryPolicy,
    ordering: OrderingMode,
    state: Option<Arc<dyn ISyncStateStore>>,
    observers: ObserverRegistry<SyncEvent>,
}

impl SyncEngine {
    pub fn new(
        context: impl Into<String>,
        queue: Arc<dyn IMutationQueue>,
        transport: Arc<dyn ITransport>,
        connectivity: Arc<ConnectivityMonitor>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            context: context.into(),
            queue,
            transport,
            connectivity,
            guard: SyncGuard::new(),
            policy: RetryPolicy::from_config(config),
            ordering: config.ordering,
            state: None,
            observers: ObserverRegistry::new(),
        }
    }

    /// Share a single-flight guard with other engines on the same store.
    pub fn with_guard(mut self, guard: Arc<SyncGuard>) -> Self {
        self.guard = guard;
        self
    }

    /// Persist the completion time of every drain.
    pub fn with_state_store(mut self, state: Arc<dyn ISyncStateStore>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn is_syncing(&self) -> bool {
        self.guard.is_running()
    }

    pub fn guard(&self) -> &Arc<SyncGuard> {
        &self.guard
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn queue(&self) -> &Arc<dyn IMutationQueue> {
        &self.queue
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    /// Drain honouring backoff windows.
    pub fn sync(&self) -> OutboxResult<SyncReport> {
        self.sync_with(SyncMode::Scheduled)
    }

    /// One drain over a snapshot of the queue.
    ///
    /// No-op (report with `skipped` set) while offline or while another
    /// drain holds the guard. Per-record network failures never abort the
    /// pass; store failures do.
    pub fn sync_with(&self, mode: SyncMode) -> OutboxResult<SyncReport> {
        if !self.connectivity.is_online() {
            events::sync_skipped(&self.context, SkipReason::Offline);
            return Ok(SyncReport::skipped(SkipReason::Offline));
        }
        let Some(_ticket) = self.guard.try_acquire() else {
            events::sync_skipped(&self.context, SkipReason::InFlight);
            return Ok(SyncReport::skipped(SkipReason::InFlight));
        };
        let _span = sync_span!(self.context, mode).entered();

        self.observers.notify(&SyncEvent::Started);
        let mut report = SyncReport {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        let snapshot = self.queue.list_all()?;
        let mut held: HashSet<String> = HashSet::new();

        for record in &snapshot {
            let resource = record.resource_key();
            let outcome = if self.ordering == OrderingMode::ResourceBarrier
                && held.contains(&resource)
            {
                ReplayOutcome::Blocked
            } else if mode == SyncMode::Scheduled && !record.is_due(Utc::now()) {
                ReplayOutcome::Deferred {
                    next_attempt_at: record.next_attempt_at.unwrap_or_else(Utc::now),
                }
            } else {
                self.replay(record)?
            };

            let still_queued = matches!(
                outcome,
                ReplayOutcome::Retrying { .. }
                    | ReplayOutcome::Rejected { .. }
                    | ReplayOutcome::Deferred { .. }
                    | ReplayOutcome::Blocked
            );
            if still_queued {
                held.insert(resource);
            }
            report.record(record.id, &record.method, &record.url, outcome);
        }

        report.remaining = self.queue.count()?;
        let finished = Utc::now();
        report.finished_at = Some(finished);

        if let Some(state) = &self.state {
            if let Err(e) = state.set_last_sync_at(finished) {
                tracing::warn!(error = %e, "failed to persist last sync time");
            }
        }

        events::sync_completed(&self.context, &report);
        self.observers.notify(&SyncEvent::Completed(report.clone()));
        Ok(report)
    }

    /// Replay one record and settle it in the store.
    fn replay(&self, record: &QueuedMutation) -> OutboxResult<ReplayOutcome> {
        let result = self.transport.send(&record.to_request());
        let status = result.as_ref().ok().map(|r| r.status);

        match classify(&result) {
            FailureClass::Success => {
                self.queue.delete_by_id(record.id)?;
                let status = status.unwrap_or_default();
                events::mutation_synced(record.id, status);
                Ok(ReplayOutcome::Synced { status })
            }
            FailureClass::Conflict => {
                let status = status.unwrap_or_default();
                let server_body = result.ok().map(|r| r.body_text().into_owned());
                if let Err(e) = self
                    .queue
                    .dead_letter(record.id, &format!("conflict: HTTP {status}"))
                {
                    return settle_missing(e, status);
                }
                events::mutation_conflict(record.id, &record.url, status);
                self.observers.notify(&SyncEvent::Conflict {
                    id: record.id,
                    url: record.url.clone(),
                    status,
                    server_body,
                });
                Ok(ReplayOutcome::Conflict { status })
            }
            class @ (FailureClass::Transient | FailureClass::Permanent) => {
                let error = match &result {
                    Ok(resp) => format!("HTTP {}", resp.status),
                    Err(e) => e.to_string(),
                };
                let attempt = record.retry_count.saturating_add(1);
                let delay = self.policy.backoff(record.id, attempt);
                let next_attempt_at = chrono::Duration::from_std(delay)
                    .ok()
                    .map(|d| Utc::now() + d);

                let failures = match self.queue.record_failure(record.id, &error, next_attempt_at) {
                    Ok(n) => n,
                    Err(e) => return settle_missing(e, status.unwrap_or_default()),
                };

                match self.policy.decide(class, record.id, failures) {
                    RetryDecision::DeadLetter { reason } => {
                        if let Err(e) = self.queue.dead_letter(record.id, &reason) {
                            return settle_missing(e, status.unwrap_or_default());
                        }
                        events::mutation_dead_lettered(record.id, &reason);
                        Ok(ReplayOutcome::DeadLettered { status, reason })
                    }
                    RetryDecision::Retry { delay } => {
                        events::mutation_retry_scheduled(
                            record.id,
                            failures,
                            &error,
                            delay.as_millis() as u64,
                        );
                        Ok(match (class, status) {
                            (FailureClass::Permanent, Some(status)) => ReplayOutcome::Rejected {
                                status,
                                attempt: failures,
                            },
                            _ => ReplayOutcome::Retrying {
                                status,
                                attempt: failures,
                                error,
                            },
                        })
                    }
                }
            }
        }
    }
}

/// A record removed mid-drain (queue cleared by another context) is
/// reported as dropped; any other store failure aborts the drain.
fn settle_missing(e: OutboxError, status: u16) -> OutboxResult<ReplayOutcome> {
    match e {
        OutboxError::Storage(StorageError::NotFound { .. }) => Ok(ReplayOutcome::DeadLettered {
            status: (status != 0).then_some(status),
            reason: "removed from queue during drain".to_string(),
        }),
        other => Err(other),
    }
}

/// Drain on every offline→online edge of the engine's connectivity view.
///
/// The drain runs on its own thread so the signal source never blocks on
/// the network.
pub fn sync_on_reconnect(engine: &Arc<SyncEngine>) -> Subscription {
    let weak: Weak<SyncEngine> = Arc::downgrade(engine);
    engine.connectivity.subscribe(move |change| {
        if !change.is_restored() {
            return;
        }
        let Some(engine) = weak.upgrade() else {
            return;
        };
        let spawned = std::thread::Builder::new()
            .name(format!("outbox-sync-{}", engine.context))
            .spawn(move || {
                if let Err(e) = engine.sync() {
                    tracing::warn!(context = %engine.context, error = %e, "reconnect sync failed");
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not spawn reconnect sync");
        }
    })
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("context", &self.context)
            .field("ordering", &self.ordering)
            .field("policy", &self.policy)
            .field("syncing", &self.is_syncing())
            .finish()
    }
}
