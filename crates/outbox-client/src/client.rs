//! OfflineClient: queue writes, expose state, trigger replay.

use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};

use outbox_core::config::SyncConfig;
use outbox_core::constants::SYNC_TAG;
use outbox_core::errors::{OutboxError, OutboxResult, WorkerError};
use outbox_core::models::{
    CapturedResponse, DeadLetter, MutationSpec, OfflineSnapshot, OutboundRequest, QueuedMutation,
    SkipReason, SyncReport, SyncStatus, WorkerMessage,
};
use outbox_core::traits::{IMutationQueue, ISyncStateStore, ITransport};
use outbox_observability::events;
use outbox_sync::{
    ConnectivityMonitor, ObserverRegistry, Subscription, SyncEngine, SyncEvent, SyncGuard,
    SyncMode,
};
use outbox_worker::{ClientId, WorkerHandle};

use crate::events::ClientEvent;
use crate::worker_link::WorkerLink;

/// Context name used in logs and by the page's sync engine.
pub const PAGE_CONTEXT: &str = "page";

pub(crate) struct ClientInner {
    queue: Arc<dyn IMutationQueue>,
    transport: Arc<dyn ITransport>,
    engine: Arc<SyncEngine>,
    connectivity: Arc<ConnectivityMonitor>,
    worker: Option<WorkerHandle>,
    state_store: Option<Arc<dyn ISyncStateStore>>,
    status: Mutex<SyncStatus>,
    observers: ObserverRegistry<ClientEvent>,
    sync_config: SyncConfig,
}

impl ClientInner {
    fn status(&self) -> SyncStatus {
        self.status.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn update_status(&self, update: impl FnOnce(&mut SyncStatus)) -> SyncStatus {
        match self.status.lock() {
            Ok(mut status) => {
                update(&mut status);
                status.clone()
            }
            Err(_) => SyncStatus::default(),
        }
    }

    fn run_sync(&self, mode: SyncMode) -> OutboxResult<SyncReport> {
        if !self.connectivity.is_online() {
            events::sync_skipped(PAGE_CONTEXT, SkipReason::Offline);
            return Ok(SyncReport::skipped(SkipReason::Offline));
        }

        self.update_status(|s| {
            s.is_syncing = true;
            s.success_count = 0;
            s.failure_count = 0;
        });
        self.observers.notify(&ClientEvent::SyncStarted);

        let result = match &self.worker {
            Some(worker) => match worker.manual_sync(self.sync_config.manual_sync_timeout()) {
                Err(OutboxError::Worker(WorkerError::RuntimeStopped)) => {
                    tracing::warn!("worker stopped, draining in page context");
                    self.engine.sync_with(mode)
                }
                other => other,
            },
            None => self.engine.sync_with(mode),
        };

        match &result {
            Ok(report) if !report.was_skipped() => {
                let status = self.update_status(|s| {
                    s.is_syncing = false;
                    s.success_count = report.succeeded;
                    s.failure_count = report.failed;
                    s.last_sync_at = Some(report.finished_at.unwrap_or_else(Utc::now));
                });
                self.observers.notify(&ClientEvent::SyncFinished {
                    status,
                    remaining: report.remaining,
                });
            }
            _ => {
                self.update_status(|s| s.is_syncing = false);
            }
        }
        result
    }

    /// Mirror a worker broadcast into page state, then forward it.
    pub(crate) fn apply_worker_message(&self, message: &WorkerMessage) {
        if let WorkerMessage::SyncComplete {
            succeeded, failed, ..
        } = message
        {
            self.update_status(|s| {
                s.is_syncing = false;
                s.success_count = *succeeded;
                s.failure_count = *failed;
                s.last_sync_at = Some(Utc::now());
            });
        }
        self.observers.notify(&ClientEvent::Worker(message.clone()));
    }

    fn on_restored(self: Arc<Self>) {
        if let Some(worker) = &self.worker {
            if worker.fire_sync(SYNC_TAG).is_ok() {
                return;
            }
        }
        let spawned = std::thread::Builder::new()
            .name("outbox-sync-page".to_string())
            .spawn(move || {
                if let Err(e) = self.run_sync(SyncMode::Scheduled) {
                    tracing::warn!(error = %e, "reconnect sync failed");
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not spawn reconnect sync");
        }
    }
}

/// Builder for [`OfflineClient`].
pub struct ClientBuilder {
    queue: Arc<dyn IMutationQueue>,
    transport: Arc<dyn ITransport>,
    sync_config: SyncConfig,
    state_store: Option<Arc<dyn ISyncStateStore>>,
    worker: Option<WorkerHandle>,
    guard: Option<Arc<SyncGuard>>,
    online: bool,
}

impl ClientBuilder {
    pub fn sync_config(mut self, config: SyncConfig) -> Self {
        self.sync_config = config;
        self
    }

    pub fn state_store(mut self, store: Arc<dyn ISyncStateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    /// Delegate replay to a running worker and receive its broadcasts.
    pub fn worker(mut self, handle: WorkerHandle) -> Self {
        self.worker = Some(handle);
        self
    }

    /// Share the single-flight guard with the worker draining the same store.
    pub fn guard(mut self, guard: Arc<SyncGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// The page's initial view of connectivity.
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn build(self) -> OfflineClient {
        let connectivity = Arc::new(ConnectivityMonitor::new(PAGE_CONTEXT, self.online));
        let mut engine = SyncEngine::new(
            PAGE_CONTEXT,
            Arc::clone(&self.queue),
            Arc::clone(&self.transport),
            Arc::clone(&connectivity),
            &self.sync_config,
        );
        // Default to the worker's guard so its drains show up as syncing here.
        let guard = self.guard.or_else(|| {
            self.worker
                .as_ref()
                .map(|w| Arc::clone(&w.registration().services().guard))
        });
        if let Some(guard) = guard {
            engine = engine.with_guard(guard);
        }
        if let Some(store) = &self.state_store {
            engine = engine.with_state_store(Arc::clone(store));
        }

        let last_sync_at = self.state_store.as_ref().and_then(|s| match s.last_sync_at() {
            Ok(at) => at,
            Err(e) => {
                tracing::warn!(error = %e, "could not read last sync time");
                None
            }
        });

        let inner = Arc::new(ClientInner {
            queue: self.queue,
            transport: self.transport,
            engine: Arc::new(engine),
            connectivity,
            worker: self.worker.clone(),
            state_store: self.state_store,
            status: Mutex::new(SyncStatus {
                last_sync_at,
                ..Default::default()
            }),
            observers: ObserverRegistry::new(),
            sync_config: self.sync_config,
        });

        let weak: Weak<ClientInner> = Arc::downgrade(&inner);
        let reconnect = inner.connectivity.subscribe(move |change| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.observers.notify(&ClientEvent::ConnectivityChanged {
                is_online: change.is_online,
            });
            if change.is_restored() {
                inner.on_restored();
            }
        });

        let weak: Weak<ClientInner> = Arc::downgrade(&inner);
        let conflicts = inner.engine.subscribe(move |event| {
            if let (Some(inner), SyncEvent::Conflict { id, url, status, .. }) =
                (weak.upgrade(), event)
            {
                inner.observers.notify(&ClientEvent::Conflict {
                    id: *id,
                    url: url.clone(),
                    status: *status,
                });
            }
        });

        let link = self
            .worker
            .map(|handle| WorkerLink::attach(handle, Arc::downgrade(&inner)));

        OfflineClient {
            inner,
            link,
            subscriptions: vec![reconnect, conflicts],
        }
    }
}

/// The page-side API of the outbox.
///
/// Constructed with its store and network injected; many clients may share
/// one store, each reads queue depth from it directly.
pub struct OfflineClient {
    inner: Arc<ClientInner>,
    link: Option<WorkerLink>,
    subscriptions: Vec<Subscription>,
}

impl OfflineClient {
    pub fn builder(queue: Arc<dyn IMutationQueue>, transport: Arc<dyn ITransport>) -> ClientBuilder {
        ClientBuilder {
            queue,
            transport,
            sync_config: SyncConfig::default(),
            state_store: None,
            worker: None,
            guard: None,
            online: true,
        }
    }

    /// Persist a write for replay.
    ///
    /// Returns only after the record is durable, so `queued_count` already
    /// reflects it. A store failure is returned, never swallowed.
    pub fn queue_mutation(&self, spec: MutationSpec) -> OutboxResult<i64> {
        let id = self.inner.queue.append(&spec)?;
        events::mutation_queued(id, &spec.method, &spec.url, PAGE_CONTEXT);

        let queued_count = self.inner.queue.count()?;
        self.inner
            .observers
            .notify(&ClientEvent::MutationQueued { id, queued_count });

        if let Some(worker) = &self.inner.worker {
            if let Err(e) = worker.register_sync(SYNC_TAG) {
                tracing::warn!(error = %e, "could not register background sync");
            }
        }
        Ok(id)
    }

    /// Issue a request, deferring writes that cannot reach the network.
    ///
    /// With a worker attached the worker decides; otherwise a write that
    /// fails at the network boundary is queued here and answered with the
    /// deferred response.
    pub fn send(&self, request: OutboundRequest) -> OutboxResult<CapturedResponse> {
        if let Some(worker) = &self.inner.worker {
            return worker.fetch(request);
        }
        if request.is_read() || self.is_online() {
            match self.inner.transport.send(&request) {
                Ok(response) => return Ok(response),
                Err(e) if request.is_read() => return Err(e.into()),
                Err(e) => tracing::debug!(url = %request.url, error = %e, "write failed, queueing"),
            }
        }
        let id = self.queue_mutation(MutationSpec::from_request(&request))?;
        Ok(CapturedResponse::deferred(id))
    }

    pub fn queued_count(&self) -> OutboxResult<usize> {
        self.inner.queue.count()
    }

    pub fn queued_mutations(&self) -> OutboxResult<Vec<QueuedMutation>> {
        self.inner.queue.list_all()
    }

    pub fn dead_letters(&self) -> OutboxResult<Vec<DeadLetter>> {
        self.inner.queue.list_dead_letters()
    }

    pub fn clear_queue(&self) -> OutboxResult<usize> {
        let removed = self.inner.queue.clear()?;
        tracing::info!(removed, "queue cleared");
        self.inner
            .observers
            .notify(&ClientEvent::QueueCleared { removed });
        Ok(removed)
    }

    /// Replay everything queued now, ignoring backoff windows.
    pub fn sync_now(&self) -> OutboxResult<SyncReport> {
        self.inner.run_sync(SyncMode::Force)
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.inner.observers.subscribe(listener)
    }

    /// `is_syncing` also covers drains run by the worker on a shared guard.
    pub fn status(&self) -> SyncStatus {
        let mut status = self.inner.status();
        status.is_syncing |= self.inner.engine.is_syncing();
        status
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.inner.status().last_sync_at.or_else(|| {
            self.inner
                .state_store
                .as_ref()
                .and_then(|s| s.last_sync_at().ok().flatten())
        })
    }

    pub fn snapshot(&self) -> OutboxResult<OfflineSnapshot> {
        let status = self.inner.status();
        Ok(OfflineSnapshot {
            is_online: self.is_online(),
            queued_count: self.queued_count()?,
            is_syncing: status.is_syncing || self.inner.engine.is_syncing(),
            last_sync_at: self.last_sync_at(),
        })
    }

    pub fn is_online(&self) -> bool {
        self.inner.connectivity.is_online()
    }

    /// Feed the page's platform connectivity signal. An offline→online
    /// edge triggers a drain without blocking the caller.
    pub fn set_online(&self, online: bool) -> bool {
        self.inner.connectivity.set_online(online)
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.inner.connectivity
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.inner.engine
    }

    pub fn worker_client_id(&self) -> Option<ClientId> {
        self.link.as_ref().map(WorkerLink::client_id)
    }
}

impl Drop for OfflineClient {
    fn drop(&mut self) {
        for sub in self.subscriptions.drain(..) {
            sub.unsubscribe();
        }
        if let Some(link) = &self.link {
            link.detach();
        }
    }
}

impl std::fmt::Debug for OfflineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineClient")
            .field("online", &self.is_online())
            .field("worker", &self.link.is_some())
            .field("status", &self.status())
            .finish()
    }
}
