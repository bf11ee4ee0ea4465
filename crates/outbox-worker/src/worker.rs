//! One worker generation and its lifecycle.
//!
//! `Installing → Waiting → Active → Terminated`. Installation pre-warms every
//! static asset or fails as a whole; activation purges every cache namespace
//! that is not a current generation.

use std::sync::{Arc, Mutex};

use outbox_core::config::{SyncConfig, WorkerConfig};
use outbox_core::errors::{OutboxResult, WorkerError};
use outbox_core::models::{
    CacheEntry, CapturedResponse, OutboundRequest, QueueStatusReport, SyncReport, WorkerMessage,
    WorkerState,
};
use outbox_core::traits::{IMutationQueue, IResponseCache, ISyncStateStore, ITransport};
use outbox_observability::{events, lifecycle_span};
use outbox_sync::{ConnectivityMonitor, SyncEngine, SyncEvent, SyncGuard, SyncMode, Subscription};

use crate::background_sync::BackgroundSync;
use crate::cache::ResponseCache;
use crate::clients::ClientRegistry;
use crate::router::Router;

/// Context name used in logs and by the worker's sync engine.
pub const WORKER_CONTEXT: &str = "worker";

/// Everything a worker generation shares with its predecessor and successor.
///
/// The queue, cache, clients, background-sync tags, connectivity view and
/// single-flight guard belong to the origin, not to one generation.
#[derive(Clone)]
pub struct WorkerServices {
    pub queue: Arc<dyn IMutationQueue>,
    pub cache: Arc<ResponseCache>,
    pub transport: Arc<dyn ITransport>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub guard: Arc<SyncGuard>,
    pub sync_config: SyncConfig,
    pub sync_state: Option<Arc<dyn ISyncStateStore>>,
    pub clients: Arc<ClientRegistry>,
    pub background_sync: Arc<BackgroundSync>,
}

impl WorkerServices {
    pub fn new(
        queue: Arc<dyn IMutationQueue>,
        cache: Arc<dyn IResponseCache>,
        transport: Arc<dyn ITransport>,
        worker_config: &WorkerConfig,
        sync_config: SyncConfig,
    ) -> Self {
        Self {
            queue,
            cache: Arc::new(ResponseCache::from_config(cache, worker_config)),
            transport,
            connectivity: Arc::new(ConnectivityMonitor::new(WORKER_CONTEXT, true)),
            guard: SyncGuard::new(),
            sync_config,
            sync_state: None,
            clients: Arc::new(ClientRegistry::new()),
            background_sync: Arc::new(BackgroundSync::new()),
        }
    }

    /// Share the single-flight guard with page-side engines on the same store.
    pub fn with_guard(mut self, guard: Arc<SyncGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Arc<ConnectivityMonitor>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_sync_state(mut self, state: Arc<dyn ISyncStateStore>) -> Self {
        self.sync_state = Some(state);
        self
    }
}

pub struct Worker {
    pub(crate) config: WorkerConfig,
    pub(crate) router: Router,
    pub(crate) services: WorkerServices,
    state: Mutex<WorkerState>,
    engine: Arc<SyncEngine>,
    conflict_listener: Mutex<Option<Subscription>>,
}

impl Worker {
    /// Create a generation in the `Installing` state.
    pub fn new(config: WorkerConfig, services: WorkerServices) -> OutboxResult<Self> {
        let router = Router::from_config(&config)?;

        let mut engine = SyncEngine::new(
            WORKER_CONTEXT,
            Arc::clone(&services.queue),
            Arc::clone(&services.transport),
            Arc::clone(&services.connectivity),
            &services.sync_config,
        )
        .with_guard(Arc::clone(&services.guard));
        if let Some(state) = &services.sync_state {
            engine = engine.with_state_store(Arc::clone(state));
        }
        let engine = Arc::new(engine);

        let clients = Arc::clone(&services.clients);
        let conflicts = engine.subscribe(move |event| {
            if let SyncEvent::Conflict {
                id,
                url,
                status,
                server_body,
            } = event
            {
                clients.broadcast(&WorkerMessage::ConflictResolved {
                    id: *id,
                    url: url.clone(),
                    status: *status,
                    server_body: server_body.clone(),
                });
            }
        });

        Ok(Self {
            config,
            router,
            services,
            state: Mutex::new(WorkerState::Installing),
            engine,
            conflict_listener: Mutex::new(Some(conflicts)),
        })
    }

    pub fn generation(&self) -> &str {
        &self.config.static_generation
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn services(&self) -> &WorkerServices {
        &self.services
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn state(&self) -> WorkerState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(WorkerState::Terminated)
    }

    pub fn is_active(&self) -> bool {
        self.state() == WorkerState::Active
    }

    fn expect_state(&self, expected: WorkerState) -> Result<(), WorkerError> {
        let found = self.state();
        if found == expected {
            Ok(())
        } else {
            Err(WorkerError::InvalidState {
                expected: expected.to_string(),
                found: found.to_string(),
            })
        }
    }

    fn transition(&self, from: &[WorkerState], to: WorkerState) -> Result<(), WorkerError> {
        let mut state = self.state.lock().map_err(|_| WorkerError::InvalidState {
            expected: format!("{from:?}"),
            found: "poisoned".to_string(),
        })?;
        if !from.contains(&*state) {
            return Err(WorkerError::InvalidState {
                expected: from
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join("|"),
                found: state.to_string(),
            });
        }
        *state = to;
        drop(state);

        events::worker_state_changed(self.generation(), to);
        self.services.clients.broadcast(&WorkerMessage::StateChanged {
            generation: self.generation().to_string(),
            state: to,
        });
        Ok(())
    }

    /// Pre-warm every static asset into the current static namespace.
    ///
    /// All assets are fetched before any is written. One failure terminates
    /// the generation and discards a namespace this install created.
    pub fn install(&self) -> OutboxResult<()> {
        let _span = lifecycle_span!("install", self.generation()).entered();
        self.expect_state(WorkerState::Installing)?;
        let namespace = self.config.static_cache_name();
        let existed = self.services.cache.namespaces()?.contains(&namespace);

        match self.prewarm(&namespace) {
            Ok(()) => {
                self.transition(&[WorkerState::Installing], WorkerState::Waiting)?;
                Ok(())
            }
            Err((asset, reason)) => {
                events::install_failed(self.generation(), &asset, &reason);
                if !existed {
                    if let Err(e) = self.services.cache.delete_namespace(&namespace) {
                        tracing::warn!(namespace = %namespace, error = %e, "could not discard partial install");
                    }
                }
                self.transition(&[WorkerState::Installing], WorkerState::Terminated)?;
                Err(WorkerError::InstallFailed {
                    generation: self.generation().to_string(),
                    asset,
                    reason,
                }
                .into())
            }
        }
    }

    fn prewarm(&self, namespace: &str) -> Result<(), (String, String)> {
        let origin = self.config.origin.trim_end_matches('/');
        let mut fetched: Vec<(String, String, CapturedResponse)> = Vec::new();
        for asset in &self.config.static_assets {
            let request = OutboundRequest::get(format!("{origin}{asset}"));
            match self.services.transport.send(&request) {
                Ok(response) if response.is_success() => {
                    fetched.push((asset.clone(), request.cache_key(), response));
                }
                Ok(response) => return Err((asset.clone(), format!("HTTP {}", response.status))),
                Err(e) => return Err((asset.clone(), e.to_string())),
            }
        }
        for (asset, key, response) in fetched {
            self.services
                .cache
                .put(CacheEntry::from_response(namespace, &key, &response))
                .map_err(|e| (asset, e.to_string()))?;
        }
        Ok(())
    }

    /// Take control: purge stale cache generations, then become `Active`.
    pub fn activate(&self) -> OutboxResult<()> {
        let _span = lifecycle_span!("activate", self.generation()).entered();
        self.expect_state(WorkerState::Waiting)?;
        let purged = self
            .services
            .cache
            .purge_except(&self.config.current_cache_names())?;
        tracing::debug!(purged = purged.len(), "stale generations purged");
        self.transition(&[WorkerState::Waiting], WorkerState::Active)?;
        Ok(())
    }

    /// Retire this generation. Terminal; repeated calls are no-ops.
    pub fn terminate(&self) {
        if self.state() == WorkerState::Terminated {
            return;
        }
        let from = [
            WorkerState::Installing,
            WorkerState::Waiting,
            WorkerState::Active,
        ];
        if let Err(e) = self.transition(&from, WorkerState::Terminated) {
            tracing::warn!(error = %e, "terminate raced another transition");
        }
        if let Some(sub) = self.conflict_listener.lock().ok().and_then(|mut s| s.take()) {
            sub.unsubscribe();
        }
    }

    /// Drain the queue and announce the result to every client.
    pub fn drain(&self, mode: SyncMode) -> OutboxResult<SyncReport> {
        self.expect_state(WorkerState::Active)?;
        let report = self.engine.sync_with(mode)?;
        if !report.was_skipped() {
            self.services.clients.broadcast(&WorkerMessage::SyncComplete {
                count: report.succeeded,
                succeeded: report.succeeded,
                failed: report.failed,
                total: report.attempted,
            });
        }
        Ok(report)
    }

    pub fn queue_status(&self) -> OutboxResult<QueueStatusReport> {
        let records = self.services.queue.list_all()?;
        Ok(QueueStatusReport {
            queue_size: records.len(),
            mutations: records.iter().map(|r| r.summary()).collect(),
        })
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("generation", &self.generation())
            .field("state", &self.state())
            .finish()
    }
}
