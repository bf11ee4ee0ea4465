//! Active and waiting generations for one origin.

use std::sync::{Arc, Mutex, MutexGuard};

use outbox_core::config::WorkerConfig;
use outbox_core::errors::{OutboxResult, WorkerError};
use outbox_core::models::{CapturedResponse, OutboundRequest, QueueStatusReport, SyncReport};
use outbox_sync::SyncMode;

use crate::clients::{ClientId, ClientRegistry};
use crate::worker::{Worker, WorkerServices};

#[derive(Default)]
struct Slots {
    active: Option<Arc<Worker>>,
    waiting: Option<Arc<Worker>>,
}

/// Owns the generations of the worker for one origin.
///
/// A freshly installed generation waits while an older one still controls
/// open clients, unless told to skip waiting.
pub struct WorkerRegistration {
    services: WorkerServices,
    slots: Mutex<Slots>,
}

impl WorkerRegistration {
    pub fn new(services: WorkerServices) -> Self {
        Self {
            services,
            slots: Mutex::new(Slots::default()),
        }
    }

    fn slots(&self) -> Result<MutexGuard<'_, Slots>, WorkerError> {
        self.slots.lock().map_err(|_| WorkerError::InvalidState {
            expected: "registration".to_string(),
            found: "poisoned".to_string(),
        })
    }

    pub fn services(&self) -> &WorkerServices {
        &self.services
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.services.clients
    }

    pub fn active(&self) -> Option<Arc<Worker>> {
        self.slots().ok().and_then(|s| s.active.clone())
    }

    pub fn waiting(&self) -> Option<Arc<Worker>> {
        self.slots().ok().and_then(|s| s.waiting.clone())
    }

    /// Install a new generation.
    ///
    /// It activates at once when nothing is active or no client is open;
    /// otherwise it waits. A previously waiting generation is discarded.
    pub fn register(&self, config: WorkerConfig) -> OutboxResult<Arc<Worker>> {
        let worker = Arc::new(Worker::new(config, self.services.clone())?);
        worker.install()?;

        let replaced = self.slots()?.waiting.replace(Arc::clone(&worker));
        if let Some(old) = replaced {
            old.terminate();
        }

        let has_active = self.slots()?.active.is_some();
        if !has_active || self.services.clients.is_empty() {
            self.promote()?;
        }
        Ok(worker)
    }

    /// Activate the waiting generation now. Returns `false` if none waits.
    pub fn skip_waiting(&self) -> OutboxResult<bool> {
        self.promote()
    }

    /// A page closed. The last one to go lets a waiting generation in.
    pub fn release_client(&self, id: ClientId) -> OutboxResult<bool> {
        self.services.clients.disconnect(id);
        if self.services.clients.is_empty() {
            return self.promote();
        }
        Ok(false)
    }

    fn promote(&self) -> OutboxResult<bool> {
        let mut slots = self.slots()?;
        let Some(next) = slots.waiting.take() else {
            return Ok(false);
        };
        if let Err(e) = next.activate() {
            slots.waiting = Some(next);
            return Err(e);
        }
        if let Some(previous) = slots.active.replace(next) {
            previous.terminate();
        }
        Ok(true)
    }

    fn require_active(&self) -> OutboxResult<Arc<Worker>> {
        self.active()
            .ok_or_else(|| WorkerError::NoActiveWorker.into())
    }

    pub fn handle_fetch(&self, request: &OutboundRequest) -> OutboxResult<CapturedResponse> {
        self.require_active()?.handle_fetch(request)
    }

    pub fn drain(&self, mode: SyncMode) -> OutboxResult<SyncReport> {
        self.require_active()?.drain(mode)
    }

    pub fn queue_status(&self) -> OutboxResult<QueueStatusReport> {
        self.require_active()?.queue_status()
    }
}
