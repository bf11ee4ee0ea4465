//! The worker's event loop.
//!
//! A dedicated thread owns the registration and handles one event at a
//! time. Its lifetime is independent of every client: pages come and go,
//! the runtime keeps draining.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use outbox_core::constants::{PERIODIC_SYNC_TAG, SYNC_TAG};
use outbox_core::errors::{OutboxResult, WorkerError};
use outbox_core::models::{
    CapturedResponse, OutboundRequest, QueueStatusReport, SyncReport, WorkerMessage,
};
use outbox_sync::SyncMode;

use crate::clients::ClientId;
use crate::messages::ClientMessage;
use crate::registration::WorkerRegistration;

/// Everything that can wake the worker.
#[derive(Debug)]
pub enum RuntimeEvent {
    Fetch {
        request: OutboundRequest,
        reply: Sender<OutboxResult<CapturedResponse>>,
    },
    Message(ClientMessage),
    /// Ask for a drain when connectivity allows.
    RegisterSync(String),
    /// The platform fired a registered tag.
    Sync(String),
    /// Platform connectivity signal as seen by the worker.
    Connectivity(bool),
    ClientClosed(ClientId),
    Periodic,
    Shutdown,
}

pub struct WorkerRuntime {
    registration: Arc<WorkerRegistration>,
    periodic: Option<Duration>,
}

impl WorkerRuntime {
    /// Spawn the event loop.
    pub fn start(registration: Arc<WorkerRegistration>) -> OutboxResult<WorkerHandle> {
        let periodic = registration.services().sync_config.periodic_sync_interval();
        let (tx, rx) = mpsc::channel();
        let runtime = WorkerRuntime {
            registration: Arc::clone(&registration),
            periodic,
        };
        let thread = std::thread::Builder::new()
            .name("outbox-worker".to_string())
            .spawn(move || runtime.run(rx))
            .map_err(|e| {
                tracing::error!(error = %e, "could not spawn worker runtime");
                WorkerError::RuntimeStopped
            })?;
        Ok(WorkerHandle {
            tx,
            registration,
            thread: Arc::new(Mutex::new(Some(thread))),
        })
    }

    fn run(self, rx: Receiver<RuntimeEvent>) {
        tracing::info!("worker runtime started");
        if self.is_online() {
            self.fire_pending();
        }

        let mut next_tick = self.periodic.map(|d| Instant::now() + d);
        loop {
            let event = match (next_tick, self.periodic) {
                (Some(at), Some(every)) => {
                    match rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                        Ok(event) => event,
                        Err(RecvTimeoutError::Timeout) => {
                            next_tick = Some(Instant::now() + every);
                            RuntimeEvent::Periodic
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                _ => match rx.recv() {
                    Ok(event) => event,
                    Err(_) => break,
                },
            };
            if !self.handle(event) {
                break;
            }
        }
        tracing::info!("worker runtime stopped");
    }

    fn is_online(&self) -> bool {
        self.registration.services().connectivity.is_online()
    }

    /// Returns `false` once the loop should stop.
    fn handle(&self, event: RuntimeEvent) -> bool {
        match event {
            RuntimeEvent::Fetch { request, reply } => {
                let _ = reply.send(self.registration.handle_fetch(&request));
            }
            RuntimeEvent::Message(message) => self.on_message(message),
            RuntimeEvent::RegisterSync(tag) => {
                self.registration.services().background_sync.register(&tag);
                if self.is_online() {
                    self.fire(&tag);
                }
            }
            RuntimeEvent::Sync(tag) => self.fire(&tag),
            RuntimeEvent::Connectivity(online) => {
                let connectivity = &self.registration.services().connectivity;
                if connectivity.set_online(online) && online {
                    self.fire_pending();
                }
            }
            RuntimeEvent::ClientClosed(id) => {
                if let Err(e) = self.registration.release_client(id) {
                    tracing::warn!(client = %id, error = %e, "activation after release failed");
                }
            }
            RuntimeEvent::Periodic => {
                if self.is_online() {
                    self.fire(PERIODIC_SYNC_TAG);
                }
            }
            RuntimeEvent::Shutdown => return false,
        }
        true
    }

    fn on_message(&self, message: ClientMessage) {
        tracing::debug!(kind = message.kind(), "client message");
        match message {
            ClientMessage::SkipWaiting => {
                if let Err(e) = self.registration.skip_waiting() {
                    tracing::warn!(error = %e, "skip waiting failed");
                }
            }
            ClientMessage::ManualSync { reply } => {
                let result = self.registration.drain(SyncMode::Force);
                if let Ok(report) = &result {
                    self.settle_tags(report);
                }
                let _ = reply.send(result.map_err(|e| e.to_string()));
            }
            ClientMessage::GetQueueStatus { reply } => {
                let _ = reply.send(self.registration.queue_status().map_err(|e| e.to_string()));
            }
        }
    }

    /// Drain for any pending tag, or for records left in the store by an
    /// earlier process whose tags did not survive.
    fn fire_pending(&self) {
        let services = self.registration.services();
        if let Some(tag) = services.background_sync.pending().into_iter().next() {
            // One drain covers every tag.
            self.fire(&tag);
            return;
        }
        match services.queue.count() {
            Ok(0) => {}
            Ok(queued) => {
                tracing::debug!(queued, "untagged records in the queue");
                services.background_sync.register(SYNC_TAG);
                self.fire(SYNC_TAG);
            }
            Err(e) => tracing::warn!(error = %e, "could not read queue depth"),
        }
    }

    fn fire(&self, tag: &str) {
        if !self.is_online() {
            tracing::debug!(tag, "sync deferred until online");
            return;
        }
        match self.registration.drain(SyncMode::Scheduled) {
            Ok(report) => self.settle_tags(&report),
            Err(e) => tracing::warn!(tag, error = %e, "background sync failed"),
        }
    }

    /// An emptied queue satisfies every tag. Records still queued keep a
    /// tag alive for the next trigger.
    fn settle_tags(&self, report: &SyncReport) {
        if report.was_skipped() {
            return;
        }
        let background_sync = &self.registration.services().background_sync;
        if report.remaining == 0 {
            background_sync.take_pending();
        } else {
            background_sync.register(SYNC_TAG);
        }
    }
}

/// Cloneable handle to a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: Sender<RuntimeEvent>,
    registration: Arc<WorkerRegistration>,
    thread: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl WorkerHandle {
    pub fn registration(&self) -> &Arc<WorkerRegistration> {
        &self.registration
    }

    fn send(&self, event: RuntimeEvent) -> OutboxResult<()> {
        self.tx
            .send(event)
            .map_err(|_| WorkerError::RuntimeStopped.into())
    }

    /// Route a request through the worker and wait for its answer.
    pub fn fetch(&self, request: OutboundRequest) -> OutboxResult<CapturedResponse> {
        let (reply, rx) = mpsc::channel();
        self.send(RuntimeEvent::Fetch { request, reply })?;
        rx.recv().map_err(|_| WorkerError::RuntimeStopped)?
    }

    pub fn post_message(&self, message: ClientMessage) -> OutboxResult<()> {
        self.send(RuntimeEvent::Message(message))
    }

    pub fn skip_waiting(&self) -> OutboxResult<()> {
        self.post_message(ClientMessage::SkipWaiting)
    }

    /// Forced drain inside the worker, bounded by `timeout`.
    pub fn manual_sync(&self, timeout: Duration) -> OutboxResult<SyncReport> {
        let (reply, rx) = mpsc::channel();
        self.post_message(ClientMessage::ManualSync { reply })?;
        await_reply(&rx, "MANUAL_SYNC", timeout)
    }

    pub fn queue_status(&self, timeout: Duration) -> OutboxResult<QueueStatusReport> {
        let (reply, rx) = mpsc::channel();
        self.post_message(ClientMessage::GetQueueStatus { reply })?;
        await_reply(&rx, "GET_QUEUE_STATUS", timeout)
    }

    pub fn register_sync(&self, tag: &str) -> OutboxResult<()> {
        self.send(RuntimeEvent::RegisterSync(tag.to_string()))
    }

    pub fn fire_sync(&self, tag: &str) -> OutboxResult<()> {
        self.send(RuntimeEvent::Sync(tag.to_string()))
    }

    pub fn set_online(&self, online: bool) -> OutboxResult<()> {
        self.send(RuntimeEvent::Connectivity(online))
    }

    pub fn tick(&self) -> OutboxResult<()> {
        self.send(RuntimeEvent::Periodic)
    }

    /// Open a channel to the worker. Messages arrive on the receiver.
    pub fn connect_client(&self) -> (ClientId, Receiver<WorkerMessage>) {
        self.registration.clients().connect()
    }

    pub fn disconnect_client(&self, id: ClientId) -> OutboxResult<()> {
        self.send(RuntimeEvent::ClientClosed(id))
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .lock()
            .map(|t| t.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Stop the loop and wait for it. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.tx.send(RuntimeEvent::Shutdown);
        let handle = self.thread.lock().ok().and_then(|mut t| t.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("worker runtime panicked");
            }
        }
    }
}

fn await_reply<T>(
    rx: &Receiver<Result<T, String>>,
    operation: &str,
    timeout: Duration,
) -> OutboxResult<T> {
    match rx.recv_timeout(timeout) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(reason)) => Err(WorkerError::Remote { reason }.into()),
        Err(RecvTimeoutError::Timeout) => Err(WorkerError::SyncTimeout {
            operation: operation.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
        .into()),
        Err(RecvTimeoutError::Disconnected) => Err(WorkerError::RuntimeStopped.into()),
    }
}
