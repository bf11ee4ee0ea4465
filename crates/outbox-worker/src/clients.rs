//! Open clients controlled by the worker and the broadcast channel to them.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use dashmap::DashMap;
use uuid::Uuid;

use outbox_core::models::WorkerMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Every page instance currently connected to the worker.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, Sender<WorkerMessage>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client. The receiver is its inbox.
    pub fn connect(&self) -> (ClientId, Receiver<WorkerMessage>) {
        let (tx, rx) = mpsc::channel();
        let id = ClientId::new();
        self.clients.insert(id, tx);
        tracing::debug!(client = %id, "client connected");
        (id, rx)
    }

    pub fn disconnect(&self, id: ClientId) -> bool {
        self.clients.remove(&id).is_some()
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Deliver to every client. Clients whose inbox is gone are pruned.
    /// Returns the number of clients reached.
    pub fn broadcast(&self, message: &WorkerMessage) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, tx| tx.send(message.clone()).is_ok());
        let reached = self.clients.len();
        if reached < before {
            tracing::debug!(pruned = before - reached, "pruned closed clients");
        }
        reached
    }
}
