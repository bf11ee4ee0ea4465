//! The page's end of the worker message channel.

use std::sync::mpsc::Receiver;
use std::sync::Weak;

use outbox_core::models::WorkerMessage;
use outbox_worker::{ClientId, WorkerHandle};

use crate::client::ClientInner;

pub(crate) struct WorkerLink {
    handle: WorkerHandle,
    client: ClientId,
}

impl WorkerLink {
    /// Connect to the worker and forward its broadcasts into `inner` on a
    /// listener thread. The thread ends when either side goes away.
    pub(crate) fn attach(handle: WorkerHandle, inner: Weak<ClientInner>) -> Self {
        let (client, inbox) = handle.connect_client();
        let spawned = std::thread::Builder::new()
            .name(format!("outbox-client-{client}"))
            .spawn(move || listen(inbox, inner));
        if let Err(e) = spawned {
            tracing::warn!(client = %client, error = %e, "worker messages will not be received");
        }
        Self { handle, client }
    }

    pub(crate) fn client_id(&self) -> ClientId {
        self.client
    }

    pub(crate) fn detach(&self) {
        // Dropping the sender ends the listener even if the runtime is gone.
        self.handle.registration().clients().disconnect(self.client);
        if let Err(e) = self.handle.disconnect_client(self.client) {
            tracing::debug!(client = %self.client, error = %e, "worker already stopped");
        }
    }
}

fn listen(inbox: Receiver<WorkerMessage>, inner: Weak<ClientInner>) {
    for message in inbox.iter() {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.apply_worker_message(&message);
    }
}
