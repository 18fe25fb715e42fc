//! Per-role subscriber registry (SPEC_FULL.md §4.5).
//!
//! Generalizes the donor IPC server's `Arc<RwLock<HashMap<String, ClientInfo>>>`
//! client table (`openracing-ipc/src/server.rs`) from "one registry of
//! hardware clients" to "one registry per subscriber role": every connected
//! client gets a `watch` slot for the broadcast cadence (latest-value-wins is
//! exactly the "oldest pending broadcast is dropped, at most one in flight"
//! rule the spec asks for) plus a small bounded `mpsc` for request responses
//! and frontend notifications, which are correlated rather than cadence-driven.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, watch};
use tracing::debug;
use uuid::Uuid;

use crate::message::{ClientRole, ServerMessage};

/// Bounded mailbox for request/response replies and frontend notifications.
/// Best-effort: a full queue drops the newest message rather than blocking
/// the caller, since both message kinds are already correlated or advisory.
const EVENT_QUEUE_DEPTH: usize = 32;

pub struct ClientHandle {
    pub id: Uuid,
    pub role: ClientRole,
    push: watch::Sender<Option<Arc<ServerMessage>>>,
    events: mpsc::Sender<ServerMessage>,
}

impl ClientHandle {
    /// Best-effort delivery of a correlated response or a frontend
    /// notification; drops the message if the client's event queue is full.
    pub fn send_event(&self, message: ServerMessage) {
        if self.events.try_send(message).is_err() {
            debug!(client_id = %self.id, "event queue full, dropping message");
        }
    }
}

/// The receiving half handed to a connection's write task on registration.
pub struct ClientChannels {
    pub push: watch::Receiver<Option<Arc<ServerMessage>>>,
    pub events: mpsc::Receiver<ServerMessage>,
}

#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<Uuid, ClientHandle>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, role: ClientRole) -> (Uuid, ClientChannels) {
        let id = Uuid::new_v4();
        let (push_tx, push_rx) = watch::channel(None);
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let handle = ClientHandle {
            id,
            role,
            push: push_tx,
            events: events_tx,
        };
        self.clients.write().await.insert(id, handle);
        (
            id,
            ClientChannels {
                push: push_rx,
                events: events_rx,
            },
        )
    }

    pub async fn unregister(&self, id: Uuid) {
        self.clients.write().await.remove(&id);
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Overwrites every subscriber's push slot for `role` with `message`.
    /// A watch channel with a single receiver per client already gives
    /// exactly the "drop the oldest pending broadcast, at most one in
    /// flight" semantics the spec asks for — no explicit queue to manage.
    pub async fn publish(&self, role: ClientRole, message: Arc<ServerMessage>) {
        let clients = self.clients.read().await;
        for handle in clients.values().filter(|c| c.role == role) {
            // A send error means the receiver (and its connection task) has
            // already gone away; the connection task's own unregister call
            // removes it from the map shortly after.
            let _ = handle.push.send(Some(Arc::clone(&message)));
        }
    }

    /// Best-effort delivery of a frontend notification to every subscriber
    /// of `role` (SPEC_FULL.md §4.5 "frontend-update").
    pub async fn broadcast_event(&self, role: ClientRole, message: ServerMessage) {
        let clients = self.clients.read().await;
        for handle in clients.values().filter(|c| c.role == role) {
            handle.send_event(message.clone());
        }
    }

    pub async fn send_event(&self, id: Uuid, message: ServerMessage) {
        if let Some(handle) = self.clients.read().await.get(&id) {
            handle.send_event(message);
        }
    }
}
