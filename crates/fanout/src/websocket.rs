//! The axum `WebSocketUpgrade` handler: one task per connection (SPEC_FULL.md
//! §4.5, §6). The same task drives both halves — reading client messages and
//! draining the registry's push/event channels — since only the read branch
//! ever needs a live borrow of the socket while `tokio::select!` is deciding
//! which branch fired; the other branches just hand back a message for the
//! loop body to write out afterwards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use pitwall_telemetry_core::ErrorTally;
use tracing::{debug, info, warn};

use crate::message::{ClientMessage, ClientRole, ServerMessage};
use crate::registry::ClientRegistry;
use crate::request::{RequestKind, RequestServicer};

/// A write that takes longer than this is counted as a slow write
/// (SPEC_FULL.md §5's 250ms-per-write budget).
const WRITE_BUDGET: Duration = Duration::from_millis(250);

/// A client disconnected after this many consecutive slow writes.
const MAX_CONSECUTIVE_SLOW_WRITES: u32 = 3;

pub struct Connection {
    pub registry: Arc<ClientRegistry>,
    pub requests: RequestServicer,
    pub slow_clients: Arc<ErrorTally<ClientRole>>,
}

impl Connection {
    pub async fn run(self, mut socket: WebSocket) {
        let Some(role) = await_registration(&mut socket).await else {
            debug!("connection closed before registering a role");
            return;
        };
        self.serve(socket, role).await;
    }

    async fn serve(self, mut socket: WebSocket, role: ClientRole) {
        let (client_id, mut channels) = self.registry.register(role).await;
        info!(%client_id, ?role, "client registered");
        let mut consecutive_slow_writes: u32 = 0;

        loop {
            tokio::select! {
                incoming = socket.recv() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_client_message(&text, client_id, &mut socket, &mut consecutive_slow_writes).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(error)) => {
                            warn!(%client_id, %error, "websocket read error");
                            break;
                        }
                    }
                }
                changed = channels.push.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let Some(message) = channels.push.borrow_and_update().clone() else { continue };
                    if !write_budgeted(&mut socket, &message, &mut consecutive_slow_writes).await {
                        break;
                    }
                }
                Some(event) = channels.events.recv() => {
                    if !write_budgeted(&mut socket, &event, &mut consecutive_slow_writes).await {
                        break;
                    }
                }
            }

            if consecutive_slow_writes >= MAX_CONSECUTIVE_SLOW_WRITES {
                warn!(%client_id, "disconnecting after repeated slow writes");
                self.slow_clients.record(role);
                break;
            }
        }

        self.registry.unregister(client_id).await;
        info!(%client_id, "client unregistered");
    }

    async fn handle_client_message(
        &self,
        text: &str,
        client_id: uuid::Uuid,
        socket: &mut WebSocket,
        consecutive_slow_writes: &mut u32,
    ) {
        let parsed: Result<ClientMessage, _> = serde_json::from_str(text);
        let message = match parsed {
            Ok(ClientMessage::RegisterClient { .. }) => {
                // Already registered at connect time; a second handshake is ignored.
                return;
            }
            Ok(ClientMessage::RaceInfo { request_id }) => {
                self.requests.service(request_id, RequestKind::RaceInfo).await
            }
            Ok(ClientMessage::DriverInfo { request_id, index }) => {
                self.requests
                    .service(request_id, RequestKind::DriverInfo(index))
                    .await
            }
            Err(error) => {
                warn!(%client_id, %error, "could not parse client message");
                ServerMessage::Error {
                    request_id: None,
                    error: "could not parse message".to_string(),
                }
            }
        };
        let _ = write_budgeted(socket, &message, consecutive_slow_writes).await;
    }
}

/// Waits for the `register-client` handshake the wire protocol requires
/// before any broadcast or request traffic flows; anything else received
/// beforehand is ignored rather than rejected outright.
async fn await_registration(socket: &mut WebSocket) -> Option<ClientRole> {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else { continue };
        if let Ok(ClientMessage::RegisterClient { client_type }) = serde_json::from_str(&text) {
            return Some(client_type);
        }
    }
    None
}

async fn write_budgeted(
    socket: &mut WebSocket,
    message: &ServerMessage,
    consecutive_slow_writes: &mut u32,
) -> bool {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(%error, "failed to encode outbound message");
            return true;
        }
    };
    let started = Instant::now();
    let outcome = tokio::time::timeout(WRITE_BUDGET, socket.send(Message::Text(payload.into())))
        .await;
    match outcome {
        Ok(Ok(())) => {
            if started.elapsed() >= WRITE_BUDGET {
                *consecutive_slow_writes += 1;
            } else {
                *consecutive_slow_writes = 0;
            }
            true
        }
        Ok(Err(error)) => {
            warn!(%error, "websocket write error");
            false
        }
        Err(_) => {
            *consecutive_slow_writes += 1;
            true
        }
    }
}
