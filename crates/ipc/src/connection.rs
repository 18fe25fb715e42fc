//! One task per accepted connection (SPEC_FULL.md §4.7, §5), generalizing
//! the fan-out bus's `websocket::Connection::run`/`serve` pattern from
//! axum's `WebSocket` to any `AsyncRead + AsyncWrite` stream, so the same
//! loop drives both a `TcpStream` and (on Unix) a `UnixStream`.
//!
//! A length-prefixed frame read spans two `read_exact` calls, so it isn't
//! cancel-safe to race directly inside `tokio::select!` (a cancelled read
//! between the length prefix and the body would desync the stream for
//! every frame after it). A dedicated reader task owns the read half and
//! forwards whole frames over an `mpsc` channel instead; the connection
//! task only ever selects over channels, never over a partial read.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pitwall_fanout::request::RequestKind;
use pitwall_fanout::{ClientMessage, ClientRegistry, ClientRole, RequestServicer};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, split};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::framing::{read_frame, write_frame};
use crate::message::{ControlAck, ControlMessage, IpcClientMessage, IpcServerMessage};

/// SPEC_FULL.md §5's 250ms-per-write budget, shared with the WS bus.
const WRITE_BUDGET: Duration = Duration::from_millis(250);
const MAX_CONSECUTIVE_SLOW_WRITES: u32 = 3;

/// Depth of the reader task's forwarding channel. One slot is plenty since
/// the connection loop drains it continuously; this just decouples the
/// reader task's lifetime from a brief stall in the main loop.
const READ_QUEUE_DEPTH: usize = 8;

pub struct Connection {
    pub registry: Arc<ClientRegistry>,
    pub requests: RequestServicer,
}

impl Connection {
    pub async fn run<S>(self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut read_half, write_half) = split(stream);
        let Some(role) = await_registration(&mut read_half).await else {
            debug!("ipc connection closed before registering a role");
            return;
        };
        let incoming = spawn_reader(read_half);
        self.serve(write_half, incoming, role).await;
    }

    async fn serve<W>(
        self,
        mut write_half: W,
        mut incoming: mpsc::Receiver<IpcClientMessage>,
        role: ClientRole,
    ) where
        W: AsyncWrite + Unpin + Send,
    {
        let (client_id, mut channels) = self.registry.register(role).await;
        info!(%client_id, ?role, "ipc client registered");
        let mut consecutive_slow_writes: u32 = 0;

        loop {
            tokio::select! {
                message = incoming.recv() => {
                    match message {
                        Some(message) => {
                            self.handle_client_message(message, &mut write_half, &mut consecutive_slow_writes).await;
                        }
                        None => break,
                    }
                }
                changed = channels.push.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let Some(message) = channels.push.borrow_and_update().clone() else { continue };
                    if !write_budgeted(&mut write_half, &IpcServerMessage::from((*message).clone()), &mut consecutive_slow_writes).await {
                        break;
                    }
                }
                Some(event) = channels.events.recv() => {
                    if !write_budgeted(&mut write_half, &IpcServerMessage::from(event), &mut consecutive_slow_writes).await {
                        break;
                    }
                }
            }

            if consecutive_slow_writes >= MAX_CONSECUTIVE_SLOW_WRITES {
                warn!(%client_id, "disconnecting ipc client after repeated slow writes");
                break;
            }
        }

        self.registry.unregister(client_id).await;
        info!(%client_id, "ipc client unregistered");
    }

    async fn handle_client_message<W>(
        &self,
        message: IpcClientMessage,
        write_half: &mut W,
        consecutive_slow_writes: &mut u32,
    ) where
        W: AsyncWrite + Unpin + Send,
    {
        let response = match message {
            IpcClientMessage::Control(ControlMessage::SwitchPage { page }) => {
                IpcServerMessage::Control(ControlAck::PageSwitched { page })
            }
            IpcClientMessage::Control(ControlMessage::SetScale { scale }) => {
                IpcServerMessage::Control(ControlAck::ScaleSet { scale })
            }
            IpcClientMessage::Control(ControlMessage::Ping) => {
                IpcServerMessage::Control(ControlAck::Pong)
            }
            IpcClientMessage::Bus(ClientMessage::RegisterClient { .. }) => {
                // Already registered at connect time; a second handshake is ignored.
                return;
            }
            IpcClientMessage::Bus(ClientMessage::RaceInfo { request_id }) => {
                IpcServerMessage::from(self.requests.service(request_id, RequestKind::RaceInfo).await)
            }
            IpcClientMessage::Bus(ClientMessage::DriverInfo { request_id, index }) => {
                IpcServerMessage::from(
                    self.requests
                        .service(request_id, RequestKind::DriverInfo(index))
                        .await,
                )
            }
        };
        let _ = write_budgeted(write_half, &response, consecutive_slow_writes).await;
    }
}

/// Reads frames from the connection until EOF or a malformed frame, handing
/// each one to the connection task over a channel; the connection task is
/// the only place a partial-frame cancellation could occur, and it never
/// touches the stream directly.
fn spawn_reader<S>(mut read_half: ReadHalf<S>) -> mpsc::Receiver<IpcClientMessage>
where
    S: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(READ_QUEUE_DEPTH);
    tokio::spawn(async move {
        loop {
            match read_frame::<_, IpcClientMessage>(&mut read_half).await {
                Ok(message) => {
                    if tx.send(message).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    debug!(%error, "ipc connection closed or sent a malformed frame");
                    break;
                }
            }
        }
    });
    rx
}

/// Waits for the `register-client` handshake before any push or request
/// traffic flows, same as the WS bus's connection entry point.
async fn await_registration<S>(read_half: &mut ReadHalf<S>) -> Option<ClientRole>
where
    S: AsyncRead + Unpin + Send,
{
    loop {
        match read_frame::<_, IpcClientMessage>(read_half).await {
            Ok(IpcClientMessage::Bus(ClientMessage::RegisterClient { client_type })) => {
                return Some(client_type);
            }
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

async fn write_budgeted<W>(
    write_half: &mut W,
    message: &IpcServerMessage,
    consecutive_slow_writes: &mut u32,
) -> bool
where
    W: AsyncWrite + Unpin + Send,
{
    let started = Instant::now();
    let outcome = tokio::time::timeout(WRITE_BUDGET, write_frame(write_half, message)).await;
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
            warn!(%error, "ipc write error");
            false
        }
        Err(_) => {
            *consecutive_slow_writes += 1;
            true
        }
    }
}
