//! Binds the chosen local transport and spawns one [`Connection`] task per
//! accepted stream (SPEC_FULL.md §4.7), sharing a single
//! `pitwall_fanout::ClientRegistry`/`RequestServicer` pair with the
//! WebSocket fan-out bus so the two fronts publish to the same subscribers.

use std::sync::Arc;
use std::time::Duration;

use pitwall_fanout::{ClientRegistry, RequestServicer};
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::connection::Connection;
use crate::error::{IpcError, IpcResult};
use crate::transport::TransportType;

#[derive(Debug, Clone)]
pub struct IpcConfig {
    pub transport: TransportType,
    pub request_timeout: Duration,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            transport: TransportType::default(),
            request_timeout: pitwall_fanout::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Owns nothing but the bound listener; registry and request servicing are
/// shared with the WS bus and passed in by the caller.
pub struct IpcServer {
    registry: Arc<ClientRegistry>,
    requests: RequestServicer,
}

impl IpcServer {
    pub fn new(registry: Arc<ClientRegistry>, requests: RequestServicer) -> Self {
        Self { registry, requests }
    }

    /// Binds `config.transport` and runs the accept loop until the process
    /// shuts down. Each accepted stream gets its own [`Connection`] task.
    pub async fn serve(self, config: IpcConfig) -> IpcResult<()> {
        match config.transport {
            TransportType::Tcp { address, port } => {
                let addr = format!("{address}:{port}");
                let listener = TcpListener::bind(&addr).await.map_err(|source| IpcError::Bind {
                    transport: format!("TCP {addr}"),
                    source,
                })?;
                info!(%addr, "ipc listening on tcp");
                loop {
                    let (stream, peer) = match listener.accept().await {
                        Ok(accepted) => accepted,
                        Err(error) => {
                            warn!(%error, "ipc tcp accept failed");
                            continue;
                        }
                    };
                    info!(%peer, "ipc tcp connection accepted");
                    self.spawn_connection(stream);
                }
            }
            #[cfg(unix)]
            TransportType::UnixSocket { socket_path } => {
                if socket_path.exists() {
                    std::fs::remove_file(&socket_path).map_err(|source| {
                        IpcError::StaleSocketCleanup {
                            path: socket_path.clone(),
                            source,
                        }
                    })?;
                }
                let listener =
                    UnixListener::bind(&socket_path).map_err(|source| IpcError::Bind {
                        transport: format!("Unix socket {socket_path:?}"),
                        source,
                    })?;
                info!(?socket_path, "ipc listening on unix socket");
                loop {
                    let (stream, _) = match listener.accept().await {
                        Ok(accepted) => accepted,
                        Err(error) => {
                            warn!(%error, "ipc unix socket accept failed");
                            continue;
                        }
                    };
                    info!("ipc unix socket connection accepted");
                    self.spawn_connection(stream);
                }
            }
            #[cfg(windows)]
            TransportType::NamedPipe { .. } => {
                // Named pipe transport is platform-native on Windows but not
                // implementable without a Windows target; tracked for a
                // follow-up once that target is in CI.
                Err(IpcError::Bind {
                    transport: "named pipe".to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::Unsupported,
                        "named pipe transport is not yet implemented",
                    ),
                })
            }
        }
    }

    fn spawn_connection<S>(&self, stream: S)
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let connection = Connection {
            registry: Arc::clone(&self.registry),
            requests: self.requests.clone(),
        };
        tokio::spawn(connection.run(stream));
    }
}
