//! `--replay-server` (SPEC_FULL.md §6): instead of binding the live UDP
//! socket, listen on the same port for a single TCP connection and read
//! raw datagrams back off it, each framed as a 4-byte little-endian length
//! prefix followed by the payload — the same length-prefixing convention
//! `pitwall-ipc::framing` uses for its own wire messages, applied here to
//! raw bytes instead of JSON since the payload already is one.

use std::io;

use async_trait::async_trait;
use pitwall_telemetry_core::RawDatagramSource;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

/// A single frame larger than this is rejected, mirroring
/// `pitwall-ipc::framing`'s own bound against a corrupt length prefix.
const MAX_FRAME_LEN: u32 = 1024 * 1024;

/// Accepts one replay client and feeds its framed stream through the
/// decode path exactly as [`RawDatagramSource`] expects from a live socket.
pub struct TcpReplaySource {
    stream: TcpStream,
}

impl TcpReplaySource {
    /// Binds `bind_addr` and blocks until a single replay client connects.
    pub async fn accept(bind_addr: std::net::SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        info!(%bind_addr, "replay server listening for a tcp client");
        Self::accept_on(&listener).await
    }

    /// Blocks until a single replay client connects to an already-bound
    /// listener, split out so tests can bind an ephemeral port without the
    /// bind-drop-rebind race a `SocketAddr`-only entry point would need.
    async fn accept_on(listener: &TcpListener) -> io::Result<Self> {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "replay client connected");
        Ok(Self { stream })
    }
}

#[async_trait]
impl RawDatagramSource for TcpReplaySource {
    async fn recv(&mut self) -> io::Result<Vec<u8>> {
        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf).await?;
        let len = u32::from_le_bytes(len_buf);
        if len > MAX_FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("replay frame length {len} exceeds the {MAX_FRAME_LEN} byte limit"),
            ));
        }
        let mut bytes = vec![0u8; len as usize];
        self.stream.read_exact(&mut bytes).await?;
        Ok(bytes)
    }
}

/// Writes one frame in the same `{len, bytes}` shape [`TcpReplaySource`]
/// expects, for a future replay-client tool or a test harness standing in
/// for one.
pub async fn write_replay_frame(stream: &mut TcpStream, bytes: &[u8]) -> io::Result<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "replay frame too large"))?;
    stream.write_all(&len.to_le_bytes()).await?;
    stream.write_all(bytes).await
}
