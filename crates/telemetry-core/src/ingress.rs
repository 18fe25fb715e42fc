//! The UDP receive loop (SPEC_FULL.md §4.2). Binds the socket, tees every
//! raw datagram out to whatever is listening (forwarder, capture writer),
//! decodes it, and pushes the result onto a [`crate::queue::PacketQueue`]
//! for the decode/apply task. A `--replay-server` run swaps the live socket
//! for any other [`RawDatagramSource`] (a TCP stream, a capture-file reader)
//! without touching the rest of the pipeline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pitwall_codec::DecodeError;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::connection::ConnectionHealth;
use crate::counters::ErrorTally;
use crate::queue::PacketQueue;

/// Anything that can hand the ingress loop the next raw datagram, in order.
/// Implemented by the live UDP socket and, in `pitwall-recorder`, by a
/// capture-file reader used for `--replay-server` and deterministic test
/// fixtures.
#[async_trait]
pub trait RawDatagramSource: Send {
    async fn recv(&mut self) -> std::io::Result<Vec<u8>>;
}

struct UdpSource {
    socket: UdpSocket,
    buf: Vec<u8>,
}

#[async_trait]
impl RawDatagramSource for UdpSource {
    async fn recv(&mut self) -> std::io::Result<Vec<u8>> {
        let len = self.socket.recv(&mut self.buf).await?;
        Ok(self.buf[..len].to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct IngressConfig {
    pub bind_addr: SocketAddr,
    pub recv_buffer_size: usize,
    pub queue_capacity: usize,
}

/// Initial delay before retrying a failed receive (SPEC_FULL.md §7: once
/// bound, a live socket never fails the process, it backs off and retries).
const RETRY_BACKOFF_FLOOR: Duration = Duration::from_millis(50);
/// Upper bound the exponential backoff never exceeds (SPEC_FULL.md §7,
/// "exponential backoff capped at 5 s").
const RETRY_BACKOFF_CAP: Duration = Duration::from_secs(5);

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 20777).into(),
            recv_buffer_size: 2048,
            queue_capacity: 4096,
        }
    }
}

/// Owns the decoded-packet queue, the raw-datagram tee, the connection
/// health tracker, and the decode-error tally. `run` drives one
/// [`RawDatagramSource`] to completion (or until shutdown is signalled);
/// binding a live socket and starting a replay source are both just
/// different ways to obtain that source.
pub struct IngressListener {
    queue: Arc<PacketQueue>,
    raw_tee: broadcast::Sender<Arc<[u8]>>,
    decode_errors: Arc<ErrorTally<DecodeErrorKind>>,
}

/// A `Copy`-friendly discriminant for [`DecodeError`], since the error type
/// itself carries per-instance data that would otherwise make it a poor
/// tally key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    ShortRead,
    UnsupportedFormatYear,
    UnknownPacketId,
    EnumOutOfRange,
}

impl From<&DecodeError> for DecodeErrorKind {
    fn from(error: &DecodeError) -> Self {
        match error {
            DecodeError::ShortRead { .. } => Self::ShortRead,
            DecodeError::UnsupportedFormatYear { .. } => Self::UnsupportedFormatYear,
            DecodeError::UnknownPacketId { .. } => Self::UnknownPacketId,
            DecodeError::EnumOutOfRange { .. } => Self::EnumOutOfRange,
        }
    }
}

impl IngressListener {
    pub fn new(config: &IngressConfig) -> Self {
        let (raw_tee, _rx) = broadcast::channel(1024);
        Self {
            queue: Arc::new(PacketQueue::new(config.queue_capacity)),
            raw_tee,
            decode_errors: Arc::new(ErrorTally::new()),
        }
    }

    /// Binds the UDP socket described by `config`. Bind failure is fatal at
    /// startup (SPEC_FULL.md §6 exit code 3); once bound, receive errors are
    /// handled by the caller's retry loop (SPEC_FULL.md §7).
    pub async fn bind(config: &IngressConfig) -> std::io::Result<Box<dyn RawDatagramSource>> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        Ok(Box::new(UdpSource {
            socket,
            buf: vec![0u8; config.recv_buffer_size],
        }))
    }

    pub fn queue(&self) -> Arc<PacketQueue> {
        Arc::clone(&self.queue)
    }

    pub fn decode_error_tally(&self) -> Arc<ErrorTally<DecodeErrorKind>> {
        Arc::clone(&self.decode_errors)
    }

    /// Subscribes to the raw-datagram tee (SPEC_FULL.md §4.2's "tees every
    /// raw datagram to the forwarders and capture writer before decoding").
    /// Each subscriber gets every datagram independently; a slow subscriber
    /// only lags its own view, it never blocks ingress.
    pub fn subscribe_raw(&self) -> broadcast::Receiver<Arc<[u8]>> {
        self.raw_tee.subscribe()
    }

    /// Drives `source` until it returns an error (socket closed) or
    /// `shutdown` resolves. Every datagram is teed raw, then decoded; decode
    /// failures are counted and otherwise ignored, per SPEC_FULL.md §7 —
    /// nothing here is fatal once the socket is bound.
    pub async fn run(
        &self,
        mut source: Box<dyn RawDatagramSource>,
        health: &std::sync::Mutex<ConnectionHealth>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        let mut backoff = RETRY_BACKOFF_FLOOR;
        loop {
            let recv = source.recv();
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("ingress loop shutting down");
                        return;
                    }
                }
                result = recv => {
                    match result {
                        Ok(bytes) => {
                            backoff = RETRY_BACKOFF_FLOOR;
                            self.handle_datagram(&bytes, health);
                        }
                        Err(error) => {
                            warn!(%error, backoff_ms = backoff.as_millis(), "ingress receive failed, retrying");
                            tokio::time::sleep(backoff).await;
                            backoff = next_backoff(backoff);
                        }
                    }
                }
            }
        }
    }

    fn handle_datagram(&self, bytes: &[u8], health: &std::sync::Mutex<ConnectionHealth>) {
        if let Ok(mut guard) = health.lock() {
            guard.record_datagram();
        }
        let _ = self.raw_tee.send(Arc::from(bytes));
        match pitwall_codec::decode(bytes) {
            Ok(packet) => self.queue.push(packet),
            Err(error) => {
                self.decode_errors.record(DecodeErrorKind::from(&error));
                debug!(%error, "dropping undecodable datagram");
            }
        }
    }
}

/// Doubles `backoff`, capped at [`RETRY_BACKOFF_CAP`]. A free function so
/// the doubling-and-cap arithmetic is testable without driving real sleeps.
fn next_backoff(backoff: Duration) -> Duration {
    backoff.saturating_mul(2).min(RETRY_BACKOFF_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    struct FixedSource {
        frames: StdMutex<VecDeque<Vec<u8>>>,
    }

    #[async_trait]
    impl RawDatagramSource for FixedSource {
        async fn recv(&mut self) -> std::io::Result<Vec<u8>> {
            let mut guard = self.frames.lock().expect("lock");
            guard.pop_front().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "source exhausted")
            })
        }
    }

    #[tokio::test]
    async fn an_undecodable_datagram_is_counted_and_does_not_stop_the_loop() {
        let listener = IngressListener::new(&IngressConfig::default());
        let health = std::sync::Mutex::new(ConnectionHealth::default());
        listener.handle_datagram(&[0u8; 2], &health);
        assert_eq!(listener.decode_error_tally().total(), 1);
        assert_eq!(listener.queue().len(), 0);
    }

    #[tokio::test]
    async fn raw_datagrams_are_teed_before_decode_is_attempted() {
        let listener = IngressListener::new(&IngressConfig::default());
        let mut raw = listener.subscribe_raw();
        let health = std::sync::Mutex::new(ConnectionHealth::default());
        listener.handle_datagram(&[1, 2, 3], &health);
        let received = raw.recv().await.expect("tee delivers the datagram");
        assert_eq!(&received[..], &[1, 2, 3]);
    }

    #[tokio::test]
    async fn run_stops_cleanly_on_shutdown_signal() {
        let listener = IngressListener::new(&IngressConfig::default());
        let health = std::sync::Mutex::new(ConnectionHealth::default());
        let (tx, rx) = tokio::sync::watch::channel(false);
        let source: Box<dyn RawDatagramSource> = Box::new(FixedSource {
            frames: StdMutex::new(VecDeque::new()),
        });
        let run = listener.run(source, &health, rx);
        tokio::pin!(run);
        tx.send(true).expect("receiver still alive");
        tokio::time::timeout(Duration::from_millis(200), run)
            .await
            .expect("shutdown observed promptly");
    }

    #[test]
    fn retry_backoff_doubles_and_caps_at_five_seconds() {
        let mut backoff = RETRY_BACKOFF_FLOOR;
        for _ in 0..20 {
            backoff = next_backoff(backoff);
            assert!(backoff <= RETRY_BACKOFF_CAP);
        }
        assert_eq!(backoff, RETRY_BACKOFF_CAP);
    }
}
