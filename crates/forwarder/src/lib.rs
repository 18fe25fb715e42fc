//! UDP Forwarders (SPEC_FULL.md §4.6): tee the raw inbound datagram, before
//! any decoding happens, to 0..N configured endpoints. No parsing, no
//! reordering, no backpressure on the ingress path — a send failure is
//! counted and logged, never propagated.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tracing::warn;

/// One configured downstream endpoint plus its own failure counter, so a
/// flaky forwarder target never masks whether the others are healthy
/// (SPEC_FULL.md §4.11's "per-forwarder send-error counter").
struct Target {
    addr: SocketAddr,
    send_errors: AtomicU64,
}

pub struct UdpForwarder {
    socket: UdpSocket,
    targets: Vec<Target>,
}

impl UdpForwarder {
    /// Binds a fresh ephemeral outbound socket — forwarding never reuses the
    /// ingress listener's bound socket, so a forwarder failure can never
    /// interfere with receiving telemetry.
    pub async fn bind(endpoints: impl IntoIterator<Item = SocketAddr>) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        let targets = endpoints
            .into_iter()
            .map(|addr| Target {
                addr,
                send_errors: AtomicU64::new(0),
            })
            .collect();
        Ok(Self { socket, targets })
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Tees `payload` to every configured endpoint. Each send is awaited in
    /// turn (UDP sends do not block on acknowledgement) so the caller
    /// deciding how this composes with the rest of the ingress path stays
    /// simple; a failing send is logged and counted, the remaining
    /// endpoints are still attempted.
    pub async fn forward(&self, payload: &[u8]) {
        for target in &self.targets {
            if let Err(error) = self.socket.send_to(payload, target.addr).await {
                target.send_errors.fetch_add(1, Ordering::Relaxed);
                warn!(endpoint = %target.addr, %error, "udp forward failed");
            }
        }
    }

    /// Snapshot of each endpoint's cumulative send-error count, in
    /// configuration order.
    pub fn error_counts(&self) -> Vec<(SocketAddr, u64)> {
        self.targets
            .iter()
            .map(|target| (target.addr, target.send_errors.load(Ordering::Relaxed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UdpSocket as TestSocket;

    async fn bound_local() -> TestSocket {
        TestSocket::bind(("127.0.0.1", 0))
            .await
            .expect("can bind a loopback test socket")
    }

    #[tokio::test]
    async fn forwards_to_every_configured_endpoint() {
        let receiver_a = bound_local().await;
        let receiver_b = bound_local().await;
        let addr_a = receiver_a.local_addr().expect("bound address");
        let addr_b = receiver_b.local_addr().expect("bound address");

        let forwarder = UdpForwarder::bind([addr_a, addr_b])
            .await
            .expect("forwarder binds");
        forwarder.forward(b"telemetry-packet").await;

        let mut buf = [0u8; 32];
        let (len_a, _) = receiver_a.recv_from(&mut buf).await.expect("a receives");
        assert_eq!(&buf[..len_a], b"telemetry-packet");

        let (len_b, _) = receiver_b.recv_from(&mut buf).await.expect("b receives");
        assert_eq!(&buf[..len_b], b"telemetry-packet");
    }

    #[tokio::test]
    async fn a_failed_send_is_counted_without_affecting_other_targets() {
        let receiver = bound_local().await;
        let good_addr = receiver.local_addr().expect("bound address");

        let forwarder = UdpForwarder::bind([good_addr]).await.expect("binds");
        // A payload larger than the UDP datagram limit reliably fails to send
        // regardless of platform, without needing a second, unreachable host.
        let oversized = vec![0u8; 70_000];
        forwarder.forward(&oversized).await;

        let counts = forwarder.error_counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].0, good_addr);
        assert_eq!(counts[0].1, 1);
    }

    #[tokio::test]
    async fn with_no_configured_targets_forwarding_is_a_no_op() {
        let forwarder = UdpForwarder::bind(std::iter::empty()).await.expect("binds");
        assert_eq!(forwarder.target_count(), 0);
        forwarder.forward(b"anything").await;
    }
}
