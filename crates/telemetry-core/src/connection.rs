//! Upstream connection-health tracking (SPEC_FULL.md §4.2): the listener has
//! no handshake with the game, so "are we still receiving telemetry" can
//! only ever be inferred from the gap since the last datagram. Three states
//! mirror the donor workspace's own game-connection disconnection tracker,
//! generalized from a hardware-device heartbeat to a UDP datagram arrival
//! clock.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// A datagram has arrived within the stale threshold.
    Connected,
    /// No datagram for longer than the stale threshold, but not yet the
    /// disconnect threshold — the game may just be between sessions.
    Stale,
    /// No datagram for longer than the disconnect threshold.
    Disconnected,
}

/// Tracks time-since-last-datagram and exposes the derived state, without
/// polling the OS process list (SPEC_FULL.md §4.2).
pub struct ConnectionHealth {
    last_datagram: Option<Instant>,
    stale_after: Duration,
    disconnected_after: Duration,
}

impl ConnectionHealth {
    pub fn new(stale_after: Duration, disconnected_after: Duration) -> Self {
        Self {
            last_datagram: None,
            stale_after,
            disconnected_after,
        }
    }

    /// Call on every datagram the listener receives, regardless of whether
    /// it later fails to decode — a malformed datagram still proves the
    /// game is sending something.
    pub fn record_datagram(&mut self) {
        self.last_datagram = Some(Instant::now());
    }

    pub fn state(&self) -> ConnectionState {
        let Some(last) = self.last_datagram else {
            return ConnectionState::Disconnected;
        };
        let elapsed = last.elapsed();
        if elapsed >= self.disconnected_after {
            ConnectionState::Disconnected
        } else if elapsed >= self.stale_after {
            ConnectionState::Stale
        } else {
            ConnectionState::Connected
        }
    }
}

impl Default for ConnectionHealth {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(10))
    }
}
