//! Mock implementations for testing.
//!
//! This module provides mock implementations of the traits `pitwall-fanout`
//! and `pitwall-telemetry-core` expose at their seams, so crates further up
//! the stack (`pitwall-service`, its integration tests) can exercise the
//! bus and the ingress loop without a live `RaceModel` or UDP socket.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use pitwall_fanout::SnapshotProvider;
use pitwall_schemas::{DriverDetail, RaceSnapshot, RaceStats};
use pitwall_telemetry_core::RawDatagramSource;

/// A `SnapshotProvider` returning fixed, caller-supplied values — the same
/// role a `StubProvider` plays inline in `pitwall-fanout`/`pitwall-ipc`'s
/// own unit tests, promoted here so other crates don't each redefine it.
pub struct MockSnapshotProvider {
    pub snapshot: RaceSnapshot,
    pub stats: RaceStats,
    pub detail: Option<DriverDetail>,
    pub player_car_index: Option<u8>,
}

impl SnapshotProvider for MockSnapshotProvider {
    fn race_snapshot(&self) -> RaceSnapshot {
        self.snapshot.clone()
    }

    fn race_stats(&self) -> RaceStats {
        self.stats.clone()
    }

    fn driver_detail(&self, car_index: u8) -> Option<DriverDetail> {
        self.detail
            .clone()
            .filter(|detail| detail.car_index == car_index)
    }

    fn player_car_index(&self) -> Option<u8> {
        self.player_car_index
    }
}

/// Replays a fixed sequence of raw datagrams, then reports end-of-stream —
/// the same pattern `pitwall-telemetry-core`'s own `ingress` tests use as a
/// private `FixedSource`, promoted here for `pitwalld`'s `--replay-server`
/// and end-to-end ingress tests.
pub struct ScriptedDatagramSource {
    frames: Mutex<VecDeque<Vec<u8>>>,
}

impl ScriptedDatagramSource {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        Self {
            frames: Mutex::new(frames.into()),
        }
    }
}

#[async_trait]
impl RawDatagramSource for ScriptedDatagramSource {
    async fn recv(&mut self) -> std::io::Result<Vec<u8>> {
        let mut guard = match self.frames.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.pop_front().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "scripted source exhausted")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_scripted_source_replays_frames_in_order_then_errors() {
        let mut source = ScriptedDatagramSource::new(vec![vec![1, 2, 3], vec![4, 5]]);
        assert_eq!(source.recv().await.unwrap(), vec![1, 2, 3]);
        assert_eq!(source.recv().await.unwrap(), vec![4, 5]);
        assert!(source.recv().await.is_err());
    }
}
