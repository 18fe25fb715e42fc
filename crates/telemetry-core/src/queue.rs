//! Bounded decoded-packet queue with the drop policy SPEC_FULL.md §4.2
//! requires: when full, the oldest physics-class packet (motion, car
//! telemetry, motion-ex) is evicted first; state-class packets (session, lap
//! data, event, final classification, tyre sets, ...) are never dropped.
//!
//! `tokio::sync::mpsc` does not let a producer reach back into the channel
//! and evict a specific buffered item, so the queue is a small
//! `Mutex<VecDeque<_>>` plus a `Notify` instead — the consumer side behaves
//! like an async queue (`pop` awaits when empty), the producer side gets the
//! eviction policy it needs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use pitwall_codec::Packet;
use tokio::sync::Notify;

/// Coarse classification used only to decide what gets dropped under
/// backpressure (SPEC_FULL.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketClass {
    /// High-rate, re-derivable every tick: safe to drop under pressure.
    Physics,
    /// Everything else: session, lap, event, participants, damage,
    /// classification, tyre sets, ... never dropped.
    State,
}

impl PacketClass {
    pub fn of(packet: &Packet) -> Self {
        match packet {
            Packet::Motion(_) | Packet::MotionEx(_) | Packet::CarTelemetry(_) => {
                PacketClass::Physics
            }
            _ => PacketClass::State,
        }
    }
}

struct Inner {
    items: VecDeque<Packet>,
}

/// The ingress → decode/apply handoff queue.
pub struct PacketQueue {
    capacity: usize,
    inner: Mutex<Inner>,
    notify: Notify,
    dropped_physics: AtomicU64,
    overflowed_state: AtomicU64,
}

impl PacketQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity.max(1)),
            }),
            notify: Notify::new(),
            dropped_physics: AtomicU64::new(0),
            overflowed_state: AtomicU64::new(0),
        }
    }

    /// Push one decoded packet. Never blocks: if the queue is at capacity,
    /// the oldest physics-class entry is evicted to make room. If every
    /// buffered entry is state-class (the never-drop class), the queue is
    /// allowed to grow past `capacity` rather than silently losing a
    /// state-class packet — this is logged by the caller via
    /// `state_overflow_count`, since a queue that can never drain fast
    /// enough to stay within capacity on state traffic alone is a symptom
    /// worth surfacing, not a case this policy is allowed to paper over.
    pub fn push(&self, packet: Packet) {
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.items.len() >= self.capacity {
            if let Some(index) = guard
                .items
                .iter()
                .position(|p| PacketClass::of(p) == PacketClass::Physics)
            {
                guard.items.remove(index);
                self.dropped_physics.fetch_add(1, Ordering::Relaxed);
            } else {
                self.overflowed_state.fetch_add(1, Ordering::Relaxed);
            }
        }
        guard.items.push_back(packet);
        drop(guard);
        self.notify.notify_one();
    }

    /// Awaits the next packet in arrival order.
    pub async fn pop(&self) -> Packet {
        loop {
            {
                let mut guard = match self.inner.lock() {
                    Ok(g) => g,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if let Some(packet) = guard.items.pop_front() {
                    return packet;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn dropped_physics_count(&self) -> u64 {
        self.dropped_physics.load(Ordering::Relaxed)
    }

    pub fn state_overflow_count(&self) -> u64 {
        self.overflowed_state.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(g) => g.items.len(),
            Err(poisoned) => poisoned.into_inner().items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_codec::header::PacketHeader;
    use pitwall_codec::motion::{CarMotionData, MotionPacket};
    use pitwall_codec::session::SessionPacket;
    use pitwall_schemas::{GameYear, Session};

    fn header(packet_id_raw: u8) -> PacketHeader {
        PacketHeader {
            packet_format: 2025,
            game_year: GameYear::F1_25,
            game_major_version: 1,
            game_minor_version: 0,
            packet_version: 1,
            packet_id_raw,
            session_uid: 1,
            session_time_sec: 0.0,
            frame_id: 0,
            overall_frame_identifier: 0,
            player_car_index: 0,
            secondary_player_car_index: 255,
        }
    }

    fn physics_packet() -> Packet {
        Packet::Motion(MotionPacket {
            header: header(0),
            cars: vec![CarMotionData::default(); 22],
        })
    }

    fn state_packet() -> Packet {
        Packet::Session(SessionPacket {
            header: header(1),
            session: Session::seed(1, GameYear::F1_25),
        })
    }

    #[tokio::test]
    async fn overflow_evicts_the_oldest_physics_packet_first() {
        let queue = PacketQueue::new(2);
        queue.push(physics_packet());
        queue.push(state_packet());
        queue.push(state_packet());
        assert_eq!(queue.dropped_physics_count(), 1);
        assert_eq!(queue.len(), 2);
        let first = queue.pop().await;
        assert!(matches!(first, Packet::Session(_)));
    }

    #[tokio::test]
    async fn state_packets_are_never_evicted() {
        let queue = PacketQueue::new(1);
        queue.push(state_packet());
        queue.push(state_packet());
        assert_eq!(queue.state_overflow_count(), 1);
        assert_eq!(queue.dropped_physics_count(), 0);
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn pop_preserves_arrival_order() {
        let queue = PacketQueue::new(8);
        queue.push(state_packet());
        queue.push(physics_packet());
        assert!(matches!(queue.pop().await, Packet::Session(_)));
        assert!(matches!(queue.pop().await, Packet::Motion(_)));
    }
}
