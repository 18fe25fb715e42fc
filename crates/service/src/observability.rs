//! Periodic counter logging in place of a metrics-scrape endpoint
//! (SPEC_FULL.md §7): a single tick task reads every error/drop counter the
//! rest of the daemon exposes and logs them as one structured `tracing`
//! event, rather than polling anything or exposing a Prometheus-style pull
//! surface the spec never names.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pitwall_fanout::FanoutBus;
use pitwall_forwarder::UdpForwarder;
use pitwall_race_model::RaceModel;
use pitwall_telemetry_core::ingress::DecodeErrorKind;
use pitwall_telemetry_core::{ConnectionHealth, ErrorTally, PacketQueue};
use tokio::sync::watch;
use tracing::info;

use crate::daemon::ApplyErrorKind;

/// How often the counter tick fires.
const TICK_INTERVAL: Duration = Duration::from_secs(10);

pub struct ObservabilityTick {
    model: Arc<RaceModel>,
    queue: Arc<PacketQueue>,
    decode_errors: Arc<ErrorTally<DecodeErrorKind>>,
    apply_errors: Arc<ErrorTally<ApplyErrorKind>>,
    connection_health: Arc<Mutex<ConnectionHealth>>,
    bus: Arc<FanoutBus>,
    forwarder: Option<Arc<UdpForwarder>>,
}

impl ObservabilityTick {
    pub fn new(
        model: Arc<RaceModel>,
        queue: Arc<PacketQueue>,
        decode_errors: Arc<ErrorTally<DecodeErrorKind>>,
        apply_errors: Arc<ErrorTally<ApplyErrorKind>>,
        connection_health: Arc<Mutex<ConnectionHealth>>,
        bus: Arc<FanoutBus>,
        forwarder: Option<Arc<UdpForwarder>>,
    ) -> Self {
        Self { model, queue, decode_errors, apply_errors, connection_health, bus, forwarder }
    }

    /// Ticks until `shutdown` reports `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = ticker.tick() => self.log_tick(),
            }
        }
    }

    fn log_tick(&self) {
        let snapshot = self.model.snapshot();
        let connection_state = match self.connection_health.lock() {
            Ok(guard) => guard.state(),
            Err(poisoned) => poisoned.into_inner().state(),
        };
        let slow_clients: u64 = self.bus.slow_client_counts().iter().map(|(_, count)| count).sum();
        let forwarder_errors: u64 = self
            .forwarder
            .as_ref()
            .map(|forwarder| forwarder.error_counts().iter().map(|(_, count)| count).sum())
            .unwrap_or(0);

        info!(
            session_uid = snapshot.session.session_uid,
            participants = snapshot.participants.len(),
            connection_state = ?connection_state,
            queue_len = self.queue.len(),
            dropped_physics = self.queue.dropped_physics_count(),
            state_overflow = self.queue.state_overflow_count(),
            decode_errors = self.decode_errors.total(),
            apply_errors = self.apply_errors.total(),
            slow_clients,
            forwarder_errors,
            "telemetry daemon counters",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_fanout::{BusConfig, SnapshotProvider};
    use pitwall_schemas::{
        DriverDetail, GameYear, LapSectorRecords, RaceSnapshot, RaceStats, Session,
    };

    struct StubProvider;

    impl SnapshotProvider for StubProvider {
        fn race_snapshot(&self) -> RaceSnapshot {
            RaceSnapshot {
                session: Session::seed(1, GameYear::F1_25),
                participants: Vec::new(),
                sequence: 0,
            }
        }

        fn race_stats(&self) -> RaceStats {
            RaceStats {
                records: LapSectorRecords::default(),
                compound_records: Vec::new(),
                custom_markers: Vec::new(),
            }
        }

        fn driver_detail(&self, _car_index: u8) -> Option<DriverDetail> {
            None
        }

        fn player_car_index(&self) -> Option<u8> {
            None
        }
    }

    #[tokio::test]
    async fn a_tick_does_not_panic_with_no_traffic_yet() {
        let model = Arc::new(RaceModel::new());
        let queue = Arc::new(PacketQueue::new(8));
        let bus = Arc::new(FanoutBus::start(Arc::new(StubProvider), BusConfig::default()));
        let tick = ObservabilityTick::new(
            model,
            queue,
            Arc::new(ErrorTally::new()),
            Arc::new(ErrorTally::new()),
            Arc::new(Mutex::new(ConnectionHealth::default())),
            bus,
            None,
        );
        tick.log_tick();
    }

    #[tokio::test]
    async fn run_stops_cleanly_on_shutdown_signal() {
        let model = Arc::new(RaceModel::new());
        let queue = Arc::new(PacketQueue::new(8));
        let bus = Arc::new(FanoutBus::start(Arc::new(StubProvider), BusConfig::default()));
        let tick = ObservabilityTick::new(
            model,
            queue,
            Arc::new(ErrorTally::new()),
            Arc::new(ErrorTally::new()),
            Arc::new(Mutex::new(ConnectionHealth::default())),
            bus,
            None,
        );
        let (tx, rx) = watch::channel(false);
        let run = tick.run(rx);
        tokio::pin!(run);
        tx.send(true).expect("receiver still alive");
        tokio::time::timeout(Duration::from_millis(200), run)
            .await
            .expect("shutdown observed promptly");
    }
}
