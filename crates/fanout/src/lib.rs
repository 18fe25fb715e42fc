//! Fan-out bus: pushes role-shaped race snapshots to connected frontends at
//! a fixed cadence and answers on-demand detail requests (SPEC_FULL.md
//! §4.5, §6).
//!
//! The bus owns one axum WebSocket endpoint. Every connection registers a
//! [`ClientRole`] on its first message, then receives that role's broadcast
//! (built once per tick by a [`broadcaster`] task and fanned out through the
//! [`registry::ClientRegistry`]) and may issue `race-info`/`driver-info`
//! requests serviced by a single [`request::RequestServicer`] worker so a
//! slow lookup never stalls the broadcast cadence.

pub mod broadcaster;
pub mod error;
pub mod message;
pub mod provider;
pub mod registry;
pub mod request;
pub mod websocket;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use pitwall_telemetry_core::ErrorTally;

pub use crate::broadcaster::BroadcasterHandle;
pub use crate::error::FanoutError;
pub use crate::message::{ClientMessage, ClientRole, ServerMessage};
pub use crate::provider::SnapshotProvider;
pub use crate::registry::ClientRegistry;
pub use crate::request::{DEFAULT_REQUEST_TIMEOUT, RequestServicer};

/// Cadence and timeout knobs, sourced from the CLI/config layer
/// (`--refresh-interval`, SPEC_FULL.md §6).
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub broadcast_interval: Duration,
    pub request_timeout: Duration,
    /// Per-role cadence overrides (SPEC_FULL.md §4.8's
    /// `role_cadence_overrides`), e.g. slowing `eng-view` without touching
    /// `race-table`'s default. A role absent here ticks at
    /// `broadcast_interval`.
    pub role_intervals: HashMap<ClientRole, Duration>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            broadcast_interval: Duration::from_millis(200),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            role_intervals: HashMap::new(),
        }
    }
}

/// Owns the registry, the per-role broadcaster tasks, and the request
/// servicer; `router()` returns the axum sub-router to mount at the
/// websocket path the service layer picks.
pub struct FanoutBus {
    registry: Arc<ClientRegistry>,
    requests: RequestServicer,
    slow_clients: Arc<ErrorTally<ClientRole>>,
    _broadcasters: Vec<BroadcasterHandle>,
}

impl FanoutBus {
    pub fn start(provider: Arc<dyn SnapshotProvider>, config: BusConfig) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let broadcasters = broadcaster::spawn_all(
            Arc::clone(&registry),
            Arc::clone(&provider),
            config.broadcast_interval,
            &config.role_intervals,
        );
        let requests = RequestServicer::spawn(provider, config.request_timeout);
        Self {
            registry,
            requests,
            slow_clients: Arc::new(ErrorTally::new()),
            _broadcasters: broadcasters,
        }
    }

    pub fn client_registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// The same `RequestServicer` handle backing this bus's WebSocket
    /// connections, for a second front (`pitwall-ipc`) to share rather than
    /// spawn its own worker against a second `SnapshotProvider` clone.
    pub fn request_servicer(&self) -> RequestServicer {
        self.requests.clone()
    }

    /// Per-role counts of clients dropped for repeated slow writes
    /// (SPEC_FULL.md §4.11, §7 edge case 6), for the observability tick.
    pub fn slow_client_counts(&self) -> Vec<(ClientRole, u64)> {
        self.slow_clients.snapshot()
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            registry: Arc::clone(&self.registry),
            requests: self.requests.clone(),
            slow_clients: Arc::clone(&self.slow_clients),
        };
        Router::new().route("/ws", get(upgrade)).with_state(state)
    }
}

#[derive(Clone)]
struct AppState {
    registry: Arc<ClientRegistry>,
    requests: RequestServicer,
    slow_clients: Arc<ErrorTally<ClientRole>>,
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| {
        let connection = websocket::Connection {
            registry: state.registry,
            requests: state.requests,
            slow_clients: state.slow_clients,
        };
        connection.run(socket)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_schemas::{
        CarStatusSnapshot, CollisionRecord, CompoundRecord, DamageSnapshot, DriverDetail,
        GameYear, LapRecord, LapSectorRecords, RaceSnapshot, RaceStats, SafetyCarState, Session,
        SessionType, TyreCompound,
    };

    struct StubProvider;

    impl SnapshotProvider for StubProvider {
        fn race_snapshot(&self) -> RaceSnapshot {
            RaceSnapshot {
                session: Session {
                    session_uid: 42,
                    game_year: GameYear::F1_25,
                    session_type: SessionType::Race,
                    track_id: 0,
                    total_laps: 50,
                    session_time_sec: 0.0,
                    safety_car_state: SafetyCarState::None,
                    pit_speed_limit_kmph: 80,
                    air_temp_c: 25,
                    track_temp_c: 30,
                    weather_forecast: Vec::new(),
                },
                participants: Vec::new(),
                sequence: 1,
            }
        }

        fn race_stats(&self) -> RaceStats {
            RaceStats {
                records: LapSectorRecords::default(),
                compound_records: vec![CompoundRecord::blank(TyreCompound::Medium)],
                custom_markers: Vec::new(),
            }
        }

        fn driver_detail(&self, car_index: u8) -> Option<DriverDetail> {
            (car_index == 0).then(|| DriverDetail {
                car_index: 0,
                lap_history: Vec::new(),
                current_lap: LapRecord {
                    lap_number: 1,
                    lap_time_ms: 0,
                    sector1_ms: 0,
                    sector2_ms: 0,
                    sector3_ms: 0,
                    valid: true,
                    tyre_set_index: 0,
                    top_speed_kmph: 0.0,
                    sector_status: Default::default(),
                },
                stints: Vec::new(),
                tyre_sets: Vec::new(),
                damage: DamageSnapshot::default(),
                car_status: CarStatusSnapshot::builder().build(),
                warnings: Vec::new(),
                collisions: Vec::<CollisionRecord>::new(),
                analytics: Default::default(),
            })
        }

        fn player_car_index(&self) -> Option<u8> {
            Some(0)
        }
    }

    #[tokio::test]
    async fn starting_the_bus_registers_no_clients_up_front() {
        let bus = FanoutBus::start(Arc::new(StubProvider), BusConfig::default());
        assert_eq!(bus.client_registry().client_count().await, 0);
    }

    #[tokio::test]
    async fn client_registry_reflects_manual_registrations() {
        let bus = FanoutBus::start(Arc::new(StubProvider), BusConfig::default());
        let registry = bus.client_registry();
        let (id, _channels) = registry.register(ClientRole::RaceTable).await;
        assert_eq!(registry.client_count().await, 1);
        registry.unregister(id).await;
        assert_eq!(registry.client_count().await, 0);
    }
}
