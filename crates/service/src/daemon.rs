//! Wires the Ingress Listener, Race Model, derived analytics, Fan-out Bus,
//! IPC surface, UDP Forwarders, and session recorder into one process
//! (SPEC_FULL.md §2, §5, §9).
//!
//! `Daemon::run` owns exactly the long-lived tasks §5 describes: the
//! ingress receive loop, this module's decode/apply loop (the Race Model's
//! sole writer), the fan-out bus's per-role broadcasters and request
//! servicer, the IPC surface's accept loop, and the forwarder/capture tees.
//! Everything is built from one `AppConfig` value passed in by `main`;
//! nothing here reads a process-wide global (§9's "inject a config value
//! into each task's constructor").

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pitwall_codec::Packet;
use pitwall_config::{AppConfig, PacketCaptureMode};
use pitwall_fanout::{BusConfig, ClientRole, FanoutBus, SnapshotProvider};
use pitwall_forwarder::UdpForwarder;
use pitwall_ipc::{IpcConfig, IpcServer, TransportType};
use pitwall_race_model::RaceModel;
use pitwall_recorder::{CaptureWriter, SessionArchive, archive_filename};
use pitwall_telemetry_core::{ConnectionHealth, ErrorTally, IngressConfig, IngressListener};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::error::DaemonError;
use crate::observability::ObservabilityTick;
use crate::provider::LiveSnapshotProvider;
use crate::replay::TcpReplaySource;

/// How long task shutdown is allowed to take before `run` gives up waiting
/// (SPEC_FULL.md §5: "tasks must drain in <=500 ms on shutdown").
const SHUTDOWN_DRAIN_BUDGET: Duration = Duration::from_millis(500);

/// A `Copy`-friendly discriminant for [`pitwall_race_model::ApplyError`],
/// the same reason `pitwall_telemetry_core::ingress::DecodeErrorKind`
/// exists: the error type itself carries per-instance data that would make
/// a poor tally key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ApplyErrorKind {
    CarIndexOutOfRange,
    SessionMismatch,
    StaleFrame,
}

impl From<&pitwall_race_model::ApplyError> for ApplyErrorKind {
    fn from(error: &pitwall_race_model::ApplyError) -> Self {
        use pitwall_race_model::ApplyError;
        match error {
            ApplyError::CarIndexOutOfRange(_) => Self::CarIndexOutOfRange,
            ApplyError::SessionMismatch { .. } => Self::SessionMismatch,
            ApplyError::StaleFrame { .. } => Self::StaleFrame,
        }
    }
}

pub struct Daemon {
    config: AppConfig,
}

impl Daemon {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Runs until `shutdown` reports `true` or a fatal bind error occurs.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), DaemonError> {
        let config = self.config;

        let model = Arc::new(RaceModel::with_custom_action_code(config.udp_custom_action_code));
        let ingress = IngressListener::new(&IngressConfig {
            bind_addr: ([0, 0, 0, 0], config.telemetry_port).into(),
            ..IngressConfig::default()
        });

        let bind_addr: SocketAddr = ([0, 0, 0, 0], config.telemetry_port).into();
        let source = if config.replay_server {
            info!(%bind_addr, "starting replay server instead of a live udp socket");
            Box::new(TcpReplaySource::accept(bind_addr).await.map_err(|source| {
                DaemonError::Bind { transport: format!("tcp replay {bind_addr}"), source }
            })?) as Box<dyn pitwall_telemetry_core::RawDatagramSource>
        } else {
            IngressListener::bind(&IngressConfig { bind_addr, ..IngressConfig::default() })
                .await
                .map_err(|source| DaemonError::Bind { transport: format!("udp {bind_addr}"), source })?
        };

        // Handles pulled off `ingress` before it is moved into its own task.
        let queue = ingress.queue();
        let decode_errors = ingress.decode_error_tally();
        let forwarder_raw_rx = ingress.subscribe_raw();
        let capture_raw_rx = ingress.subscribe_raw();
        let connection_health = Arc::new(std::sync::Mutex::new(ConnectionHealth::default()));
        let apply_errors: Arc<ErrorTally<ApplyErrorKind>> = Arc::new(ErrorTally::new());

        let mut tasks = Vec::new();
        let mut forwarder_handle = None;

        if !config.forwarder_endpoints.is_empty() {
            let forwarder = Arc::new(UdpForwarder::bind(config.forwarder_endpoints.clone()).await.map_err(
                |source| DaemonError::Bind { transport: "udp forwarder outbound socket".to_string(), source },
            )?);
            forwarder_handle = Some(Arc::clone(&forwarder));
            tasks.push(tokio::spawn(forward_loop(forwarder, forwarder_raw_rx, shutdown.clone())));
        }

        if !matches!(config.packet_capture_mode, PacketCaptureMode::Disabled) {
            let path = PathBuf::from(format!("capture-{}.bin", chrono_timestamp_tag()));
            let writer = CaptureWriter::create(&path)
                .map_err(|source| DaemonError::Bind { transport: format!("packet capture file {path:?}"), source })?;
            tasks.push(tokio::spawn(capture_loop(writer, capture_raw_rx, shutdown.clone())));
        }

        let provider = Arc::new(LiveSnapshotProvider::new(Arc::clone(&model), config.num_adjacent_cars));

        tasks.push(tokio::spawn(ingress_loop(ingress, source, Arc::clone(&connection_health), shutdown.clone())));

        let observability_queue = Arc::clone(&queue);
        tasks.push(tokio::spawn(apply_loop(
            Arc::clone(&model),
            Arc::clone(&provider),
            queue,
            Arc::clone(&apply_errors),
            config.post_race_data_autosave,
            shutdown.clone(),
        )));

        let mut role_intervals = std::collections::HashMap::new();
        for override_ in &config.role_cadence_overrides {
            match ClientRole::parse_config_key(&override_.role) {
                Some(role) => {
                    role_intervals.insert(role, Duration::from_millis(override_.interval_ms));
                }
                None => warn!(role = %override_.role, "unrecognized role in role_cadence_overrides, ignoring"),
            }
        }

        let bus = Arc::new(FanoutBus::start(
            Arc::clone(&provider) as Arc<dyn SnapshotProvider>,
            BusConfig {
                broadcast_interval: Duration::from_millis(config.refresh_interval_ms),
                request_timeout: pitwall_fanout::DEFAULT_REQUEST_TIMEOUT,
                role_intervals,
            },
        ));

        let ipc_server = IpcServer::new(bus.client_registry(), bus.request_servicer());
        let ipc_config = IpcConfig {
            transport: TransportType::platform_default(),
            request_timeout: pitwall_fanout::DEFAULT_REQUEST_TIMEOUT,
        };
        tasks.push(tokio::spawn(async move {
            if let Err(error) = ipc_server.serve(ipc_config).await {
                error!(%error, "ipc surface stopped");
            }
        }));

        let http_addr: SocketAddr = ([0, 0, 0, 0], config.server_port).into();
        let listener = tokio::net::TcpListener::bind(http_addr)
            .await
            .map_err(|source| DaemonError::Bind { transport: format!("http/ws {http_addr}"), source })?;
        info!(%http_addr, "fan-out bus listening");
        let router = bus.router();
        let mut server_shutdown = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.changed().await;
                });
            if let Err(error) = serve.await {
                error!(%error, "http/ws server stopped");
            }
        }));

        let observability = ObservabilityTick::new(
            Arc::clone(&model),
            observability_queue,
            decode_errors,
            Arc::clone(&apply_errors),
            Arc::clone(&connection_health),
            Arc::clone(&bus),
            forwarder_handle,
        );
        tasks.push(tokio::spawn(observability.run(shutdown.clone())));

        let mut shutdown = shutdown;
        let _ = shutdown.changed().await;
        info!("shutdown signal received, draining tasks");

        if config.post_race_data_autosave {
            archive_on_shutdown(&model);
        }

        let drain = async {
            for task in tasks {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_DRAIN_BUDGET, drain).await.is_err() {
            warn!("tasks did not drain within the shutdown budget");
        }

        debug!("daemon stopped");
        Ok(())
    }
}

async fn ingress_loop(
    ingress: IngressListener,
    source: Box<dyn pitwall_telemetry_core::RawDatagramSource>,
    health: Arc<std::sync::Mutex<ConnectionHealth>>,
    shutdown: watch::Receiver<bool>,
) {
    ingress.run(source, &health, shutdown).await;
}

async fn forward_loop(
    forwarder: Arc<UdpForwarder>,
    mut raw_rx: broadcast::Receiver<Arc<[u8]>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
            received = raw_rx.recv() => {
                match received {
                    Ok(bytes) => forwarder.forward(&bytes).await,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        }
    }
}

async fn capture_loop(
    mut writer: CaptureWriter,
    mut raw_rx: broadcast::Receiver<Arc<[u8]>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    let _ = writer.flush();
                    return;
                }
            }
            received = raw_rx.recv() => {
                match received {
                    Ok(bytes) => {
                        if let Err(error) = writer.append(&bytes) {
                            warn!(%error, "packet capture write failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = writer.flush();
                        return;
                    }
                }
            }
        }
    }
}

async fn apply_loop(
    model: Arc<RaceModel>,
    provider: Arc<LiveSnapshotProvider>,
    queue: Arc<pitwall_telemetry_core::PacketQueue>,
    apply_errors: Arc<ErrorTally<ApplyErrorKind>>,
    post_race_autosave: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let packet = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
                continue;
            }
            packet = queue.pop() => packet,
        };
        apply_one(&model, &provider, packet, &apply_errors, post_race_autosave);
    }
}

/// Applies one decoded packet to the model, archiving the outgoing session
/// first if this packet is the one that triggers a session-boundary swap
/// (SPEC_FULL.md §4.3's session-swap algorithm: the archive must be taken
/// *before* `RaceModel::apply` resets the in-memory state for the new
/// session).
fn apply_one(
    model: &RaceModel,
    provider: &LiveSnapshotProvider,
    packet: Packet,
    apply_errors: &ErrorTally<ApplyErrorKind>,
    post_race_autosave: bool,
) {
    if post_race_autosave {
        if let Packet::Session(session_packet) = &packet {
            let current = model.snapshot();
            let is_seeded = current.session.session_uid != 0 || !current.participants.is_empty();
            if is_seeded && current.session.session_uid != session_packet.session.session_uid {
                let archive = SessionArchive::capture(model);
                let path = archive_filename(&current.session, unix_timestamp_secs());
                match archive.write(&path) {
                    Ok(()) => info!(?path, "session archived on session-boundary swap"),
                    Err(error) => warn!(%error, ?path, "session archive write failed"),
                }
            }
        }
    }

    match model.apply(&packet) {
        Ok(()) => {
            if let Packet::LapData(lap_data) = &packet {
                provider.record_lap_data(lap_data);
            }
        }
        Err(error) => {
            apply_errors.record(ApplyErrorKind::from(&error));
            debug!(%error, "dropping packet that violates a race-model invariant");
        }
    }
}

/// Archives the current session on process shutdown, mirroring `apply_one`'s
/// session-boundary-swap archive (SPEC_FULL.md §4.10: `--post-race-data-autosave`
/// fires "on session end (session-UID swap or process shutdown)") — without
/// this, stopping the daemon normally loses whatever session was still live.
fn archive_on_shutdown(model: &RaceModel) {
    let current = model.snapshot();
    let is_seeded = current.session.session_uid != 0 || !current.participants.is_empty();
    if !is_seeded {
        return;
    }
    let archive = SessionArchive::capture(model);
    let path = archive_filename(&current.session, unix_timestamp_secs());
    match archive.write(&path) {
        Ok(()) => info!(?path, "session archived on process shutdown"),
        Err(error) => warn!(%error, ?path, "session archive write failed"),
    }
}

/// Wall-clock seconds since the Unix epoch, used only for archive filenames
/// and never fed back into any deterministic model computation.
fn unix_timestamp_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}

/// A filesystem-safe timestamp tag for the packet-capture filename; distinct
/// from `unix_timestamp_secs` (archive filenames embed the raw integer,
/// capture filenames want something human-sortable on disk).
fn chrono_timestamp_tag() -> String {
    chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string()
}
