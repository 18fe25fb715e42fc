//! Request/response correlation with a server-side timeout (SPEC_FULL.md
//! §4.5, §6): `race-info`/`driver-info` requests are served from a single
//! dedicated worker so a slow provider lookup can never stall a connection's
//! read loop, and a reply that doesn't arrive within the budget becomes a
//! `ServerMessage::Error{error: "timeout"}` carrying the original request id.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::message::ServerMessage;
use crate::provider::SnapshotProvider;

const SERVICE_QUEUE_DEPTH: usize = 64;

/// The default request budget named in SPEC_FULL.md §4.5.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub enum RequestKind {
    RaceInfo,
    DriverInfo(u8),
}

struct ServiceJob {
    request_id: String,
    kind: RequestKind,
    reply: oneshot::Sender<ServerMessage>,
}

#[derive(Clone)]
pub struct RequestServicer {
    jobs: mpsc::Sender<ServiceJob>,
    timeout: Duration,
}

impl RequestServicer {
    /// Spawns the worker task and returns a cheaply cloneable handle.
    pub fn spawn(provider: Arc<dyn SnapshotProvider>, timeout: Duration) -> Self {
        let (jobs_tx, mut jobs_rx) = mpsc::channel::<ServiceJob>(SERVICE_QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(job) = jobs_rx.recv().await {
                let response = match job.kind {
                    RequestKind::RaceInfo => ServerMessage::RaceInfoResponse {
                        request_id: job.request_id.clone(),
                        stats: provider.race_stats(),
                    },
                    RequestKind::DriverInfo(index) => ServerMessage::DriverInfoResponse {
                        request_id: job.request_id.clone(),
                        detail: provider.driver_detail(index),
                    },
                };
                if job.reply.send(response).is_err() {
                    warn!(request_id = %job.request_id, "requester gave up before the reply arrived");
                }
            }
        });
        Self {
            jobs: jobs_tx,
            timeout,
        }
    }

    /// Services one request, enforcing the timeout budget. Always resolves —
    /// a dropped worker or an expired budget both produce a timeout message
    /// rather than an error the caller has to match on separately.
    pub async fn service(&self, request_id: String, kind: RequestKind) -> ServerMessage {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = ServiceJob {
            request_id: request_id.clone(),
            kind,
            reply: reply_tx,
        };
        if self.jobs.send(job).await.is_err() {
            return ServerMessage::timeout(request_id);
        }
        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(message)) => message,
            _ => ServerMessage::timeout(request_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_schemas::{
        CarStatusSnapshot, CollisionRecord, CompoundRecord, DamageSnapshot, DriverDetail,
        LapRecord, LapSectorRecords, RaceSnapshot, RaceStats, Session, TyreCompound,
    };

    struct FakeProvider;

    impl SnapshotProvider for FakeProvider {
        fn race_snapshot(&self) -> RaceSnapshot {
            RaceSnapshot {
                session: Session {
                    session_uid: 1,
                    game_year: pitwall_schemas::GameYear::F1_25,
                    session_type: pitwall_schemas::SessionType::Race,
                    track_id: 0,
                    total_laps: 50,
                    session_time_sec: 0.0,
                    safety_car_state: pitwall_schemas::SafetyCarState::None,
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
    async fn race_info_resolves_with_the_provider_stats() {
        let servicer = RequestServicer::spawn(Arc::new(FakeProvider), Duration::from_secs(3));
        let response = servicer
            .service("r1".to_string(), RequestKind::RaceInfo)
            .await;
        match response {
            ServerMessage::RaceInfoResponse { request_id, .. } => assert_eq!(request_id, "r1"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn driver_info_for_an_unknown_index_resolves_to_none() {
        let servicer = RequestServicer::spawn(Arc::new(FakeProvider), Duration::from_secs(3));
        let response = servicer
            .service("r2".to_string(), RequestKind::DriverInfo(9))
            .await;
        match response {
            ServerMessage::DriverInfoResponse { request_id, detail } => {
                assert_eq!(request_id, "r2");
                assert!(detail.is_none());
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn an_unserviced_request_times_out_with_the_original_id() {
        let (jobs_tx, mut jobs_rx) = mpsc::channel::<ServiceJob>(1);
        // Never drain `jobs_rx`, so the job sits forever and the timeout fires.
        let servicer = RequestServicer {
            jobs: jobs_tx,
            timeout: Duration::from_millis(50),
        };
        let handle = tokio::spawn(async move {
            servicer
                .service("r3".to_string(), RequestKind::RaceInfo)
                .await
        });
        tokio::time::advance(Duration::from_millis(100)).await;
        let response = handle.await.expect("task completes");
        match response {
            ServerMessage::Error { request_id, error } => {
                assert_eq!(request_id.as_deref(), Some("r3"));
                assert_eq!(error, "timeout");
            }
            other => panic!("unexpected response: {other:?}"),
        }
        // Keep the receiver alive for the duration of the test so the send
        // above doesn't fail for the wrong reason (a closed channel).
        drop(jobs_rx);
    }
}
