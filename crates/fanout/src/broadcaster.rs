//! Per-role cadence tasks (SPEC_FULL.md §4.5, §6 `--refresh-interval`).
//!
//! Each role gets one ticking task that builds the role's payload once per
//! tick and hands it to the registry, which fans it out to every subscriber
//! of that role. `eng-view` reuses the `race-table` payload shape (the spec
//! does not define a distinct one for it, and the richest view is the safe
//! default — see DESIGN.md); `hud-ipc` reuses `player-stream-overlay`'s.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::message::{ClientRole, ServerMessage};
use crate::provider::SnapshotProvider;
use crate::registry::ClientRegistry;

pub struct BroadcasterHandle {
    task: tokio::task::JoinHandle<()>,
}

impl BroadcasterHandle {
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Spawns one cadence task per role in [`ClientRole::ALL`]. A role present
/// in `role_intervals` ticks at its override; every other role ticks at
/// `default_interval`.
pub fn spawn_all(
    registry: Arc<ClientRegistry>,
    provider: Arc<dyn SnapshotProvider>,
    default_interval: Duration,
    role_intervals: &HashMap<ClientRole, Duration>,
) -> Vec<BroadcasterHandle> {
    ClientRole::ALL
        .into_iter()
        .map(|role| {
            let interval = role_intervals.get(&role).copied().unwrap_or(default_interval);
            spawn_role(role, Arc::clone(&registry), Arc::clone(&provider), interval)
        })
        .collect()
}

fn spawn_role(
    role: ClientRole,
    registry: Arc<ClientRegistry>,
    provider: Arc<dyn SnapshotProvider>,
    interval: Duration,
) -> BroadcasterHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut sequence: u64 = 0;
        loop {
            ticker.tick().await;
            if registry.client_count().await == 0 {
                trace!(?role, "no subscribers, skipping tick");
                continue;
            }
            sequence += 1;
            let Some(message) = build_payload(role, sequence, provider.as_ref()) else {
                trace!(?role, "no payload available this tick");
                continue;
            };
            registry.publish(role, Arc::new(message)).await;
        }
    });
    debug!(?role, ?interval, "broadcaster task started");
    BroadcasterHandle { task }
}

fn build_payload(
    role: ClientRole,
    sequence: u64,
    provider: &dyn SnapshotProvider,
) -> Option<ServerMessage> {
    match role {
        ClientRole::RaceTable | ClientRole::EngView => {
            let snapshot = provider.race_snapshot();
            let session_uid = snapshot.session.session_uid;
            let stats = provider.race_stats();
            Some(ServerMessage::RaceTableUpdate {
                sequence,
                session_uid,
                snapshot,
                stats,
            })
        }
        ClientRole::PlayerStreamOverlay | ClientRole::HudIpc => {
            let car_index = provider.player_car_index()?;
            let detail = provider.driver_detail(car_index)?;
            let session_uid = provider.race_snapshot().session.session_uid;
            Some(ServerMessage::PlayerOverlayUpdate {
                sequence,
                session_uid,
                detail,
            })
        }
    }
}

impl Drop for BroadcasterHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
