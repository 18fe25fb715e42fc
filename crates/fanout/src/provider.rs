//! The seam between the fan-out bus and the race-state/analytics world
//! (SPEC_FULL.md §4.5). Keeping it a trait, rather than a direct dependency
//! on `pitwall-race-model`/`pitwall-analytics`, mirrors the same decoupling
//! `pitwall-analytics` itself already applies to `pitwall-race-model`: the
//! bus only needs role-shaped snapshots, never a lock or a decoder.

use pitwall_schemas::{DriverDetail, RaceSnapshot, RaceStats};

/// Implemented by whatever owns the live race state (the `service` crate, in
/// the end) to hand the bus read-only, already-cloned views on demand.
pub trait SnapshotProvider: Send + Sync {
    /// Full grid snapshot for the `race-table` role.
    fn race_snapshot(&self) -> RaceSnapshot;

    /// Session-wide records/markers, also served on demand by `race-info`.
    fn race_stats(&self) -> RaceStats;

    /// Per-driver detail, also served on demand by `driver-info`.
    fn driver_detail(&self, car_index: u8) -> Option<DriverDetail>;

    /// The locally controlled car, if the session has one (spectating or a
    /// pre-session lobby has none). Drives the `player-stream-overlay` and
    /// `hud-ipc` roles, both of which track the player's own car.
    fn player_car_index(&self) -> Option<u8>;
}
