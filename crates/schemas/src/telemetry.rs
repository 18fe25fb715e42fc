//! Canonical race-telemetry domain types.
//!
//! These are the types the race model hands out of `snapshot()`,
//! `driverDetail()`, and `raceStats()`, and the types the fan-out bus and IPC
//! surface serialize straight onto the wire. All of them derive
//! `Serialize`/`Deserialize` so the same struct is the in-memory
//! representation, the WebSocket payload, and (for the top-level snapshot)
//! the session-archive document.
//!
//! Every field that the game can fail to report, or that is meaningless
//! before the first packet of its kind arrives, is `#[serde(default)]` so
//! older/partial payloads still deserialize.

use serde::{Deserialize, Serialize};

/// Game title the packets were captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameYear {
    F1_23,
    F1_24,
    F1_25,
}

impl GameYear {
    /// Map a packet-format header value (e.g. `2023`, `2024`, `2025`) to a title.
    pub fn from_packet_format(format: u16) -> Option<Self> {
        match format {
            2023 => Some(Self::F1_23),
            2024 => Some(Self::F1_24),
            2025 => Some(Self::F1_25),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionType {
    #[default]
    Unknown,
    Practice1,
    Practice2,
    Practice3,
    PracticeShort,
    Qualifying1,
    Qualifying2,
    Qualifying3,
    QualifyingShort,
    OneShotQualifying,
    Race,
    Race2,
    Race3,
    TimeTrial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SafetyCarState {
    #[default]
    None,
    Full,
    Virtual,
    FormationLap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Weather {
    #[default]
    Clear,
    LightCloud,
    Overcast,
    LightRain,
    HeavyRain,
    Storm,
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TyreCompound {
    Soft,
    Medium,
    Hard,
    Inter,
    Wet,
    SuperSoft,
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ErsMode {
    #[default]
    None,
    Medium,
    Hotlap,
    Overtake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FuelMix {
    Lean,
    #[default]
    Standard,
    Rich,
    Max,
}

/// `{invalid, yellow, green (own best), purple (session best), N/A}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SectorStatus {
    #[default]
    NotAvailable,
    Invalid,
    Yellow,
    Green,
    Purple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResultStatus {
    #[default]
    Invalid,
    Inactive,
    Active,
    Finished,
    DidNotFinish,
    Disqualified,
    NotClassified,
    Retired,
}

/// Per-participant race state machine (SPEC_FULL.md §4.3).
///
/// `Racing` is the only non-terminal state; once a participant enters one of
/// the others, the race model stops applying lap updates to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ParticipantState {
    #[default]
    Racing,
    Pitting,
    Dnf,
    Dsq,
    Retired,
    Finished,
}

impl ParticipantState {
    /// Once in a terminal state, lap/stint updates are inhibited.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Racing | Self::Pitting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyKind {
    CornerCutting,
    TimePenalty,
    DriveThrough,
    StopGo,
    TotalWarnings,
}

/// Session-level state (SPEC_FULL.md §3 "Session").
///
/// Created on the first session packet observed for a session UID; replaced
/// wholesale (never mutated field-by-field across a UID change) when a new
/// UID is observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_uid: u64,
    pub game_year: GameYear,
    pub session_type: SessionType,
    pub track_id: i8,
    pub total_laps: u8,
    pub session_time_sec: f32,
    pub safety_car_state: SafetyCarState,
    pub pit_speed_limit_kmph: u8,
    pub air_temp_c: i8,
    pub track_temp_c: i8,
    #[serde(default)]
    pub weather_forecast: Vec<WeatherForecastSample>,
}

impl Session {
    /// Build the initial session record from the first session packet's
    /// header fields. Everything else accumulates as later fields arrive.
    pub fn seed(session_uid: u64, game_year: GameYear) -> Self {
        Self {
            session_uid,
            game_year,
            session_type: SessionType::default(),
            track_id: -1,
            total_laps: 0,
            session_time_sec: 0.0,
            safety_car_state: SafetyCarState::default(),
            pit_speed_limit_kmph: 0,
            air_temp_c: 0,
            track_temp_c: 0,
            weather_forecast: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecastSample {
    pub session_type: SessionType,
    pub time_offset_min: u8,
    pub weather: Weather,
    pub track_temp_c: i8,
    pub air_temp_c: i8,
    pub rain_probability_pct: u8,
}

/// One of the 22 car slots. Index is the stable, UDP-reported car index and
/// is immutable for the lifetime of a session UID (SPEC_FULL.md §3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub car_index: u8,
    pub name: String,
    pub team_id: u8,
    pub is_player: bool,
    pub is_ai: bool,
    pub is_spectating: bool,
    pub network_id: u8,
    pub telemetry_visible: bool,
    #[serde(default)]
    pub state: ParticipantState,
    #[serde(default)]
    pub result_status: ResultStatus,
    #[serde(default)]
    pub finishing_position: Option<u8>,
}

/// One completed or in-progress lap.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LapRecord {
    pub lap_number: u8,
    pub lap_time_ms: u32,
    pub sector1_ms: u32,
    pub sector2_ms: u32,
    pub sector3_ms: u32,
    pub valid: bool,
    pub tyre_set_index: u8,
    pub top_speed_kmph: f32,
    #[serde(default)]
    pub sector_status: [SectorStatus; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TyreSetRecord {
    pub set_index: u8,
    pub actual_compound: TyreCompound,
    pub visual_compound: TyreCompound,
    pub age_laps: u8,
    pub wear_pct: f32,
    pub lifespan_laps: u8,
    pub delta_to_set0_ms: i16,
    pub available: bool,
}

/// Per-corner wear sample taken at a lap boundary, used both to populate a
/// stint's wear history and as input to the tyre-wear polynomial predictor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct TyreWearSample {
    pub lap_in_stint: u16,
    pub front_left_pct: f32,
    pub front_right_pct: f32,
    pub rear_left_pct: f32,
    pub rear_right_pct: f32,
}

/// A contiguous run on one tyre set. `end_lap == None` means the stint is
/// still open; invariants (non-overlapping, monotonic) are enforced by the
/// race model, never by this type itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stint {
    pub start_lap: u8,
    pub end_lap: Option<u8>,
    pub tyre_set_index: u8,
    pub compound: TyreCompound,
    #[serde(default)]
    pub wear_samples: Vec<TyreWearSample>,
}

impl Stint {
    pub fn open(start_lap: u8, tyre_set_index: u8, compound: TyreCompound) -> Self {
        Self {
            start_lap,
            end_lap: None,
            tyre_set_index,
            compound,
            wear_samples: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_lap.is_none()
    }
}

/// ERS/fuel/DRS snapshot as of the most recent CarStatus packet.
///
/// Constructed through [`CarStatusSnapshot::builder`] so every numeric field
/// is range-validated on the way in instead of trusting the decoder to have
/// already clamped it — the same division of labour the donor workspace
/// uses between its packet decoders and `NormalizedTelemetry`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CarStatusSnapshot {
    pub ers_store_energy_j: f32,
    pub ers_deployed_this_lap_j: f32,
    pub ers_harvested_mguh_j: f32,
    pub ers_harvested_mguk_j: f32,
    pub ers_max_capacity_j: f32,
    pub ers_mode: ErsMode,
    pub fuel_in_tank_kg: f32,
    pub fuel_capacity_kg: f32,
    pub fuel_mix: FuelMix,
    pub fuel_remaining_laps: f32,
    pub drs_allowed: bool,
    pub drs_active: bool,
}

impl CarStatusSnapshot {
    pub fn builder() -> CarStatusSnapshotBuilder {
        CarStatusSnapshotBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct CarStatusSnapshotBuilder {
    inner: CarStatusSnapshot,
}

impl CarStatusSnapshotBuilder {
    pub fn ers_store_energy_j(mut self, value: f32) -> Self {
        if value.is_finite() {
            self.inner.ers_store_energy_j = value.max(0.0);
        }
        self
    }

    pub fn ers_deployed_this_lap_j(mut self, value: f32) -> Self {
        if value.is_finite() {
            self.inner.ers_deployed_this_lap_j = value.max(0.0);
        }
        self
    }

    pub fn ers_harvested_mguh_j(mut self, value: f32) -> Self {
        if value.is_finite() {
            self.inner.ers_harvested_mguh_j = value.max(0.0);
        }
        self
    }

    pub fn ers_harvested_mguk_j(mut self, value: f32) -> Self {
        if value.is_finite() {
            self.inner.ers_harvested_mguk_j = value.max(0.0);
        }
        self
    }

    pub fn ers_max_capacity_j(mut self, value: f32) -> Self {
        if value.is_finite() {
            self.inner.ers_max_capacity_j = value.max(0.0);
        }
        self
    }

    pub fn ers_mode(mut self, value: ErsMode) -> Self {
        self.inner.ers_mode = value;
        self
    }

    pub fn fuel_in_tank_kg(mut self, value: f32) -> Self {
        if value.is_finite() {
            self.inner.fuel_in_tank_kg = value.max(0.0);
        }
        self
    }

    pub fn fuel_capacity_kg(mut self, value: f32) -> Self {
        if value.is_finite() {
            self.inner.fuel_capacity_kg = value.max(0.0);
        }
        self
    }

    pub fn fuel_mix(mut self, value: FuelMix) -> Self {
        self.inner.fuel_mix = value;
        self
    }

    pub fn fuel_remaining_laps(mut self, value: f32) -> Self {
        if value.is_finite() {
            self.inner.fuel_remaining_laps = value.max(0.0);
        }
        self
    }

    pub fn drs_allowed(mut self, value: bool) -> Self {
        self.inner.drs_allowed = value;
        self
    }

    pub fn drs_active(mut self, value: bool) -> Self {
        self.inner.drs_active = value;
        self
    }

    pub fn build(self) -> CarStatusSnapshot {
        self.inner
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DamageSnapshot {
    pub tyre_wear_pct: [f32; 4],
    pub tyre_damage_pct: [u8; 4],
    pub front_left_wing_damage_pct: u8,
    pub front_right_wing_damage_pct: u8,
    pub rear_wing_damage_pct: u8,
    pub floor_damage_pct: u8,
    pub diffuser_damage_pct: u8,
    pub sidepod_damage_pct: u8,
    pub engine_damage_pct: u8,
    pub gearbox_damage_pct: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningEvent {
    pub lap: u8,
    pub sector: u8,
    pub lap_progress_pct: f32,
    pub kind: PenaltyKind,
    pub old_value: u8,
    pub new_value: u8,
}

/// De-duplicated per `(min(i,j), max(i,j), lap_of_min)` (SPEC_FULL.md §4.3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionRecord {
    pub driver_a: u8,
    pub driver_a_lap: u8,
    pub driver_b: u8,
    pub driver_b_lap: u8,
}

impl CollisionRecord {
    /// Stable fingerprint used for de-duplication.
    pub fn fingerprint(driver_i: u8, lap_i: u8, driver_j: u8, lap_j: u8) -> (u8, u8, u8) {
        if driver_i <= driver_j {
            (driver_i, driver_j, lap_i)
        } else {
            (driver_j, driver_i, lap_j)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomMarker {
    pub lap: u8,
    pub sector: u8,
    pub lap_progress_pct: f32,
    pub event_type: String,
    pub track_id: i8,
    pub current_lap_time_ms: u32,
}

/// Global fastest-lap / fastest-sector pointer, naming the owning driver so a
/// session reset can never leave a dangling reference (SPEC_FULL.md §3
/// invariant: the fastest-lap pointer always refers to a lap still present
/// in some participant's history).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LapRecordHolder {
    pub driver_index: u8,
    pub team_id: u8,
    pub lap_number: u8,
    pub time_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LapSectorRecords {
    pub fastest_lap: Option<LapRecordHolder>,
    pub fastest_sector1: Option<LapRecordHolder>,
    pub fastest_sector2: Option<LapRecordHolder>,
    pub fastest_sector3: Option<LapRecordHolder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundRecord {
    pub compound: TyreCompound,
    pub longest_stint_laps: u16,
    pub longest_stint_driver: Option<u8>,
    pub lowest_wear_per_lap_pct: f32,
    pub lowest_wear_per_lap_driver: Option<u8>,
    pub highest_total_wear_pct: f32,
    pub highest_total_wear_driver: Option<u8>,
}

impl CompoundRecord {
    pub fn blank(compound: TyreCompound) -> Self {
        Self {
            compound,
            longest_stint_laps: 0,
            longest_stint_driver: None,
            lowest_wear_per_lap_pct: f32::INFINITY,
            lowest_wear_per_lap_driver: None,
            highest_total_wear_pct: 0.0,
            highest_total_wear_driver: None,
        }
    }
}

/// Top-level immutable view returned by the race model's `snapshot()`.
///
/// This is the type both the fan-out bus's `race-table-update` payload and
/// the on-disk session archive are built from; the two differ only in which
/// subset of fields each role-shaped view includes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub session: Session,
    pub participants: Vec<Participant>,
    pub sequence: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverDetail {
    pub car_index: u8,
    pub lap_history: Vec<LapRecord>,
    pub current_lap: LapRecord,
    pub stints: Vec<Stint>,
    pub tyre_sets: Vec<TyreSetRecord>,
    pub damage: DamageSnapshot,
    pub car_status: CarStatusSnapshot,
    pub warnings: Vec<WarningEvent>,
    pub collisions: Vec<CollisionRecord>,
    /// Derived analytics (SPEC_FULL.md §4.4), filled in by the service layer
    /// from `pitwall-analytics` on top of the fields above — the race model
    /// itself never populates this, so it defaults to empty for any
    /// `DriverDetail` built without an analytics pass (tests, archives
    /// reloaded before a pass has run).
    #[serde(default)]
    pub analytics: DriverAnalytics,
}

/// Both fuel-rate variants named in SPEC_FULL.md §9, mirroring
/// `pitwall_analytics::fuel::FuelEstimate` as a wire-serializable value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct FuelAnalytics {
    pub rate_avg_remaining_kg: f32,
    pub rate_next_lap_kg: f32,
    pub remaining_laps: Option<f32>,
}

/// One tyre-wear prediction evaluated at a named lap (pit window, mid-race,
/// final lap, or a caller-requested lap), per SPEC_FULL.md §4.4.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TyreWearPrediction {
    pub lap_in_stint: u16,
    pub label: TyreWearHorizon,
    pub front_left_pct: f32,
    pub front_right_pct: f32,
    pub rear_left_pct: f32,
    pub rear_right_pct: f32,
    pub average_pct: f32,
    pub max_pct: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TyreWearHorizon {
    PitWindow,
    MidRace,
    FinalLap,
    Requested,
}

/// Per-corner tyre-wear forecast for the open stint. `selected_pit_lap` is a
/// heuristic annotation (first lap-in-stint at which the average-corner
/// prediction crosses the configured wear threshold), never a game-reported
/// value (SPEC_FULL.md §9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TyreWearAnalytics {
    pub predictions: Vec<TyreWearPrediction>,
    pub selected_pit_lap: Option<u16>,
}

/// One neighbouring car's sector-delta comparison against the player's last
/// lap (SPEC_FULL.md §4.4 pace comparator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaceDelta {
    pub car_index: u8,
    pub position: u8,
    pub sector_delta_ms: [i32; 3],
    pub car_status: CarStatusSnapshot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaceAnalytics {
    pub ahead: Vec<PaceDelta>,
    pub behind: Vec<PaceDelta>,
}

/// Bundled derived-analytics view attached to a [`DriverDetail`]. Every field
/// is `None`/empty until the service layer has enough samples to compute it
/// (SPEC_FULL.md §4.4's own per-analytic minimum-sample requirements).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverAnalytics {
    pub fuel: Option<FuelAnalytics>,
    pub tyre_wear: Option<TyreWearAnalytics>,
    pub pace: Option<PaceAnalytics>,
    pub speed_trap_best_kmph: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceStats {
    pub records: LapSectorRecords,
    pub compound_records: Vec<CompoundRecord>,
    pub custom_markers: Vec<CustomMarker>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_fingerprint_is_order_independent() {
        let a = CollisionRecord::fingerprint(7, 5, 3, 5);
        let b = CollisionRecord::fingerprint(3, 5, 7, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn car_status_builder_rejects_non_finite_inputs() {
        let status = CarStatusSnapshot::builder()
            .fuel_in_tank_kg(f32::NAN)
            .fuel_capacity_kg(110.0)
            .build();
        assert_eq!(status.fuel_in_tank_kg, 0.0);
        assert_eq!(status.fuel_capacity_kg, 110.0);
    }

    #[test]
    fn participant_state_terminal_classification() {
        assert!(!ParticipantState::Racing.is_terminal());
        assert!(!ParticipantState::Pitting.is_terminal());
        assert!(ParticipantState::Dnf.is_terminal());
        assert!(ParticipantState::Finished.is_terminal());
    }

    #[test]
    fn stint_open_until_closed() {
        let mut stint = Stint::open(1, 0, TyreCompound::Medium);
        assert!(stint.is_open());
        stint.end_lap = Some(5);
        assert!(!stint.is_open());
    }
}
