//! The race model: a single-writer aggregator behind a reader-friendly
//! snapshot handle.
//!
//! `apply()` is expected to run on exactly one task (the decode/apply loop in
//! `pitwalld`); `snapshot()`, `driver_detail()`, and `race_stats()` are safe
//! to call concurrently from any number of reader tasks (the fan-out
//! broadcasters, the IPC request servicer). Every write builds a new
//! [`ModelState`] from a clone of the previous one and swaps it in under a
//! short-held write lock, rather than mutating fields in place — readers
//! that already hold a clone of the old `Arc` never observe a half-updated
//! state (SPEC_FULL.md §5).
//!
//! Physics-class packets (`Motion`/`MotionEx`/`CarTelemetry`) are kept in a
//! separate short-lock slot instead of folding them into `ModelState`: they
//! arrive at up to 60 Hz and nothing in `RaceSnapshot`/`DriverDetail`/
//! `RaceStats` needs them at that resolution (SPEC_FULL.md §4.2).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use pitwall_codec::motion::{CarMotionData, MotionExData};
use pitwall_codec::{Packet, car_telemetry::CarTelemetryData};
use pitwall_schemas::{
    CollisionRecord, CompoundRecord, CustomMarker, DriverDetail, LapRecordHolder,
    LapSectorRecords, Participant, ParticipantState, RaceSnapshot, RaceStats, ResultStatus,
    SectorStatus, Session, TyreCompound, TyreWearSample, WarningEvent,
};

use crate::error::ApplyError;
use crate::state::{GRID_SIZE, ParticipantRuntime};

const ALL_COMPOUNDS: [TyreCompound; 5] = [
    TyreCompound::Soft,
    TyreCompound::Medium,
    TyreCompound::Hard,
    TyreCompound::Inter,
    TyreCompound::Wet,
];

#[derive(Debug, Clone)]
struct ModelState {
    session: Option<Session>,
    sequence: u64,
    participants: Vec<ParticipantRuntime>,
    records: LapSectorRecords,
    compound_records: Vec<CompoundRecord>,
    custom_markers: Vec<CustomMarker>,
    seen_collisions: HashSet<(u8, u8, u8)>,
    last_frame_by_kind: [u32; 16],
}

impl ModelState {
    fn empty() -> Self {
        Self {
            session: None,
            sequence: 0,
            participants: Vec::new(),
            records: LapSectorRecords::default(),
            compound_records: ALL_COMPOUNDS.iter().copied().map(CompoundRecord::blank).collect(),
            custom_markers: Vec::new(),
            seen_collisions: HashSet::new(),
            last_frame_by_kind: [0; 16],
        }
    }

    fn compound_record_mut(&mut self, compound: TyreCompound) -> Option<&mut CompoundRecord> {
        self.compound_records.iter_mut().find(|r| r.compound == compound)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct MotionSlot {
    cars: Option<[CarMotionData; GRID_SIZE]>,
    ex: Option<MotionExData>,
}

/// Latest decoded physics-class snapshot, read through
/// [`RaceModel::latest_telemetry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetrySlot {
    pub telemetry: Option<CarTelemetryData>,
}

pub struct RaceModel {
    state: RwLock<Arc<ModelState>>,
    motion: Mutex<MotionSlot>,
    telemetry: Mutex<[TelemetrySlot; GRID_SIZE]>,
    /// `--udp-custom-action-code`: a bit position in `ButtonStatus`'s
    /// `button_flags` that injects a Custom Marker. Fixed for the process
    /// lifetime, so it lives on `RaceModel` rather than `ModelState`.
    custom_action_code: Option<u8>,
}

impl Default for RaceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceModel {
    pub fn new() -> Self {
        Self::with_custom_action_code(None)
    }

    pub fn with_custom_action_code(custom_action_code: Option<u8>) -> Self {
        Self {
            state: RwLock::new(Arc::new(ModelState::empty())),
            motion: Mutex::new(MotionSlot::default()),
            telemetry: Mutex::new([TelemetrySlot::default(); GRID_SIZE]),
            custom_action_code,
        }
    }

    fn current(&self) -> Arc<ModelState> {
        // A `RwLock` read never blocks a writer past the clone of the `Arc`
        // pointer itself, so this is cheap even while `apply` is running.
        match self.state.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn commit(&self, next: ModelState) {
        let mut guard = match self.state.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::new(next);
    }

    /// Apply one decoded packet to the model. State-class packets build a
    /// new [`ModelState`] and swap it in; physics-class packets update the
    /// short-lock motion/telemetry slots directly and never touch
    /// `ModelState`.
    pub fn apply(&self, packet: &Packet) -> Result<(), ApplyError> {
        let header = packet.header();

        match packet {
            Packet::Motion(p) => {
                let mut arr = [CarMotionData::default(); GRID_SIZE];
                for (slot, car) in arr.iter_mut().zip(p.cars.iter()) {
                    *slot = *car;
                }
                let mut slot = match self.motion.lock() {
                    Ok(g) => g,
                    Err(poisoned) => poisoned.into_inner(),
                };
                slot.cars = Some(arr);
                return Ok(());
            }
            Packet::MotionEx(p) => {
                let mut slot = match self.motion.lock() {
                    Ok(g) => g,
                    Err(poisoned) => poisoned.into_inner(),
                };
                slot.ex = Some(p.data);
                return Ok(());
            }
            Packet::CarTelemetry(p) => {
                let mut slots = match self.telemetry.lock() {
                    Ok(g) => g,
                    Err(poisoned) => poisoned.into_inner(),
                };
                for (slot, car) in slots.iter_mut().zip(p.cars.iter()) {
                    slot.telemetry = Some(*car);
                }
                return Ok(());
            }
            Packet::TimeTrial(_) | Packet::CarSetups(_) => {
                // Surfaced to callers that decode directly; not folded into
                // the race snapshot (no multi-car race state to attach to).
                return Ok(());
            }
            _ => {}
        }

        let kind_index = kind_index(header.packet_id_raw);
        let prev = self.current();

        if let Some(last) = prev.last_frame_by_kind.get(kind_index) {
            if header.frame_id != 0 && *last != 0 && header.frame_id < *last {
                return Err(ApplyError::StaleFrame {
                    frame_id: header.frame_id,
                    last_seen: *last,
                });
            }
        }

        let mut next = (*prev).clone();
        if let Some(slot) = next.last_frame_by_kind.get_mut(kind_index) {
            *slot = header.frame_id;
        }
        next.sequence += 1;

        match packet {
            Packet::Session(p) => apply_session(&mut next, p),
            Packet::Participants(p) => apply_participants(&mut next, p),
            Packet::LobbyInfo(p) => apply_lobby_info(&mut next, p),
            Packet::LapData(p) => apply_lap_data(&mut next, p),
            Packet::Event(p) => apply_event(&mut next, p, header.player_car_index, self.custom_action_code),
            Packet::CarStatus(p) => apply_car_status(&mut next, p),
            Packet::CarDamage(p) => apply_car_damage(&mut next, p),
            Packet::TyreSets(p) => apply_tyre_sets(&mut next, p),
            Packet::FinalClassification(p) => apply_final_classification(&mut next, p),
            Packet::SessionHistory(p) => apply_session_history(&mut next, p),
            _ => {}
        }

        self.commit(next);
        Ok(())
    }

    /// Folds each participant's still-open tyre stint into the compound
    /// records, so a session that ends without a final compound change still
    /// contributes its last stint (SPEC_FULL.md §4.4: compound records update
    /// "on stint close or refresh at session end"). Call this once, right
    /// before reading `race_stats()`/capturing an archive, on a session-UID
    /// swap or process shutdown.
    pub fn finalize_session_records(&self) {
        let prev = self.current();
        let mut next = (*prev).clone();
        refresh_open_compound_stints(&mut next);
        self.commit(next);
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        let state = self.current();
        let session = state
            .session
            .clone()
            .unwrap_or_else(|| Session::seed(0, pitwall_schemas::GameYear::F1_25));
        RaceSnapshot {
            session,
            participants: state.participants.iter().map(|p| p.participant.clone()).collect(),
            sequence: state.sequence,
        }
    }

    pub fn driver_detail(&self, car_index: u8) -> Option<DriverDetail> {
        let state = self.current();
        let runtime = state
            .participants
            .iter()
            .find(|p| p.participant.car_index == car_index)?;
        Some(DriverDetail {
            car_index,
            lap_history: runtime.lap_history.clone(),
            current_lap: runtime.current_lap.clone(),
            stints: runtime.stints.clone(),
            tyre_sets: runtime.tyre_sets.clone(),
            damage: runtime.damage.clone(),
            car_status: runtime.car_status.clone(),
            warnings: runtime.warnings.clone(),
            collisions: runtime.collisions.clone(),
            analytics: pitwall_schemas::DriverAnalytics::default(),
        })
    }

    pub fn race_stats(&self) -> RaceStats {
        let state = self.current();
        RaceStats {
            records: state.records.clone(),
            compound_records: state.compound_records.clone(),
            custom_markers: state.custom_markers.clone(),
        }
    }

    /// Latest physics-class motion sample, if any has arrived yet.
    pub fn latest_motion(&self) -> Option<[CarMotionData; GRID_SIZE]> {
        let slot = match self.motion.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.cars
    }

    pub fn latest_motion_ex(&self) -> Option<MotionExData> {
        let slot = match self.motion.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.ex
    }

    pub fn latest_telemetry(&self, car_index: u8) -> Option<CarTelemetryData> {
        let slots = match self.telemetry.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.get(car_index as usize).and_then(|s| s.telemetry)
    }
}

fn kind_index(packet_id_raw: u8) -> usize {
    (packet_id_raw as usize).min(15)
}

fn find_runtime_mut(state: &mut ModelState, car_index: u8) -> Option<&mut ParticipantRuntime> {
    state
        .participants
        .iter_mut()
        .find(|p| p.participant.car_index == car_index)
}

fn apply_session(state: &mut ModelState, p: &pitwall_codec::session::SessionPacket) {
    let is_new_session = state
        .session
        .as_ref()
        .map(|s| s.session_uid != p.session.session_uid)
        .unwrap_or(true);

    if is_new_session {
        *state = ModelState {
            session: Some(p.session.clone()),
            sequence: state.sequence,
            last_frame_by_kind: state.last_frame_by_kind,
            ..ModelState::empty()
        };
    } else {
        state.session = Some(p.session.clone());
    }
}

fn apply_participants(state: &mut ModelState, p: &pitwall_codec::participants::ParticipantsPacket) {
    let active = p.num_active_cars as usize;
    state.participants = p
        .participants
        .iter()
        .take(active.max(1))
        .cloned()
        .map(ParticipantRuntime::seed)
        .collect();
}

fn apply_lobby_info(state: &mut ModelState, p: &pitwall_codec::lobby_info::LobbyInfoPacket) {
    if !state.participants.is_empty() {
        return;
    }
    let active = p.num_players as usize;
    state.participants = p
        .players
        .iter()
        .take(active.max(1))
        .enumerate()
        .map(|(idx, player)| {
            ParticipantRuntime::seed(Participant {
                car_index: idx as u8,
                name: player.name.clone(),
                team_id: player.team_id,
                is_player: false,
                is_ai: player.ai_controlled,
                is_spectating: false,
                network_id: 0,
                telemetry_visible: true,
                state: ParticipantState::Racing,
                result_status: ResultStatus::Invalid,
                finishing_position: None,
            })
        })
        .collect();
}

fn apply_lap_data(state: &mut ModelState, p: &pitwall_codec::lap_data::LapDataPacket) {
    let total_laps = state.session.as_ref().map(|s| s.total_laps).unwrap_or(0);
    // Snapshot of the global bests as they stood *before* this packet, so a
    // sector crossing this same packet completes is judged against the
    // record it is actually chasing, not one it is about to set itself.
    let global_best_sector1 = state.records.fastest_sector1.map(|h| h.time_ms);
    let global_best_sector2 = state.records.fastest_sector2.map(|h| h.time_ms);
    let global_best_sector3 = state.records.fastest_sector3.map(|h| h.time_ms);
    let mut newly_completed: Vec<(u8, LapRecordSummary)> = Vec::new();

    for (car_index, car) in p.cars.iter().enumerate() {
        let car_index = car_index as u8;
        let Some(runtime) = find_runtime_mut(state, car_index) else {
            continue;
        };
        if !runtime.accepts_updates() {
            continue;
        }
        runtime.grid_position = car.grid_position;

        let prior_lap_number = runtime.current_lap.lap_number;
        let lap_completed = car.current_lap_num > prior_lap_number && prior_lap_number > 0;

        // A sector crossing (SPEC_FULL.md §4.3.3): `sector` advancing means
        // the sector it just left has a final, stable time to classify.
        let previous_sector = runtime.last_sector;
        if !lap_completed && previous_sector != car.sector {
            if previous_sector == 0 && car.sector1_ms > 0 {
                let status = classify_sector(
                    runtime,
                    0,
                    car.sector1_ms,
                    !car.current_lap_invalid,
                    global_best_sector1,
                );
                if let Some(slot) = runtime.current_lap.sector_status.get_mut(0) {
                    *slot = status;
                }
            } else if previous_sector == 1 && car.sector2_ms > 0 {
                let status = classify_sector(
                    runtime,
                    1,
                    car.sector2_ms,
                    !car.current_lap_invalid,
                    global_best_sector2,
                );
                if let Some(slot) = runtime.current_lap.sector_status.get_mut(1) {
                    *slot = status;
                }
            }
        }
        runtime.last_sector = car.sector;

        if lap_completed {
            let mut completed = std::mem::take(&mut runtime.current_lap);
            // The just-finished lap's total time is reported on the frame
            // where `current_lap_num` increments, not accumulated over the
            // lap that preceded it.
            completed.lap_time_ms = car.last_lap_time_ms;
            // Sector 3 has no dedicated wire field (SPEC_FULL.md §4.1): the
            // game reports only the lap total plus sectors 1 and 2, so the
            // remainder is sector 3.
            completed.sector3_ms = completed
                .lap_time_ms
                .saturating_sub(completed.sector1_ms)
                .saturating_sub(completed.sector2_ms);
            if completed.sector3_ms > 0 {
                let status = classify_sector(
                    runtime,
                    2,
                    completed.sector3_ms,
                    completed.valid,
                    global_best_sector3,
                );
                if let Some(slot) = completed.sector_status.get_mut(2) {
                    *slot = status;
                }
            }
            runtime.lap_history.push(completed.clone());
            newly_completed.push((
                car_index,
                LapRecordSummary {
                    lap_number: completed.lap_number,
                    lap_time_ms: completed.lap_time_ms,
                    sector1_ms: completed.sector1_ms,
                    sector2_ms: completed.sector2_ms,
                    sector3_ms: completed.sector3_ms,
                    valid: completed.valid,
                },
            ));
            runtime.participant.state = if car.pit_status != 0 {
                ParticipantState::Pitting
            } else {
                ParticipantState::Racing
            };
        } else {
            runtime.participant.state = if car.pit_status != 0 {
                ParticipantState::Pitting
            } else {
                ParticipantState::Racing
            };
        }

        runtime.current_lap.lap_number = car.current_lap_num;
        runtime.current_lap.lap_time_ms = car.current_lap_time_ms;
        runtime.current_lap.valid = !car.current_lap_invalid;
        // Both fields hold their final value once the corresponding sector
        // completes and stay stable for the rest of the lap, so copying
        // every frame (rather than gating on the live `sector` index) is
        // safe and keeps the just-completed-lap snapshot above in sync.
        runtime.current_lap.sector1_ms = car.sector1_ms;
        runtime.current_lap.sector2_ms = car.sector2_ms;

        if total_laps > 0 && car.current_lap_num > total_laps {
            runtime.set_result_status(ResultStatus::Finished);
        }
    }

    for (car_index, lap) in newly_completed {
        update_records(state, car_index, &lap);
    }
}

struct LapRecordSummary {
    lap_number: u8,
    lap_time_ms: u32,
    sector1_ms: u32,
    sector2_ms: u32,
    sector3_ms: u32,
    valid: bool,
}

/// Classifies one just-completed sector against the global and personal
/// bests (SPEC_FULL.md §4.3.3's sector-status algorithm), updating
/// `runtime`'s personal-best table in place.
///
/// Tie rule: a time equal to the personal best is "green", not "purple" —
/// the purple branch only fires on a strict global-record improvement, so
/// an exact tie always falls through to the personal-best check below it.
fn classify_sector(
    runtime: &mut ParticipantRuntime,
    sector_idx: usize,
    observed_ms: u32,
    valid: bool,
    global_best_ms: Option<u32>,
) -> SectorStatus {
    if !valid {
        return SectorStatus::Invalid;
    }
    let Some(slot) = runtime.personal_best_sectors.get_mut(sector_idx) else {
        return SectorStatus::NotAvailable;
    };
    let personal_best_ms = *slot;
    let status = if global_best_ms.is_none_or(|best| observed_ms < best) {
        SectorStatus::Purple
    } else if personal_best_ms.is_none_or(|best| observed_ms <= best) {
        SectorStatus::Green
    } else {
        SectorStatus::Yellow
    };
    if personal_best_ms.is_none_or(|best| observed_ms < best) {
        *slot = Some(observed_ms);
    }
    status
}

fn update_records(state: &mut ModelState, car_index: u8, lap: &LapRecordSummary) {
    if !lap.valid || lap.lap_time_ms == 0 {
        return;
    }
    let team_id = state
        .participants
        .iter()
        .find(|p| p.participant.car_index == car_index)
        .map(|p| p.participant.team_id)
        .unwrap_or(0);

    let holder = LapRecordHolder {
        driver_index: car_index,
        team_id,
        lap_number: lap.lap_number,
        time_ms: lap.lap_time_ms,
    };

    if state.records.fastest_lap.map(|h| lap.lap_time_ms < h.time_ms).unwrap_or(true) {
        state.records.fastest_lap = Some(holder);
    }
    if lap.sector1_ms > 0
        && state.records.fastest_sector1.map(|h| lap.sector1_ms < h.time_ms).unwrap_or(true)
    {
        state.records.fastest_sector1 = Some(LapRecordHolder { time_ms: lap.sector1_ms, ..holder });
    }
    if lap.sector2_ms > 0
        && state.records.fastest_sector2.map(|h| lap.sector2_ms < h.time_ms).unwrap_or(true)
    {
        state.records.fastest_sector2 = Some(LapRecordHolder { time_ms: lap.sector2_ms, ..holder });
    }
    if lap.sector3_ms > 0
        && state.records.fastest_sector3.map(|h| lap.sector3_ms < h.time_ms).unwrap_or(true)
    {
        state.records.fastest_sector3 = Some(LapRecordHolder { time_ms: lap.sector3_ms, ..holder });
    }
}

fn apply_event(
    state: &mut ModelState,
    p: &pitwall_codec::event::EventPacket,
    player_car_index: u8,
    custom_action_code: Option<u8>,
) {
    use pitwall_codec::event::EventDetail;

    match &p.detail {
        EventDetail::Retirement(d) => {
            if let Some(runtime) = find_runtime_mut(state, d.vehicle_idx) {
                runtime.set_result_status(ResultStatus::Retired);
            }
        }
        EventDetail::Collision(d) => {
            let lap_a = state
                .participants
                .iter()
                .find(|p| p.participant.car_index == d.vehicle_idx)
                .map(|p| p.current_lap.lap_number)
                .unwrap_or(0);
            let lap_b = state
                .participants
                .iter()
                .find(|p| p.participant.car_index == d.other_vehicle_idx)
                .map(|p| p.current_lap.lap_number)
                .unwrap_or(0);
            let fingerprint =
                CollisionRecord::fingerprint(d.vehicle_idx, lap_a, d.other_vehicle_idx, lap_b);
            if state.seen_collisions.insert(fingerprint) {
                let record = CollisionRecord {
                    driver_a: d.vehicle_idx,
                    driver_a_lap: lap_a,
                    driver_b: d.other_vehicle_idx,
                    driver_b_lap: lap_b,
                };
                if let Some(runtime) = find_runtime_mut(state, d.vehicle_idx) {
                    runtime.collisions.push(record);
                }
                if let Some(runtime) = find_runtime_mut(state, d.other_vehicle_idx) {
                    runtime.collisions.push(record);
                }
            }
        }
        EventDetail::Penalty(d) => {
            if let Some(kind) = pitwall_codec::enums::penalty_kind(d.penalty_kind_raw) {
                if let Some(runtime) = find_runtime_mut(state, d.vehicle_idx) {
                    runtime.warnings.push(WarningEvent {
                        lap: d.lap_num,
                        sector: 0,
                        lap_progress_pct: 0.0,
                        kind,
                        old_value: 0,
                        new_value: d.places_gained,
                    });
                }
            }
        }
        EventDetail::ButtonStatus(d) => {
            if let Some(code) = custom_action_code {
                if d.button_flags & (1u32 << (code as u32 % 32)) != 0 {
                    let track_id = state.session.as_ref().map(|s| s.track_id).unwrap_or(-1);
                    let (lap, current_lap_time_ms) = state
                        .participants
                        .iter()
                        .find(|p| p.participant.car_index == player_car_index)
                        .map(|p| (p.current_lap.lap_number, p.current_lap.lap_time_ms))
                        .unwrap_or((0, 0));
                    state.custom_markers.push(CustomMarker {
                        lap,
                        sector: 0,
                        // The decoded packet set carries no track-length
                        // constant, so lap percentage can't be derived here;
                        // same placeholder the Penalty branch above uses.
                        lap_progress_pct: 0.0,
                        event_type: "custom-action".to_string(),
                        track_id,
                        current_lap_time_ms,
                    });
                }
            }
        }
        EventDetail::FastestLap(_) | EventDetail::SpeedTrap(_) | EventDetail::StartLights(_) => {}
        _ => {}
    }
}

fn apply_car_status(state: &mut ModelState, p: &pitwall_codec::car_status::CarStatusPacket) {
    for (car_index, status) in p.cars.iter().enumerate() {
        if let Some(runtime) = find_runtime_mut(state, car_index as u8) {
            if runtime.accepts_updates() {
                runtime.car_status = status.clone();
            }
        }
    }
}

fn apply_car_damage(state: &mut ModelState, p: &pitwall_codec::car_damage::CarDamagePacket) {
    for (car_index, damage) in p.cars.iter().enumerate() {
        let car_index = car_index as u8;
        if let Some(runtime) = find_runtime_mut(state, car_index) {
            if !runtime.accepts_updates() {
                continue;
            }
            runtime.damage = damage.clone();
            let current_lap = runtime.current_lap.lap_number;
            if let Some(stint) = runtime.stints.last_mut() {
                if stint.is_open() {
                    stint.wear_samples.push(TyreWearSample {
                        lap_in_stint: current_lap.saturating_sub(stint.start_lap) as u16,
                        front_left_pct: damage.tyre_wear_pct[0],
                        front_right_pct: damage.tyre_wear_pct[1],
                        rear_left_pct: damage.tyre_wear_pct[2],
                        rear_right_pct: damage.tyre_wear_pct[3],
                    });
                }
            }
        }
    }
}

fn apply_tyre_sets(state: &mut ModelState, p: &pitwall_codec::tyre_sets::TyreSetsPacket) {
    let car_index = p.car_index;
    let new_fitted = p.sets.get(p.fitted_index as usize).cloned();

    let changed_compound = {
        let runtime = match find_runtime_mut(state, car_index) {
            Some(r) => r,
            None => return,
        };
        if !runtime.accepts_updates() {
            return;
        }
        runtime.tyre_sets = p.sets.clone();
        let changed = new_fitted
            .as_ref()
            .map(|f| runtime.current_compound() != Some(f.actual_compound))
            .unwrap_or(false)
            || runtime.stints.is_empty();
        changed
    };

    if changed_compound {
        if let Some(fitted) = new_fitted {
            let stint_len = {
                let Some(runtime) = find_runtime_mut(state, car_index) else {
                    return;
                };
                let current_lap_number = runtime.current_lap.lap_number;
                let stint_len = runtime
                    .stints
                    .last()
                    .map(|s| current_lap_number.saturating_sub(s.start_lap))
                    .unwrap_or(0);
                runtime.open_stint(fitted.set_index, fitted.actual_compound);
                stint_len
            };
            update_compound_record_on_stint_close(state, car_index, stint_len);
        }
    }
}

fn update_compound_record_on_stint_close(state: &mut ModelState, car_index: u8, stint_len: u8) {
    let (compound, wear_pct) = {
        let runtime = match state
            .participants
            .iter()
            .find(|p| p.participant.car_index == car_index)
        {
            Some(r) => r,
            None => return,
        };
        let Some(closed) = runtime.stints.iter().rev().nth(1) else {
            return;
        };
        let wear_pct = closed
            .wear_samples
            .last()
            .map(|s| s.front_left_pct.max(s.front_right_pct).max(s.rear_left_pct).max(s.rear_right_pct))
            .unwrap_or(0.0);
        (closed.compound, wear_pct)
    };
    apply_compound_observation(state, car_index, compound, stint_len, wear_pct);
}

/// Folds one stint's (compound, length, peak wear) observation into that
/// compound's session-wide record, shared by the stint-close path above and
/// the session-end refresh below (SPEC_FULL.md: compound records update "on
/// stint close or refresh at session end").
fn apply_compound_observation(state: &mut ModelState, car_index: u8, compound: TyreCompound, stint_len: u8, wear_pct: f32) {
    let Some(record) = state.compound_record_mut(compound) else {
        return;
    };
    if stint_len as u16 > record.longest_stint_laps {
        record.longest_stint_laps = stint_len as u16;
        record.longest_stint_driver = Some(car_index);
    }
    if wear_pct > record.highest_total_wear_pct {
        record.highest_total_wear_pct = wear_pct;
        record.highest_total_wear_driver = Some(car_index);
    }
    if stint_len > 0 {
        let per_lap = wear_pct / stint_len as f32;
        if per_lap < record.lowest_wear_per_lap_pct {
            record.lowest_wear_per_lap_pct = per_lap;
            record.lowest_wear_per_lap_driver = Some(car_index);
        }
    }
}

/// Folds every participant's still-open stint into the compound records, for
/// the session-end refresh (SPEC_FULL.md §4.4: a session where the final
/// stint was never closed by a compound change must still contribute to
/// `longest_stint_laps`/`highest_total_wear_pct`/`lowest_wear_per_lap_pct`).
/// Safe to call more than once; it only ever raises/lowers a record extremum.
fn refresh_open_compound_stints(state: &mut ModelState) {
    let observations: Vec<(u8, TyreCompound, u8, f32)> = state
        .participants
        .iter()
        .filter_map(|runtime| {
            let open = runtime.stints.last().filter(|s| s.is_open())?;
            let stint_len = runtime
                .current_lap
                .lap_number
                .saturating_sub(open.start_lap);
            let wear_pct = open
                .wear_samples
                .last()
                .map(|s| s.front_left_pct.max(s.front_right_pct).max(s.rear_left_pct).max(s.rear_right_pct))
                .unwrap_or(0.0);
            Some((runtime.participant.car_index, open.compound, stint_len, wear_pct))
        })
        .collect();

    for (car_index, compound, stint_len, wear_pct) in observations {
        apply_compound_observation(state, car_index, compound, stint_len, wear_pct);
    }
}

fn apply_final_classification(
    state: &mut ModelState,
    p: &pitwall_codec::final_classification::FinalClassificationPacket,
) {
    for (car_index, result) in p.cars.iter().enumerate() {
        if let Some(runtime) = find_runtime_mut(state, car_index as u8) {
            runtime.participant.finishing_position = Some(result.position);
            runtime.set_result_status(result.result_status);
        }
    }
}

/// Backfills lap history from the game's own per-driver ledger when the live
/// `LapData` stream has gaps (packet loss, a session loaded mid-way).
fn apply_session_history(
    state: &mut ModelState,
    p: &pitwall_codec::session_history::SessionHistoryPacket,
) {
    if let Some(runtime) = find_runtime_mut(state, p.car_index) {
        if runtime.lap_history.len() < p.laps.len() {
            runtime.lap_history = p.laps.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_codec::header::{PacketHeader, PacketId};
    use pitwall_codec::lap_data::{CarLapData, LapDataPacket};
    use pitwall_codec::participants::ParticipantsPacket;
    use pitwall_schemas::GameYear;

    fn header(packet_id: PacketId, session_uid: u64, frame_id: u32) -> PacketHeader {
        PacketHeader {
            packet_format: 2025,
            game_year: GameYear::F1_25,
            game_major_version: 1,
            game_minor_version: 0,
            packet_version: 1,
            packet_id_raw: packet_id as u8,
            session_uid,
            session_time_sec: 0.0,
            frame_id,
            overall_frame_identifier: 0,
            player_car_index: 0,
            secondary_player_car_index: 255,
        }
    }

    fn seeded_participants(model: &RaceModel, session_uid: u64, count: u8) {
        let participants = (0..count)
            .map(|car_index| Participant {
                car_index,
                name: format!("Driver {car_index}"),
                team_id: car_index,
                is_player: car_index == 0,
                is_ai: car_index != 0,
                is_spectating: false,
                network_id: 0,
                telemetry_visible: true,
                state: ParticipantState::Racing,
                result_status: ResultStatus::Active,
                finishing_position: None,
            })
            .collect();
        model
            .apply(&Packet::Session(pitwall_codec::session::SessionPacket {
                header: header(PacketId::Session, session_uid, 1),
                session: Session::seed(session_uid, GameYear::F1_25),
            }))
            .unwrap();
        model
            .apply(&Packet::Participants(ParticipantsPacket {
                header: header(PacketId::Participants, session_uid, 1),
                num_active_cars: count,
                participants,
            }))
            .unwrap();
    }

    fn lap_data_packet(session_uid: u64, frame_id: u32, cars: Vec<CarLapData>) -> Packet {
        Packet::LapData(LapDataPacket {
            header: header(PacketId::LapData, session_uid, frame_id),
            cars,
        })
    }

    fn car_lap(lap_num: u8, lap_time_ms: u32) -> CarLapData {
        CarLapData {
            current_lap_num: lap_num,
            last_lap_time_ms: lap_time_ms,
            current_lap_invalid: false,
            ..CarLapData::default()
        }
    }

    #[test]
    fn completing_a_lap_moves_it_into_history_and_updates_the_fastest_lap_record() {
        let model = RaceModel::new();
        seeded_participants(&model, 42, 2);

        let mut cars = vec![car_lap(1, 0); 22];
        cars[0].current_lap_num = 1;
        model.apply(&lap_data_packet(42, 2, cars.clone())).unwrap();

        cars[0].current_lap_num = 2;
        cars[0].last_lap_time_ms = 91_234;
        model.apply(&lap_data_packet(42, 3, cars)).unwrap();

        let detail = model.driver_detail(0).expect("driver 0 tracked");
        assert_eq!(detail.lap_history.len(), 1);
        assert_eq!(detail.lap_history[0].lap_time_ms, 91_234);
        assert_eq!(detail.current_lap.lap_number, 2);

        let stats = model.race_stats();
        let fastest = stats.records.fastest_lap.expect("a valid completed lap sets the record");
        assert_eq!(fastest.time_ms, 91_234);
        assert_eq!(fastest.driver_index, 0);
    }

    #[test]
    fn a_new_session_uid_resets_lap_history_and_records() {
        let model = RaceModel::new();
        seeded_participants(&model, 1, 1);

        let mut cars = vec![car_lap(1, 0); 22];
        model.apply(&lap_data_packet(1, 2, cars.clone())).unwrap();
        cars[0].current_lap_num = 2;
        model.apply(&lap_data_packet(1, 3, cars)).unwrap();
        assert_eq!(model.driver_detail(0).unwrap().lap_history.len(), 1);

        seeded_participants(&model, 2, 1);
        let snapshot = model.snapshot();
        assert_eq!(snapshot.session.session_uid, 2);
        assert!(model.driver_detail(0).unwrap().lap_history.is_empty());
    }

    #[test]
    fn a_sector_crossing_a_new_time_sets_purple_and_an_equal_time_next_lap_sets_green() {
        let model = RaceModel::new();
        seeded_participants(&model, 9, 1);

        let mut cars = vec![car_lap(1, 0); 22];
        model.apply(&lap_data_packet(9, 2, cars.clone())).unwrap();

        // First-ever sector 1 crossing: no global record to chase, so it is
        // the record (purple).
        cars[0].sector = 1;
        cars[0].sector1_ms = 30_000;
        model.apply(&lap_data_packet(9, 3, cars.clone())).unwrap();
        assert_eq!(
            model.driver_detail(0).unwrap().current_lap.sector_status[0],
            SectorStatus::Purple
        );

        // Lap completes: the 30s sector 1 becomes the session's global best.
        cars[0].current_lap_num = 2;
        cars[0].last_lap_time_ms = 90_000;
        cars[0].sector = 0;
        cars[0].sector1_ms = 0;
        model.apply(&lap_data_packet(9, 4, cars.clone())).unwrap();
        let stats = model.race_stats();
        assert_eq!(stats.records.fastest_sector1.expect("set by lap 1").time_ms, 30_000);

        // Lap 2, sector 1 crossing at exactly the same time: a tie against
        // both the global and personal best is green, not purple.
        cars[0].sector = 1;
        cars[0].sector1_ms = 30_000;
        model.apply(&lap_data_packet(9, 5, cars)).unwrap();
        assert_eq!(
            model.driver_detail(0).unwrap().current_lap.sector_status[0],
            SectorStatus::Green
        );
    }

    #[test]
    fn finalize_session_records_folds_a_still_open_stint_into_compound_records() {
        use pitwall_codec::car_damage::CarDamagePacket;
        use pitwall_codec::tyre_sets::TyreSetsPacket;
        use pitwall_schemas::{DamageSnapshot, TyreSetRecord};

        let model = RaceModel::new();
        seeded_participants(&model, 11, 1);

        let fitted = TyreSetRecord {
            set_index: 0,
            actual_compound: TyreCompound::Soft,
            visual_compound: TyreCompound::Soft,
            age_laps: 0,
            wear_pct: 0.0,
            lifespan_laps: 20,
            delta_to_set0_ms: 0,
            available: true,
        };
        model
            .apply(&Packet::TyreSets(TyreSetsPacket {
                header: header(PacketId::TyreSets, 11, 1),
                car_index: 0,
                sets: vec![fitted.clone()],
                fitted_index: 0,
            }))
            .unwrap();

        // Advance five laps without ever changing compound, leaving the
        // stint open for the rest of the session.
        let mut cars = vec![car_lap(1, 0); 22];
        cars[0].current_lap_num = 6;
        model.apply(&lap_data_packet(11, 2, cars)).unwrap();

        let mut damage_cars = vec![DamageSnapshot::default(); 22];
        damage_cars[0].tyre_wear_pct = [40.0, 38.0, 35.0, 33.0];
        model
            .apply(&Packet::CarDamage(CarDamagePacket {
                header: header(PacketId::CarDamage, 11, 3),
                cars: damage_cars,
            }))
            .unwrap();

        // Before the refresh, the still-open stint has never closed, so it
        // has not contributed to the compound records yet.
        let before = model.race_stats();
        let soft = before
            .compound_records
            .iter()
            .find(|r| r.compound == TyreCompound::Soft)
            .expect("soft compound tracked");
        assert_eq!(soft.longest_stint_laps, 0);

        model.finalize_session_records();

        let after = model.race_stats();
        let soft = after
            .compound_records
            .iter()
            .find(|r| r.compound == TyreCompound::Soft)
            .expect("soft compound tracked");
        assert_eq!(soft.longest_stint_laps, 5);
        assert_eq!(soft.longest_stint_driver, Some(0));
        assert!((soft.highest_total_wear_pct - 40.0).abs() < 1e-6);
    }

    #[test]
    fn duplicate_collision_events_are_recorded_once_per_car() {
        let model = RaceModel::new();
        seeded_participants(&model, 7, 2);

        let event = Packet::Event(pitwall_codec::event::EventPacket {
            header: header(PacketId::Event, 7, 5),
            code: pitwall_codec::enums::EventCode::Collision,
            detail: pitwall_codec::event::EventDetail::Collision(
                pitwall_codec::event::CollisionDetail {
                    vehicle_idx: 0,
                    other_vehicle_idx: 1,
                },
            ),
        });

        model.apply(&event).unwrap();
        model.apply(&event).unwrap();

        let detail = model.driver_detail(0).expect("driver 0 tracked");
        assert_eq!(detail.collisions.len(), 1);
    }

    #[test]
    fn a_button_status_event_on_the_configured_bit_injects_a_custom_marker() {
        let model = RaceModel::with_custom_action_code(Some(16));
        seeded_participants(&model, 9, 1);

        let header = header(PacketId::Event, 9, 5);
        let matching = Packet::Event(pitwall_codec::event::EventPacket {
            header,
            code: pitwall_codec::enums::EventCode::ButtonStatus,
            detail: pitwall_codec::event::EventDetail::ButtonStatus(
                pitwall_codec::event::ButtonStatusDetail {
                    button_flags: 1 << 16,
                },
            ),
        });
        model.apply(&matching).unwrap();

        let stats = model.race_stats();
        assert_eq!(stats.custom_markers.len(), 1);
        assert_eq!(stats.custom_markers[0].event_type, "custom-action");
    }

    #[test]
    fn a_button_status_event_off_the_configured_bit_is_ignored() {
        let model = RaceModel::with_custom_action_code(Some(16));
        seeded_participants(&model, 10, 1);

        let header = header(PacketId::Event, 10, 5);
        let non_matching = Packet::Event(pitwall_codec::event::EventPacket {
            header,
            code: pitwall_codec::enums::EventCode::ButtonStatus,
            detail: pitwall_codec::event::EventDetail::ButtonStatus(
                pitwall_codec::event::ButtonStatusDetail { button_flags: 1 << 4 },
            ),
        });
        model.apply(&non_matching).unwrap();

        assert!(model.race_stats().custom_markers.is_empty());
    }
}
