//! Live [`SnapshotProvider`] over a running [`RaceModel`] (SPEC_FULL.md
//! §4.4, §4.5): hands the fan-out bus and the IPC surface the same
//! `RaceSnapshot`/`RaceStats`/`DriverDetail` views, enriching each
//! `DriverDetail` with the derived analytics `pitwall-analytics` computes
//! but the Race Model itself never stores.

use std::sync::{Arc, Mutex, MutexGuard};

use pitwall_analytics::{FuelEstimator, GridEntry, PaceEntry, SpeedTrapTracker, TyreWearForecast, compare_pace};
use pitwall_codec::lap_data::LapDataPacket;
use pitwall_fanout::SnapshotProvider;
use pitwall_race_model::{GRID_SIZE, RaceModel};
use pitwall_schemas::{
    DriverAnalytics, DriverDetail, FuelAnalytics, PaceAnalytics, PaceDelta, RaceSnapshot,
    RaceStats, TyreWearAnalytics, TyreWearHorizon, TyreWearPrediction,
};

/// Crosses the 80% average-corner-wear line before flagging a predicted pit
/// lap (SPEC_FULL.md §4.4's heuristic annotation, never a game-reported
/// value).
const PIT_WEAR_THRESHOLD_PCT: f32 = 80.0;
/// How many laps ahead the "mid-race" tyre-wear horizon looks.
const MID_RACE_LOOKAHEAD_LAPS: u16 = 5;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct LiveSnapshotProvider {
    model: Arc<RaceModel>,
    fuel: Mutex<FuelEstimator>,
    speed_trap: Mutex<SpeedTrapTracker>,
    /// Live `car_position` per grid slot, overwritten on every `LapData`
    /// frame; `0` means "no lap-data frame seen yet for this car".
    positions: Mutex<[u8; GRID_SIZE]>,
    /// Last `current_lap_num` seen per grid slot, used to detect the
    /// lap-completion crossing the same way `RaceModel::apply` does
    /// internally, so the fuel estimator samples at the right frame.
    last_lap_seen: Mutex<[u8; GRID_SIZE]>,
    num_adjacent_cars: u8,
}

impl LiveSnapshotProvider {
    pub fn new(model: Arc<RaceModel>, num_adjacent_cars: u8) -> Self {
        Self {
            model,
            fuel: Mutex::new(FuelEstimator::new()),
            speed_trap: Mutex::new(SpeedTrapTracker::new()),
            positions: Mutex::new([0u8; GRID_SIZE]),
            last_lap_seen: Mutex::new([0u8; GRID_SIZE]),
            num_adjacent_cars,
        }
    }

    /// Folds one `LapData` frame into the cross-lap analytics trackers.
    /// Called by the decode/apply task once the frame has already been
    /// applied to the model, so the fuel reading taken on a completion
    /// crossing reflects the car's latest known status.
    pub fn record_lap_data(&self, packet: &LapDataPacket) {
        let mut positions = lock(&self.positions);
        let mut speed_trap = lock(&self.speed_trap);
        for (index, car) in packet.cars.iter().enumerate() {
            if let Some(slot) = positions.get_mut(index) {
                *slot = car.car_position;
            }
            speed_trap.record(index as u8, car.speed_trap_fastest_speed_kmph);
        }
        drop(positions);
        drop(speed_trap);

        let mut last_lap_seen = lock(&self.last_lap_seen);
        let mut boundaries: Vec<u8> = Vec::new();
        for (index, car) in packet.cars.iter().enumerate() {
            let Some(previous) = last_lap_seen.get_mut(index) else {
                continue;
            };
            if car.current_lap_num > *previous && *previous > 0 {
                boundaries.push(index as u8);
            }
            *previous = car.current_lap_num;
        }
        drop(last_lap_seen);

        if boundaries.is_empty() {
            return;
        }
        let mut fuel = lock(&self.fuel);
        for car_index in boundaries {
            if let Some(detail) = self.model.driver_detail(car_index) {
                fuel.record_lap_boundary(car_index, detail.car_status.fuel_in_tank_kg);
            }
        }
    }

    fn driver_analytics(&self, car_index: u8, detail: &DriverDetail) -> DriverAnalytics {
        let fuel = lock(&self.fuel)
            .estimate(car_index, detail.car_status.fuel_in_tank_kg)
            .map(|estimate| FuelAnalytics {
                rate_avg_remaining_kg: estimate.rate_avg_remaining_kg,
                rate_next_lap_kg: estimate.rate_next_lap_kg,
                remaining_laps: estimate.remaining_laps,
            });

        let tyre_wear = self.tyre_wear_analytics(detail);
        let pace = self.pace_analytics(car_index, detail);
        let speed_trap_best_kmph = lock(&self.speed_trap).fastest(car_index);

        DriverAnalytics {
            fuel,
            tyre_wear,
            pace,
            speed_trap_best_kmph,
        }
    }

    fn tyre_wear_analytics(&self, detail: &DriverDetail) -> Option<TyreWearAnalytics> {
        let stint = detail.stints.last().filter(|stint| stint.end_lap.is_none())?;
        let forecast = TyreWearForecast::fit(&stint.wear_samples);
        let current_lap_in_stint = stint
            .wear_samples
            .last()
            .map(|sample| sample.lap_in_stint)
            .unwrap_or(0);
        let total_laps = self.model.snapshot().session.total_laps;
        let remaining_laps = u16::from(total_laps.saturating_sub(detail.current_lap.lap_number));

        let mut predictions = Vec::new();
        let mid_race_lap = current_lap_in_stint.saturating_add(MID_RACE_LOOKAHEAD_LAPS);
        if let Some(prediction) = forecast.predict_lap(mid_race_lap) {
            predictions.push(to_prediction(mid_race_lap, TyreWearHorizon::MidRace, prediction));
        }
        let final_lap = current_lap_in_stint.saturating_add(remaining_laps);
        if let Some(prediction) = forecast.predict_lap(final_lap) {
            predictions.push(to_prediction(final_lap, TyreWearHorizon::FinalLap, prediction));
        }
        let selected_pit_lap =
            forecast.selected_pit_lap(current_lap_in_stint, remaining_laps, PIT_WEAR_THRESHOLD_PCT);
        if let Some(pit_lap) = selected_pit_lap {
            if let Some(prediction) = forecast.predict_lap(pit_lap) {
                predictions.push(to_prediction(pit_lap, TyreWearHorizon::PitWindow, prediction));
            }
        }

        Some(TyreWearAnalytics {
            predictions,
            selected_pit_lap,
        })
    }

    fn pace_analytics(&self, car_index: u8, detail: &DriverDetail) -> Option<PaceAnalytics> {
        let positions = lock(&self.positions);
        let snapshot = self.model.snapshot();
        let mut grid: Vec<GridEntry> = Vec::new();
        for participant in &snapshot.participants {
            let position = *positions.get(usize::from(participant.car_index))?;
            if position == 0 {
                continue;
            }
            let neighbour_detail = if participant.car_index == car_index {
                detail.clone()
            } else {
                self.model.driver_detail(participant.car_index)?
            };
            let last_lap = neighbour_detail
                .lap_history
                .last()
                .cloned()
                .unwrap_or_else(|| neighbour_detail.current_lap.clone());
            grid.push(GridEntry {
                car_index: participant.car_index,
                position,
                last_lap,
                car_status: neighbour_detail.car_status,
            });
        }
        grid.sort_by_key(|entry| entry.position);

        let comparison = compare_pace(car_index, &grid, usize::from(self.num_adjacent_cars))?;
        Some(PaceAnalytics {
            ahead: comparison.ahead.into_iter().map(to_pace_delta).collect(),
            behind: comparison.behind.into_iter().map(to_pace_delta).collect(),
        })
    }
}

fn to_prediction(
    lap_in_stint: u16,
    label: TyreWearHorizon,
    prediction: pitwall_analytics::CornerWearPrediction,
) -> TyreWearPrediction {
    TyreWearPrediction {
        lap_in_stint,
        label,
        front_left_pct: prediction.front_left_pct,
        front_right_pct: prediction.front_right_pct,
        rear_left_pct: prediction.rear_left_pct,
        rear_right_pct: prediction.rear_right_pct,
        average_pct: prediction.average_pct,
        max_pct: prediction.max_pct,
    }
}

fn to_pace_delta(entry: PaceEntry) -> PaceDelta {
    PaceDelta {
        car_index: entry.car_index,
        position: entry.position,
        sector_delta_ms: entry.sector_delta_ms,
        car_status: entry.car_status,
    }
}

impl SnapshotProvider for LiveSnapshotProvider {
    fn race_snapshot(&self) -> RaceSnapshot {
        self.model.snapshot()
    }

    fn race_stats(&self) -> RaceStats {
        self.model.race_stats()
    }

    fn driver_detail(&self, car_index: u8) -> Option<DriverDetail> {
        let mut detail = self.model.driver_detail(car_index)?;
        detail.analytics = self.driver_analytics(car_index, &detail);
        Some(detail)
    }

    fn player_car_index(&self) -> Option<u8> {
        self.model
            .snapshot()
            .participants
            .iter()
            .find(|participant| participant.is_player)
            .map(|participant| participant.car_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_test_helpers::fixtures::{
        lap_data_packet_fixture, participants_packet_fixture, session_packet_fixture,
    };

    #[test]
    fn player_car_index_reflects_the_seeded_participant() {
        let model = Arc::new(RaceModel::new());
        model
            .apply(&session_packet_fixture(1))
            .expect("session packet applies cleanly");
        model
            .apply(&participants_packet_fixture(1, 4))
            .expect("participants packet applies cleanly");
        let provider = LiveSnapshotProvider::new(model, 2);
        assert_eq!(provider.player_car_index(), Some(0));
    }

    #[test]
    fn a_lap_completion_feeds_the_fuel_estimator() {
        let model = Arc::new(RaceModel::new());
        model.apply(&session_packet_fixture(1)).expect("session applies");
        model
            .apply(&participants_packet_fixture(1, 2))
            .expect("participants apply");
        let provider = LiveSnapshotProvider::new(Arc::clone(&model), 2);

        let lap1 = lap_data_packet_fixture(1, 2, 0, 1, 0);
        model.apply(&lap1).expect("first lap frame applies");
        if let pitwall_codec::Packet::LapData(packet) = &lap1 {
            provider.record_lap_data(packet);
        }

        let lap2 = lap_data_packet_fixture(1, 3, 0, 2, 91_234);
        model.apply(&lap2).expect("second lap frame applies");
        if let pitwall_codec::Packet::LapData(packet) = &lap2 {
            provider.record_lap_data(packet);
        }

        // The fixture never varies `fuel_in_tank_kg` across frames, so no
        // positive consumption delta is ever recorded; this only exercises
        // the boundary-detection path itself.
        let detail = provider.driver_detail(0).expect("car 0 seeded");
        assert!(detail.analytics.fuel.is_none());
    }
}
