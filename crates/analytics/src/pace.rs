//! Pace comparator: the cars immediately ahead and behind the player on
//! track, with last-lap sector deltas and an ERS snapshot (SPEC_FULL.md
//! §4.4).

use pitwall_schemas::{CarStatusSnapshot, LapRecord};

/// One grid slot, ordered by track position ascending (index 0 = leader),
/// as assembled by the caller from a [`pitwall_schemas::RaceSnapshot`] plus
/// the corresponding [`pitwall_schemas::DriverDetail`] records.
#[derive(Debug, Clone)]
pub struct GridEntry {
    pub car_index: u8,
    pub position: u8,
    pub last_lap: LapRecord,
    pub car_status: CarStatusSnapshot,
}

/// One comparison entry: a neighbouring car plus its delta to the player's
/// last lap, sector by sector (`neighbour - player`, milliseconds). Negative
/// means the neighbour was faster than the player in that sector.
#[derive(Debug, Clone)]
pub struct PaceEntry {
    pub car_index: u8,
    pub position: u8,
    pub sector_delta_ms: [i32; 3],
    pub car_status: CarStatusSnapshot,
}

#[derive(Debug, Clone, Default)]
pub struct PaceComparison {
    /// Closest cars ahead, nearest first.
    pub ahead: Vec<PaceEntry>,
    /// Closest cars behind, nearest first.
    pub behind: Vec<PaceEntry>,
}

/// Picks up to `window` cars ahead and behind `player_car_index` in
/// `ordered_grid` (must already be sorted by track position) and computes
/// each one's sector deltas against the player's last lap.
///
/// Returns `None` if the player is not present in `ordered_grid`.
pub fn compare_pace(
    player_car_index: u8,
    ordered_grid: &[GridEntry],
    window: usize,
) -> Option<PaceComparison> {
    let player_slot = ordered_grid
        .iter()
        .position(|entry| entry.car_index == player_car_index)?;
    let player = ordered_grid.get(player_slot)?;
    let player_lap = player.last_lap.clone();

    let ahead = ordered_grid
        .iter()
        .take(player_slot)
        .rev()
        .take(window)
        .map(|entry| to_pace_entry(entry, &player_lap))
        .collect();
    let behind = ordered_grid
        .iter()
        .skip(player_slot + 1)
        .take(window)
        .map(|entry| to_pace_entry(entry, &player_lap))
        .collect();

    Some(PaceComparison { ahead, behind })
}

fn to_pace_entry(entry: &GridEntry, player_lap: &LapRecord) -> PaceEntry {
    PaceEntry {
        car_index: entry.car_index,
        position: entry.position,
        sector_delta_ms: [
            entry.last_lap.sector1_ms as i32 - player_lap.sector1_ms as i32,
            entry.last_lap.sector2_ms as i32 - player_lap.sector2_ms as i32,
            entry.last_lap.sector3_ms as i32 - player_lap.sector3_ms as i32,
        ],
        car_status: entry.car_status.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_schemas::{ErsMode, FuelMix};

    fn entry(car_index: u8, position: u8, lap_time_ms: u32) -> GridEntry {
        GridEntry {
            car_index,
            position,
            last_lap: LapRecord {
                lap_number: 3,
                lap_time_ms,
                sector1_ms: lap_time_ms / 3,
                sector2_ms: lap_time_ms / 3,
                sector3_ms: lap_time_ms / 3,
                valid: true,
                tyre_set_index: 0,
                top_speed_kmph: 0.0,
                sector_status: Default::default(),
            },
            car_status: CarStatusSnapshot::builder()
                .ers_mode(ErsMode::Medium)
                .fuel_mix(FuelMix::Standard)
                .build(),
        }
    }

    #[test]
    fn picks_the_configured_window_on_each_side() {
        let grid = vec![
            entry(4, 1, 90_000),
            entry(3, 2, 90_500),
            entry(2, 3, 91_000),
            entry(1, 4, 91_500),
            entry(0, 5, 92_000),
            entry(5, 6, 92_500),
        ];
        let comparison = compare_pace(1, &grid, 2).expect("player is in the grid");
        assert_eq!(
            comparison.ahead.iter().map(|e| e.car_index).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(
            comparison.behind.iter().map(|e| e.car_index).collect::<Vec<_>>(),
            vec![0, 5]
        );
    }

    #[test]
    fn sector_delta_is_negative_when_the_neighbour_is_faster() {
        let grid = vec![entry(0, 1, 90_000), entry(1, 2, 91_500)];
        let comparison = compare_pace(1, &grid, 2).expect("player is in the grid");
        let ahead = comparison.ahead.first().expect("one car ahead");
        assert!(ahead.sector_delta_ms.iter().all(|&delta| delta < 0));
    }

    #[test]
    fn player_not_in_grid_returns_none() {
        let grid = vec![entry(0, 1, 90_000)];
        assert!(compare_pace(9, &grid, 2).is_none());
    }
}
