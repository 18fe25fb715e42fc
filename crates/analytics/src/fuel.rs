//! Rolling fuel-consumption estimator (SPEC_FULL.md §4.4).

use std::collections::VecDeque;

const GRID_SIZE: usize = 22;
/// Longest history kept per driver; oldest deltas fall off the back.
const MAX_SAMPLES: usize = 10;
/// Window used for the "average remaining" rate.
const AVG_WINDOW: usize = 3;

/// Both fuel-rate variants named in SPEC_FULL.md §9, computed side by side so
/// the client picks which one to display rather than the server guessing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelEstimate {
    /// Mean consumption over the last `min(3, samples)` laps, kg/lap.
    pub rate_avg_remaining_kg: f32,
    /// Linear-regression extrapolation to the very next lap, kg/lap.
    pub rate_next_lap_kg: f32,
    /// `tank_kg / rate_avg_remaining_kg`, or `None` if the rate is non-positive.
    pub remaining_laps: Option<f32>,
}

/// Tracks, per car slot, the last fuel-in-tank reading and a short history of
/// per-lap consumption deltas.
#[derive(Debug, Clone)]
pub struct FuelEstimator {
    last_fuel_kg: [Option<f32>; GRID_SIZE],
    deltas: [VecDeque<f32>; GRID_SIZE],
}

impl Default for FuelEstimator {
    fn default() -> Self {
        Self {
            last_fuel_kg: [None; GRID_SIZE],
            deltas: std::array::from_fn(|_| VecDeque::with_capacity(MAX_SAMPLES)),
        }
    }
}

impl FuelEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per driver at every lap-completion crossing with the
    /// car-status fuel-in-tank reading taken at that instant.
    pub fn record_lap_boundary(&mut self, car_index: u8, fuel_in_tank_kg: f32) {
        let slot = usize::from(car_index);
        let Some(history) = self.deltas.get_mut(slot) else {
            return;
        };
        let Some(last) = self.last_fuel_kg.get_mut(slot) else {
            return;
        };
        if let Some(previous) = *last {
            let consumed = previous - fuel_in_tank_kg;
            if consumed.is_finite() && consumed > 0.0 {
                if history.len() == MAX_SAMPLES {
                    history.pop_front();
                }
                history.push_back(consumed);
            }
        }
        *last = Some(fuel_in_tank_kg);
    }

    /// Current estimate for this driver, or `None` until at least one full
    /// lap of consumption has been observed.
    pub fn estimate(&self, car_index: u8, current_tank_kg: f32) -> Option<FuelEstimate> {
        let slot = usize::from(car_index);
        let history = self.deltas.get(slot)?;
        if history.is_empty() {
            return None;
        }
        let avg_window = history.len().min(AVG_WINDOW);
        let rate_avg_remaining_kg: f32 =
            history.iter().rev().take(avg_window).sum::<f32>() / avg_window as f32;
        let rate_next_lap_kg = next_lap_regression(history).unwrap_or(rate_avg_remaining_kg);
        let remaining_laps = (rate_avg_remaining_kg > 0.0)
            .then(|| current_tank_kg / rate_avg_remaining_kg)
            .filter(|laps| laps.is_finite());
        Some(FuelEstimate {
            rate_avg_remaining_kg,
            rate_next_lap_kg,
            remaining_laps,
        })
    }
}

/// Ordinary least-squares fit of consumption-per-lap against lap index,
/// extrapolated one lap past the most recent sample. Falls back to `None`
/// (caller uses the plain rolling average) when fewer than two points are
/// available or the samples carry no variance in lap index.
fn next_lap_regression(history: &VecDeque<f32>) -> Option<f32> {
    let n = history.len();
    if n < 2 {
        return None;
    }
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let ys: Vec<f64> = history.iter().map(|&v| f64::from(v)).collect();
    let n_f = n as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xx: f64 = xs.iter().map(|x| x * x).sum();
    let sum_xy: f64 = xs.iter().zip(&ys).map(|(x, y)| x * y).sum();
    let denom = n_f * sum_xx - sum_x * sum_x;
    if denom.abs() < 1e-9 {
        return None;
    }
    let slope = (n_f * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n_f;
    let next_x = n_f;
    let predicted = intercept + slope * next_x;
    (predicted.is_finite() && predicted > 0.0).then_some(predicted as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_rate_matches_the_worked_example() {
        let mut estimator = FuelEstimator::new();
        for fuel in [50.0, 48.2, 46.4, 44.6] {
            estimator.record_lap_boundary(0, fuel);
        }
        let estimate = estimator.estimate(0, 20.0).expect("three deltas observed");
        assert!((estimate.rate_avg_remaining_kg - 1.8).abs() < 1e-3);
        let remaining = estimate.remaining_laps.expect("positive rate");
        assert!((remaining - 11.111_11).abs() < 1e-2);
    }

    #[test]
    fn no_laps_completed_yields_no_estimate() {
        let mut estimator = FuelEstimator::new();
        estimator.record_lap_boundary(3, 100.0);
        assert!(estimator.estimate(3, 100.0).is_none());
    }

    #[test]
    fn a_refuel_or_bad_reading_is_not_recorded_as_negative_consumption() {
        let mut estimator = FuelEstimator::new();
        estimator.record_lap_boundary(1, 40.0);
        estimator.record_lap_boundary(1, 45.0);
        estimator.record_lap_boundary(1, 43.0);
        let estimate = estimator.estimate(1, 43.0).expect("one valid delta observed");
        assert!((estimate.rate_avg_remaining_kg - 2.0).abs() < 1e-6);
    }

    #[test]
    fn history_beyond_ten_laps_drops_the_oldest_delta() {
        let mut estimator = FuelEstimator::new();
        let mut fuel = 100.0_f32;
        estimator.record_lap_boundary(0, fuel);
        for _ in 0..12 {
            fuel -= 1.0;
            estimator.record_lap_boundary(0, fuel);
        }
        assert_eq!(estimator.deltas[0].len(), MAX_SAMPLES);
    }
}
