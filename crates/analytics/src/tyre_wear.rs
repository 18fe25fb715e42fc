//! Degree-2 least-squares tyre-wear predictor (SPEC_FULL.md §4.4).
//!
//! Polynomial fit uses `f64` throughout; a singular or near-singular normal
//! equations matrix falls back to a linear fit over the same samples, and a
//! linear fit with fewer than two points falls back to "not enough data".

use pitwall_schemas::TyreWearSample;

/// Result of fitting one corner's wear history.
#[derive(Debug, Clone, PartialEq)]
pub enum WearFit {
    /// `a + b*x + c*x^2`, coefficients low-to-high degree.
    Quadratic([f64; 3]),
    /// `a + b*x`.
    Linear([f64; 2]),
    /// Fewer than two usable samples.
    Insufficient,
}

impl WearFit {
    /// Evaluate at `lap_in_stint`, clamped to `[0, 100]` (wear can never
    /// exceed full tyre life and the model never reports negative wear).
    pub fn evaluate(&self, lap_in_stint: f64) -> Option<f32> {
        let raw = match self {
            WearFit::Quadratic([a, b, c]) => a + b * lap_in_stint + c * lap_in_stint * lap_in_stint,
            WearFit::Linear([a, b]) => a + b * lap_in_stint,
            WearFit::Insufficient => return None,
        };
        Some(raw.clamp(0.0, 100.0) as f32)
    }

    fn fit(points: &[(f64, f64)]) -> Self {
        if points.len() >= 3 {
            if let Some(coeffs) = fit_polynomial(points, 2) {
                return WearFit::Quadratic([coeffs[0], coeffs[1], coeffs[2]]);
            }
        }
        if points.len() >= 2 {
            if let Some(coeffs) = fit_polynomial(points, 1) {
                return WearFit::Linear([coeffs[0], coeffs[1]]);
            }
        }
        WearFit::Insufficient
    }
}

/// Per-corner wear forecast for one open stint.
#[derive(Debug, Clone, PartialEq)]
pub struct TyreWearForecast {
    pub front_left: WearFit,
    pub front_right: WearFit,
    pub rear_left: WearFit,
    pub rear_right: WearFit,
}

/// A prediction evaluated at a single lap-in-stint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerWearPrediction {
    pub front_left_pct: f32,
    pub front_right_pct: f32,
    pub rear_left_pct: f32,
    pub rear_right_pct: f32,
    pub average_pct: f32,
    pub max_pct: f32,
}

impl TyreWearForecast {
    pub fn fit(samples: &[TyreWearSample]) -> Self {
        let xy = |pick: fn(&TyreWearSample) -> f32| -> Vec<(f64, f64)> {
            samples
                .iter()
                .map(|s| (f64::from(s.lap_in_stint), f64::from(pick(s))))
                .collect()
        };
        Self {
            front_left: WearFit::fit(&xy(|s| s.front_left_pct)),
            front_right: WearFit::fit(&xy(|s| s.front_right_pct)),
            rear_left: WearFit::fit(&xy(|s| s.rear_left_pct)),
            rear_right: WearFit::fit(&xy(|s| s.rear_right_pct)),
        }
    }

    /// Extrapolate all four corners to `lap_in_stint`. `None` if any corner
    /// lacks enough samples to produce a fit — since all four corners share
    /// the same `lap_in_stint` x-values, in practice they succeed or fail
    /// together.
    pub fn predict_lap(&self, lap_in_stint: u16) -> Option<CornerWearPrediction> {
        let lap = f64::from(lap_in_stint);
        let fl = self.front_left.evaluate(lap)?;
        let fr = self.front_right.evaluate(lap)?;
        let rl = self.rear_left.evaluate(lap)?;
        let rr = self.rear_right.evaluate(lap)?;
        let average = (fl + fr + rl + rr) / 4.0;
        let max = fl.max(fr).max(rl).max(rr);
        Some(CornerWearPrediction {
            front_left_pct: fl,
            front_right_pct: fr,
            rear_left_pct: rl,
            rear_right_pct: rr,
            average_pct: average,
            max_pct: max,
        })
    }

    /// First lap, scanning forward from `from_lap_in_stint + 1`, at which the
    /// average-corner prediction crosses `threshold_pct`. Clamped to
    /// `race_remaining_laps`. This is a heuristic annotation, not a
    /// game-reported value (SPEC_FULL.md §9) — callers must not treat it as
    /// authoritative.
    pub fn selected_pit_lap(
        &self,
        from_lap_in_stint: u16,
        race_remaining_laps: u16,
        threshold_pct: f32,
    ) -> Option<u16> {
        let last_lap = from_lap_in_stint.checked_add(race_remaining_laps)?;
        for lap in (from_lap_in_stint + 1)..=last_lap {
            if let Some(prediction) = self.predict_lap(lap) {
                if prediction.average_pct >= threshold_pct {
                    return Some(lap);
                }
            }
        }
        None
    }
}

/// Fits an ordinary-least-squares polynomial of the given degree via the
/// normal equations, solved by Gauss-Jordan elimination with partial
/// pivoting. Returns `None` on a singular (or near-singular) system.
fn fit_polynomial(points: &[(f64, f64)], degree: usize) -> Option<Vec<f64>> {
    let terms = degree + 1;
    let mut power_sums = vec![0.0_f64; 2 * degree + 1];
    let mut rhs_sums = vec![0.0_f64; terms];
    for &(x, y) in points {
        let mut power = 1.0_f64;
        for sum in power_sums.iter_mut() {
            *sum += power;
            power *= x;
        }
        let mut power = 1.0_f64;
        for sum in rhs_sums.iter_mut() {
            *sum += power * y;
            power *= x;
        }
    }

    let mut augmented = vec![vec![0.0_f64; terms + 1]; terms];
    for (row, slot) in augmented.iter_mut().enumerate() {
        for (col, cell) in slot.iter_mut().take(terms).enumerate() {
            *cell = *power_sums.get(row + col)?;
        }
        *slot.get_mut(terms)? = *rhs_sums.get(row)?;
    }

    gauss_jordan(augmented)
}

fn gauss_jordan(mut matrix: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let n = matrix.len();
    const PIVOT_EPSILON: f64 = 1e-9;
    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_magnitude = 0.0_f64;
        for (row, candidate) in matrix.iter().enumerate().skip(col) {
            let value = candidate.get(col)?.abs();
            if value > pivot_magnitude {
                pivot_magnitude = value;
                pivot_row = row;
            }
        }
        if pivot_magnitude < PIVOT_EPSILON {
            return None;
        }
        matrix.swap(col, pivot_row);
        let pivot_value = *matrix.get(col)?.get(col)?;
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = *matrix.get(row)?.get(col)? / pivot_value;
            for c in col..=n {
                let pivot_cell = *matrix.get(col)?.get(c)?;
                *matrix.get_mut(row)?.get_mut(c)? -= factor * pivot_cell;
            }
        }
    }
    let mut solution = Vec::with_capacity(n);
    for i in 0..n {
        let row = matrix.get(i)?;
        solution.push(*row.get(n)? / *row.get(i)?);
    }
    Some(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lap: u16, pct: f32) -> TyreWearSample {
        TyreWearSample {
            lap_in_stint: lap,
            front_left_pct: pct,
            front_right_pct: pct,
            rear_left_pct: pct,
            rear_right_pct: pct,
        }
    }

    #[test]
    fn three_points_on_a_line_fit_exactly() {
        let samples = [sample(1, 2.0), sample(2, 4.0), sample(3, 6.0)];
        let forecast = TyreWearForecast::fit(&samples);
        let prediction = forecast.predict_lap(10).expect("enough samples to fit");
        assert!((prediction.average_pct - 20.0).abs() < 1e-3);
    }

    #[test]
    fn extrapolation_never_exceeds_a_hundred_percent() {
        let samples = [sample(1, 40.0), sample(2, 70.0), sample(3, 95.0)];
        let forecast = TyreWearForecast::fit(&samples);
        let prediction = forecast.predict_lap(50).expect("enough samples to fit");
        assert!(prediction.average_pct <= 100.0);
        assert!(prediction.max_pct <= 100.0);
    }

    #[test]
    fn fewer_than_two_samples_reports_insufficient_data() {
        let samples = [sample(1, 10.0)];
        let forecast = TyreWearForecast::fit(&samples);
        assert_eq!(forecast.front_left, WearFit::Insufficient);
        assert!(forecast.predict_lap(5).is_none());
    }

    #[test]
    fn a_singular_quadratic_falls_back_to_a_linear_fit() {
        // Only two distinct lap indices among the three samples: the
        // quadratic normal equations are rank-deficient, so the fit must
        // drop to a line through the same points instead of failing outright.
        let samples = [sample(1, 10.0), sample(1, 12.0), sample(3, 20.0)];
        let forecast = TyreWearForecast::fit(&samples);
        assert!(matches!(forecast.front_left, WearFit::Linear(_)));
    }

    #[test]
    fn identical_lap_indices_throughout_are_insufficient_for_any_fit() {
        let samples = [sample(4, 30.0), sample(4, 30.0), sample(4, 30.0)];
        let forecast = TyreWearForecast::fit(&samples);
        assert_eq!(forecast.front_left, WearFit::Insufficient);
    }

    #[test]
    fn selected_pit_lap_crosses_the_configured_threshold() {
        let samples = [sample(1, 10.0), sample(2, 20.0), sample(3, 30.0)];
        let forecast = TyreWearForecast::fit(&samples);
        let pit_lap = forecast
            .selected_pit_lap(3, 20, 80.0)
            .expect("wear crosses 80% within the remaining race distance");
        let prediction = forecast.predict_lap(pit_lap).expect("fitted corners");
        assert!(prediction.average_pct >= 80.0);
    }
}
