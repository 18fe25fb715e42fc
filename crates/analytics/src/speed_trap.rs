//! Per-driver maximum speed-trap reading across the session (SPEC_FULL.md
//! §4.4).

const GRID_SIZE: usize = 22;

#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedTrapTracker {
    fastest_kmph: [Option<f32>; GRID_SIZE],
}

impl SpeedTrapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds in one speed-trap reading; keeps the higher of the new reading
    /// and whatever was already recorded for this car.
    pub fn record(&mut self, car_index: u8, speed_kmph: f32) {
        if !speed_kmph.is_finite() || speed_kmph < 0.0 {
            return;
        }
        let Some(slot) = self.fastest_kmph.get_mut(usize::from(car_index)) else {
            return;
        };
        *slot = Some(slot.map_or(speed_kmph, |current| current.max(speed_kmph)));
    }

    pub fn fastest(&self, car_index: u8) -> Option<f32> {
        self.fastest_kmph.get(usize::from(car_index)).copied().flatten()
    }

    /// Resets every driver's reading, used on a session-UID change.
    pub fn reset(&mut self) {
        self.fastest_kmph = [None; GRID_SIZE];
    }
}
