//! Internal per-participant runtime state and the immutable snapshot it is
//! built from on every write (SPEC_FULL.md §4.3, §5).

use pitwall_schemas::{
    CarStatusSnapshot, CollisionRecord, DamageSnapshot, LapRecord, Participant, ParticipantState,
    ResultStatus, Stint, TyreCompound, TyreSetRecord, WarningEvent,
};

pub const GRID_SIZE: usize = 22;

/// Everything the model tracks for one car slot, beyond the public
/// [`Participant`] view. Cloned wholesale on every `apply()` that touches a
/// given car, per the snapshot-swap discipline in [`crate::RaceModel`].
#[derive(Debug, Clone)]
pub struct ParticipantRuntime {
    pub participant: Participant,
    pub current_lap: LapRecord,
    pub lap_history: Vec<LapRecord>,
    pub stints: Vec<Stint>,
    pub tyre_sets: Vec<TyreSetRecord>,
    pub damage: DamageSnapshot,
    pub car_status: CarStatusSnapshot,
    pub warnings: Vec<WarningEvent>,
    pub collisions: Vec<CollisionRecord>,
    pub grid_position: u8,
    /// The `LapData` sector index (0/1/2) observed on the previous apply,
    /// used to detect a sector crossing (SPEC_FULL.md §4.3.3).
    pub last_sector: u8,
    /// This driver's own best time per sector this session, used for the
    /// live sector-status "green" classification.
    pub personal_best_sectors: [Option<u32>; 3],
}

impl ParticipantRuntime {
    pub fn seed(participant: Participant) -> Self {
        Self {
            participant,
            current_lap: LapRecord::default(),
            lap_history: Vec::new(),
            stints: Vec::new(),
            tyre_sets: Vec::new(),
            damage: DamageSnapshot::default(),
            car_status: CarStatusSnapshot::default(),
            warnings: Vec::new(),
            collisions: Vec::new(),
            grid_position: 0,
            last_sector: 0,
            personal_best_sectors: [None; 3],
        }
    }

    /// Every lap/stint/damage update is suppressed once a participant enters
    /// a terminal state (SPEC_FULL.md §4.3 invariant: a retired driver's lap
    /// count never moves again).
    pub fn accepts_updates(&self) -> bool {
        !self.participant.state.is_terminal()
    }

    pub fn open_stint(&mut self, tyre_set_index: u8, compound: TyreCompound) {
        if let Some(last) = self.stints.last_mut() {
            if last.is_open() {
                last.end_lap = Some(self.current_lap.lap_number);
            }
        }
        self.stints.push(Stint::open(
            self.current_lap.lap_number.max(1),
            tyre_set_index,
            compound,
        ));
    }

    pub fn current_compound(&self) -> Option<TyreCompound> {
        self.stints.last().map(|s| s.compound)
    }

    pub fn set_result_status(&mut self, status: ResultStatus) {
        self.participant.result_status = status;
        self.participant.state = match status {
            ResultStatus::Finished => ParticipantState::Finished,
            ResultStatus::DidNotFinish => ParticipantState::Dnf,
            ResultStatus::Disqualified => ParticipantState::Dsq,
            ResultStatus::Retired => ParticipantState::Retired,
            _ => self.participant.state,
        };
    }
}
