//! Derived race analytics (SPEC_FULL.md §4.4).
//!
//! Everything here is a pure function or a small incremental tracker built on
//! top of the [`pitwall_schemas::DriverDetail`]/[`pitwall_schemas::RaceSnapshot`]
//! views the race model already exposes — this crate never touches a decoded
//! packet or a lock directly, so it has no opinion on concurrency and
//! composes with whatever cadence the fan-out bus picks.
//!
//! Lap/sector records and per-compound records are tracked incrementally
//! inside `pitwall-race-model` instead of here: both piggyback directly on
//! the same `apply()` call that already clones and swaps `ModelState`, and
//! splitting them into a second pass over the snapshot would mean either a
//! redundant second history walk or threading mutable analytics state through
//! the model's single-writer discipline for no benefit. `RaceStats` (from
//! `pitwall-race-model`) is the wire type for both, unchanged from how
//! SPEC_FULL.md names them. See DESIGN.md for the full note.

pub mod fuel;
pub mod pace;
pub mod speed_trap;
pub mod tyre_wear;

pub use fuel::{FuelEstimate, FuelEstimator};
pub use pace::{GridEntry, PaceComparison, PaceEntry, compare_pace};
pub use speed_trap::SpeedTrapTracker;
pub use tyre_wear::{CornerWearPrediction, TyreWearForecast, WearFit};
