//! Single-writer race-state aggregator.
//!
//! Decoded [`pitwall_codec::Packet`] values are folded into a [`RaceModel`]
//! by exactly one task; any number of reader tasks pull immutable
//! [`pitwall_schemas::RaceSnapshot`]/[`pitwall_schemas::DriverDetail`]/
//! [`pitwall_schemas::RaceStats`] views out of it concurrently.

pub mod error;
pub mod model;
pub mod state;

pub use error::ApplyError;
pub use model::{RaceModel, TelemetrySlot};
pub use state::{GRID_SIZE, ParticipantRuntime};
