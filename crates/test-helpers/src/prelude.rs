//! Convenience re-exports for common test utilities.
//!
//! Import this module to get access to the most commonly used test helpers:
//!
//! ```rust,ignore
//! use pitwall_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_or_else, must_parse, must_some, must_some_or, must_with};

#[cfg(feature = "mock")]
pub use crate::must::{must_async, must_some_async};

#[cfg(feature = "tracking")]
pub use crate::tracking::{AllocationGuard, AllocationReport, track};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{
    fastest_lap_event_fixture, header_fixture, lap_data_packet_fixture,
    participants_packet_fixture, session_packet_fixture, synthetic_session,
};

#[cfg(feature = "mock")]
pub use crate::mock::{MockSnapshotProvider, ScriptedDatagramSource};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
