//! Recording & Playback (SPEC_FULL.md §4.10): the two persisted-artifact
//! formats named in §6 — packet captures and session archives — plus
//! reading them back for `--replay-server` and offline analysis.

#![deny(static_mut_refs)]

pub mod archive;
pub mod capture;

pub use archive::{
    DriverDamage, DriverLapHistory, DriverTyreSets, DriverWarnings, FinalClassificationEntry,
    SessionArchive, archive_filename,
};
pub use capture::{CaptureReader, CaptureRecord, CaptureWriter};
