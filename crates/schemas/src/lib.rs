//! Wire and domain schema types shared between the race model, the derived
//! analytics, and the fan-out/IPC surfaces.
//!
//! Everything in [`telemetry`] is what actually crosses a process boundary
//! (WebSocket frame, IPC frame, or session-archive document) — it is kept
//! deliberately free of any internal bookkeeping the race model needs but a
//! consumer never sees.

#![deny(static_mut_refs)]

pub mod telemetry;

pub use telemetry::*;
