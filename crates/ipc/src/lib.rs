//! IPC Surface to Overlays (SPEC_FULL.md §4.7, §6): a second, local-only
//! transport front onto the fan-out bus's own `ClientRegistry`/
//! `RequestServicer`, so HUD overlay processes get the same
//! `race-table`/`player-stream-overlay`/`eng-view`/`hud-ipc` payloads a
//! browser dashboard gets, plus three overlay-only control verbs
//! (`switch-page`, `set-scale`, `ping`) that never cross the WebSocket bus.
//!
//! Transport is loopback TCP everywhere, with a Unix domain socket (or, on
//! Windows, a named pipe) as the platform-native default (§9). Framing is a
//! hand-rolled 4-byte little-endian length prefix around a JSON object,
//! mirroring `pitwall-codec`'s own fixed-width framing convention rather
//! than pulling in a third-party codec crate for one small wire format.

pub mod connection;
pub mod error;
pub mod framing;
pub mod message;
pub mod server;
pub mod transport;

pub use crate::error::{IpcError, IpcResult};
pub use crate::message::{ControlAck, ControlMessage, IpcClientMessage, IpcServerMessage};
pub use crate::server::{IpcConfig, IpcServer};
pub use crate::transport::TransportType;
