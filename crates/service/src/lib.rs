//! `pitwalld`: wires the Ingress Listener, Race Model, derived analytics,
//! fan-out bus, IPC surface, forwarders, and session recorder into one
//! process (SPEC_FULL.md §2, §9).

pub mod daemon;
pub mod error;
pub mod observability;
pub mod provider;
pub mod replay;

pub use daemon::Daemon;
pub use error::DaemonError;
