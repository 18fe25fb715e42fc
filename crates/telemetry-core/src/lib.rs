//! Ingress Listener (SPEC_FULL.md §4.2): owns the UDP receive socket, decodes
//! each datagram, and feeds decoded packets to the decoder/apply task over a
//! bounded queue with the spec's own backpressure policy. Also tracks
//! upstream connection health and per-kind decode-error tallies so the
//! service layer can log them without polling anything.

#![deny(static_mut_refs)]

pub mod connection;
pub mod counters;
pub mod ingress;
pub mod queue;

pub use connection::{ConnectionHealth, ConnectionState};
pub use counters::ErrorTally;
pub use ingress::{IngressConfig, IngressListener, RawDatagramSource};
pub use queue::{PacketClass, PacketQueue};
