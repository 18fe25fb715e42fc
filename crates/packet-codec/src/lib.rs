//! Binary decoder for the F1 (23/24/25) UDP telemetry protocol.
//!
//! Every packet kind is decoded through a shared [`ByteReader`] cursor: the
//! header first, then a kind-specific body. [`decode`] is the single entry
//! point — it reads the header, dispatches on [`header::PacketId`], and
//! returns a tagged [`Packet`]. Nothing here mutates shared state; that is
//! the race model's job.

pub mod car_damage;
pub mod car_setups;
pub mod car_status;
pub mod car_telemetry;
pub mod enums;
pub mod event;
pub mod final_classification;
pub mod header;
pub mod lap_data;
pub mod lobby_info;
pub mod motion;
pub mod participants;
pub mod reader;
pub mod session;
pub mod session_history;
pub mod time_trial;
pub mod tyre_sets;

#[cfg(test)]
pub mod test_support;

use thiserror::Error;

/// Everything that can go wrong decoding a single UDP datagram. None of
/// these panic — a malformed or truncated datagram from the game (or a
/// stray packet from something else entirely on the same port) is an
/// ordinary `Err`, not a crash (SPEC_FULL.md §4.1, §7).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("short read: wanted {wanted} bytes, {available} available")]
    ShortRead { wanted: usize, available: usize },

    #[error("unsupported packet format year: {format}")]
    UnsupportedFormatYear { format: u16 },

    #[error("unknown packet id: {id}")]
    UnknownPacketId { id: u8 },

    #[error("enum value {value} out of range for {field}")]
    EnumOutOfRange { field: &'static str, value: u32 },
}

/// One decoded UDP packet, tagged by kind.
#[derive(Debug, Clone)]
pub enum Packet {
    Motion(motion::MotionPacket),
    Session(session::SessionPacket),
    LapData(lap_data::LapDataPacket),
    Event(event::EventPacket),
    Participants(participants::ParticipantsPacket),
    CarSetups(car_setups::CarSetupsPacket),
    CarTelemetry(car_telemetry::CarTelemetryPacket),
    CarStatus(car_status::CarStatusPacket),
    FinalClassification(final_classification::FinalClassificationPacket),
    LobbyInfo(lobby_info::LobbyInfoPacket),
    CarDamage(car_damage::CarDamagePacket),
    SessionHistory(session_history::SessionHistoryPacket),
    TyreSets(tyre_sets::TyreSetsPacket),
    MotionEx(motion::MotionExPacket),
    TimeTrial(time_trial::TimeTrialPacket),
}

impl Packet {
    pub fn header(&self) -> &header::PacketHeader {
        match self {
            Packet::Motion(p) => &p.header,
            Packet::Session(p) => &p.header,
            Packet::LapData(p) => &p.header,
            Packet::Event(p) => &p.header,
            Packet::Participants(p) => &p.header,
            Packet::CarSetups(p) => &p.header,
            Packet::CarTelemetry(p) => &p.header,
            Packet::CarStatus(p) => &p.header,
            Packet::FinalClassification(p) => &p.header,
            Packet::LobbyInfo(p) => &p.header,
            Packet::CarDamage(p) => &p.header,
            Packet::SessionHistory(p) => &p.header,
            Packet::TyreSets(p) => &p.header,
            Packet::MotionEx(p) => &p.header,
            Packet::TimeTrial(p) => &p.header,
        }
    }
}

/// Decode one raw UDP datagram into a tagged [`Packet`].
///
/// Reads the header once to discover the packet id, then re-parses from the
/// start through the kind-specific decoder (each decoder re-reads the
/// header itself; it is cheap and keeps every decoder self-contained and
/// independently testable).
pub fn decode(bytes: &[u8]) -> Result<Packet, DecodeError> {
    let mut peek = reader::ByteReader::new(bytes);
    let head = header::parse_header(&mut peek)?;
    let id = head.packet_id().ok_or(DecodeError::UnknownPacketId {
        id: head.packet_id_raw,
    })?;

    Ok(match id {
        header::PacketId::Motion => Packet::Motion(motion::parse(bytes)?),
        header::PacketId::Session => Packet::Session(session::parse(bytes)?),
        header::PacketId::LapData => Packet::LapData(lap_data::parse(bytes)?),
        header::PacketId::Event => Packet::Event(event::parse(bytes)?),
        header::PacketId::Participants => Packet::Participants(participants::parse(bytes)?),
        header::PacketId::CarSetups => Packet::CarSetups(car_setups::parse(bytes)?),
        header::PacketId::CarTelemetry => Packet::CarTelemetry(car_telemetry::parse(bytes)?),
        header::PacketId::CarStatus => Packet::CarStatus(car_status::parse(bytes)?),
        header::PacketId::FinalClassification => {
            Packet::FinalClassification(final_classification::parse(bytes)?)
        }
        header::PacketId::LobbyInfo => Packet::LobbyInfo(lobby_info::parse(bytes)?),
        header::PacketId::CarDamage => Packet::CarDamage(car_damage::parse(bytes)?),
        header::PacketId::SessionHistory => {
            Packet::SessionHistory(session_history::parse(bytes)?)
        }
        header::PacketId::TyreSets => Packet::TyreSets(tyre_sets::parse(bytes)?),
        header::PacketId::MotionEx => Packet::MotionEx(motion::parse_ex(bytes)?),
        header::PacketId::TimeTrial => Packet::TimeTrial(time_trial::parse(bytes)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_packet_id_is_an_error_not_a_panic() {
        let bytes = test_support::build_header_bytes(2025, 255, 1, 1);
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::UnknownPacketId { id: 255 })
        ));
    }

    #[test]
    fn truncated_datagram_is_a_short_read_error() {
        let bytes = vec![0u8; 4];
        assert!(matches!(decode(&bytes), Err(DecodeError::ShortRead { .. })));
    }
}
