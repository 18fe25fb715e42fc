//! Packet header: the version-stamped prefix every F1 UDP packet shares.

use crate::DecodeError;
use crate::reader::ByteReader;
use pitwall_schemas::GameYear;

/// Fixed across the 2023/2024/2025 packet formats (SPEC_FULL.md §4.1 open
/// question #1: layout differences are confined to per-packet-kind bodies,
/// never the header): 2 (format) + 1 + 1 + 1 (versions) + 1 (packet id) +
/// 8 (session uid) + 4 (session time) + 4 (frame id) + 4 (overall frame id) +
/// 1 + 1 (player / secondary player car index).
pub const HEADER_SIZE: usize = 29;

/// One of the ~13-15 packet kinds the game emits, keyed by its wire id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketId {
    Motion,
    Session,
    LapData,
    Event,
    Participants,
    CarSetups,
    CarTelemetry,
    CarStatus,
    FinalClassification,
    LobbyInfo,
    CarDamage,
    SessionHistory,
    TyreSets,
    MotionEx,
    TimeTrial,
}

impl PacketId {
    pub fn from_wire(id: u8) -> Option<Self> {
        Some(match id {
            0 => Self::Motion,
            1 => Self::Session,
            2 => Self::LapData,
            3 => Self::Event,
            4 => Self::Participants,
            5 => Self::CarSetups,
            6 => Self::CarTelemetry,
            7 => Self::CarStatus,
            8 => Self::FinalClassification,
            9 => Self::LobbyInfo,
            10 => Self::CarDamage,
            11 => Self::SessionHistory,
            12 => Self::TyreSets,
            13 => Self::MotionEx,
            14 => Self::TimeTrial,
            _ => return None,
        })
    }
}

/// The header every packet kind is prefixed with.
#[derive(Debug, Clone, Copy)]
pub struct PacketHeader {
    pub packet_format: u16,
    pub game_year: GameYear,
    pub game_major_version: u8,
    pub game_minor_version: u8,
    pub packet_version: u8,
    pub packet_id_raw: u8,
    pub session_uid: u64,
    pub session_time_sec: f32,
    pub frame_id: u32,
    pub overall_frame_identifier: u32,
    pub player_car_index: u8,
    pub secondary_player_car_index: u8,
}

impl PacketHeader {
    pub fn packet_id(&self) -> Option<PacketId> {
        PacketId::from_wire(self.packet_id_raw)
    }
}

pub fn parse_header(reader: &mut ByteReader<'_>) -> Result<PacketHeader, DecodeError> {
    let packet_format = reader.read_u16()?;
    let game_year = GameYear::from_packet_format(packet_format).ok_or(
        DecodeError::UnsupportedFormatYear {
            format: packet_format,
        },
    )?;
    let game_major_version = reader.read_u8()?;
    let game_minor_version = reader.read_u8()?;
    let packet_version = reader.read_u8()?;
    let packet_id_raw = reader.read_u8()?;
    let session_uid = reader.read_u64()?;
    let session_time_sec = reader.read_f32()?;
    let frame_id = reader.read_u32()?;
    let overall_frame_identifier = reader.read_u32()?;
    let player_car_index = reader.read_u8()?;
    let secondary_player_car_index = reader.read_u8()?;

    Ok(PacketHeader {
        packet_format,
        game_year,
        game_major_version,
        game_minor_version,
        packet_version,
        packet_id_raw,
        session_uid,
        session_time_sec,
        frame_id,
        overall_frame_identifier,
        player_car_index,
        secondary_player_car_index,
    })
}
