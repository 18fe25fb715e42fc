//! Event packet (id 3). Transient; carries a 4-byte ASCII event code plus a
//! code-specific detail payload (SPEC_FULL.md §4.1, §4.3.4).

use crate::DecodeError;
use crate::enums::EventCode;
use crate::header::{PacketHeader, parse_header};
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy)]
pub struct FastestLapDetail {
    pub vehicle_idx: u8,
    pub lap_time_sec: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct RetirementDetail {
    pub vehicle_idx: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct PenaltyDetail {
    pub penalty_kind_raw: u8,
    pub infringement_type_raw: u8,
    pub vehicle_idx: u8,
    pub other_vehicle_idx: u8,
    pub time_sec: u8,
    pub lap_num: u8,
    pub places_gained: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct SpeedTrapDetail {
    pub vehicle_idx: u8,
    pub speed_kmph: f32,
    pub is_overall_fastest: bool,
    pub is_driver_fastest: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct StartLightsDetail {
    pub num_lights: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct DriveThroughPenaltyServedDetail {
    pub vehicle_idx: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct StopGoPenaltyServedDetail {
    pub vehicle_idx: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct FlashbackDetail {
    pub flashback_frame_identifier: u32,
    pub flashback_session_time_sec: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct OvertakeDetail {
    pub overtaking_vehicle_idx: u8,
    pub being_overtaken_vehicle_idx: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionDetail {
    pub vehicle_idx: u8,
    pub other_vehicle_idx: u8,
}

/// Raw button bitfield (id `BUTN`), polled at the game's input rate rather
/// than per-press; `--udp-custom-action-code` tests a single bit of
/// `button_flags` against the configured code to inject a Custom Marker.
#[derive(Debug, Clone, Copy)]
pub struct ButtonStatusDetail {
    pub button_flags: u32,
}

#[derive(Debug, Clone, Copy)]
pub enum EventDetail {
    FastestLap(FastestLapDetail),
    Retirement(RetirementDetail),
    Penalty(PenaltyDetail),
    SpeedTrap(SpeedTrapDetail),
    StartLights(StartLightsDetail),
    DriveThroughServed(DriveThroughPenaltyServedDetail),
    StopGoServed(StopGoPenaltyServedDetail),
    Flashback(FlashbackDetail),
    Overtake(OvertakeDetail),
    Collision(CollisionDetail),
    ButtonStatus(ButtonStatusDetail),
    None,
}

#[derive(Debug, Clone)]
pub struct EventPacket {
    pub header: PacketHeader,
    pub code: EventCode,
    pub detail: EventDetail,
}

fn parse_detail(code: EventCode, r: &mut ByteReader<'_>) -> Result<EventDetail, DecodeError> {
    Ok(match code {
        EventCode::FastestLap => EventDetail::FastestLap(FastestLapDetail {
            vehicle_idx: r.read_u8()?,
            lap_time_sec: r.read_f32()?,
        }),
        EventCode::Retirement => EventDetail::Retirement(RetirementDetail {
            vehicle_idx: r.read_u8()?,
        }),
        EventCode::PenaltyIssued => EventDetail::Penalty(PenaltyDetail {
            penalty_kind_raw: r.read_u8()?,
            infringement_type_raw: r.read_u8()?,
            vehicle_idx: r.read_u8()?,
            other_vehicle_idx: r.read_u8()?,
            time_sec: r.read_u8()?,
            lap_num: r.read_u8()?,
            places_gained: r.read_u8()?,
        }),
        EventCode::SpeedTrapTriggered => EventDetail::SpeedTrap(SpeedTrapDetail {
            vehicle_idx: r.read_u8()?,
            speed_kmph: r.read_f32()?,
            is_overall_fastest: r.read_u8()? != 0,
            is_driver_fastest: r.read_u8()? != 0,
        }),
        EventCode::StartLights => EventDetail::StartLights(StartLightsDetail {
            num_lights: r.read_u8()?,
        }),
        EventCode::DriveThroughServed => {
            EventDetail::DriveThroughServed(DriveThroughPenaltyServedDetail {
                vehicle_idx: r.read_u8()?,
            })
        }
        EventCode::StopGoServed => EventDetail::StopGoServed(StopGoPenaltyServedDetail {
            vehicle_idx: r.read_u8()?,
        }),
        EventCode::Flashback => EventDetail::Flashback(FlashbackDetail {
            flashback_frame_identifier: r.read_u32()?,
            flashback_session_time_sec: r.read_f32()?,
        }),
        EventCode::Overtake => EventDetail::Overtake(OvertakeDetail {
            overtaking_vehicle_idx: r.read_u8()?,
            being_overtaken_vehicle_idx: r.read_u8()?,
        }),
        EventCode::Collision => EventDetail::Collision(CollisionDetail {
            vehicle_idx: r.read_u8()?,
            other_vehicle_idx: r.read_u8()?,
        }),
        EventCode::ButtonStatus => EventDetail::ButtonStatus(ButtonStatusDetail {
            button_flags: r.read_u32()?,
        }),
        _ => EventDetail::None,
    })
}

pub fn parse(bytes: &[u8]) -> Result<EventPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let raw_code = [r.read_u8()?, r.read_u8()?, r.read_u8()?, r.read_u8()?];
    let code = EventCode::from_ascii(raw_code);
    let detail = parse_detail(code, &mut r)?;
    Ok(EventPacket {
        header,
        code,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    #[test]
    fn decodes_fastest_lap_event() {
        let mut bytes = build_header_bytes(2025, 3, 1, 1);
        bytes.extend_from_slice(b"FTLP");
        bytes.push(4); // vehicle idx
        bytes.extend_from_slice(&92.345f32.to_le_bytes());
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.code, EventCode::FastestLap);
        match packet.detail {
            EventDetail::FastestLap(d) => {
                assert_eq!(d.vehicle_idx, 4);
                assert!((d.lap_time_sec - 92.345).abs() < 1e-4);
            }
            _ => panic!("wrong detail variant"),
        }
    }

    #[test]
    fn decodes_session_started_with_no_detail() {
        let mut bytes = build_header_bytes(2025, 3, 1, 1);
        bytes.extend_from_slice(b"SSTA");
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.code, EventCode::SessionStarted);
        assert!(matches!(packet.detail, EventDetail::None));
    }

    #[test]
    fn decodes_button_status_event() {
        let mut bytes = build_header_bytes(2025, 3, 1, 1);
        bytes.extend_from_slice(b"BUTN");
        bytes.extend_from_slice(&0x0001_0000u32.to_le_bytes());
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.code, EventCode::ButtonStatus);
        match packet.detail {
            EventDetail::ButtonStatus(d) => assert_eq!(d.button_flags, 0x0001_0000),
            _ => panic!("wrong detail variant"),
        }
    }

    #[test]
    fn unknown_event_code_is_preserved_raw() {
        let mut bytes = build_header_bytes(2025, 3, 1, 1);
        bytes.extend_from_slice(b"ZZZZ");
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.code, EventCode::Unknown(*b"ZZZZ"));
    }
}
