//! Packet and session builders for tests across the workspace.
//!
//! These mirror the shapes `pitwall-codec::decode` would hand the
//! decode/apply loop, built directly from the public struct literals
//! instead of round-tripping through the wire format — callers that need
//! wire-level coverage belong in `pitwall-codec`'s own `test_support`
//! module, not here.

use pitwall_codec::Packet;
use pitwall_codec::event::{EventDetail, EventPacket, FastestLapDetail};
use pitwall_codec::header::{PacketHeader, PacketId};
use pitwall_codec::lap_data::{CarLapData, LapDataPacket};
use pitwall_codec::participants::ParticipantsPacket;
use pitwall_codec::session::SessionPacket;
use pitwall_schemas::{GameYear, Participant, ParticipantState, ResultStatus, Session};

/// A header for `packet_id`, with everything else at a reasonable default.
/// `frame_id` ordering matters to `RaceModel::apply`'s stale-frame check;
/// pass an increasing sequence across a builder call chain.
pub fn header_fixture(packet_id: PacketId, session_uid: u64, frame_id: u32) -> PacketHeader {
    PacketHeader {
        packet_format: 2025,
        game_year: GameYear::F1_25,
        game_major_version: 1,
        game_minor_version: 0,
        packet_version: 1,
        packet_id_raw: packet_id as u8,
        session_uid,
        session_time_sec: 0.0,
        frame_id,
        overall_frame_identifier: 0,
        player_car_index: 0,
        secondary_player_car_index: 255,
    }
}

pub fn session_packet_fixture(session_uid: u64) -> Packet {
    Packet::Session(SessionPacket {
        header: header_fixture(PacketId::Session, session_uid, 1),
        session: Session::seed(session_uid, GameYear::F1_25),
    })
}

/// `count` participants, car index 0 the player, the rest AI.
pub fn participants_packet_fixture(session_uid: u64, count: u8) -> Packet {
    let participants = (0..count)
        .map(|car_index| Participant {
            car_index,
            name: format!("Driver {car_index}"),
            team_id: car_index,
            is_player: car_index == 0,
            is_ai: car_index != 0,
            is_spectating: false,
            network_id: 0,
            telemetry_visible: true,
            state: ParticipantState::Racing,
            result_status: ResultStatus::Active,
            finishing_position: None,
        })
        .collect();
    Packet::Participants(ParticipantsPacket {
        header: header_fixture(PacketId::Participants, session_uid, 1),
        num_active_cars: count,
        participants,
    })
}

/// A lap-data packet for a 22-car grid with `cars[car_index]` set to the
/// given lap/time and every other slot defaulted.
pub fn lap_data_packet_fixture(
    session_uid: u64,
    frame_id: u32,
    car_index: u8,
    lap_number: u8,
    last_lap_time_ms: u32,
) -> Packet {
    let mut cars = vec![CarLapData::default(); 22];
    if let Some(slot) = cars.get_mut(car_index as usize) {
        slot.current_lap_num = lap_number;
        slot.last_lap_time_ms = last_lap_time_ms;
    }
    Packet::LapData(LapDataPacket {
        header: header_fixture(PacketId::LapData, session_uid, frame_id),
        cars,
    })
}

pub fn fastest_lap_event_fixture(session_uid: u64, frame_id: u32, vehicle_idx: u8) -> Packet {
    Packet::Event(EventPacket {
        header: header_fixture(PacketId::Event, session_uid, frame_id),
        code: pitwall_codec::enums::EventCode::FastestLap,
        detail: EventDetail::FastestLap(FastestLapDetail {
            vehicle_idx,
            lap_time_sec: 90.0,
        }),
    })
}

/// A deterministic session: `Session` + `Participants` for `driver_count`
/// cars, then two `LapData` frames that complete one lap for car 0. Feeding
/// these through `RaceModel::apply` in order leaves car 0 with exactly one
/// lap in its history, a fastest-lap record, and no other state populated —
/// a fixed starting point for tests that only care about what happens next.
pub fn synthetic_session(session_uid: u64, driver_count: u8) -> Vec<Packet> {
    vec![
        session_packet_fixture(session_uid),
        participants_packet_fixture(session_uid, driver_count),
        lap_data_packet_fixture(session_uid, 2, 0, 1, 0),
        lap_data_packet_fixture(session_uid, 3, 0, 2, 91_234),
    ]
}

/// Proptest strategies for arbitrary well-formed packet sequences.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    /// A lap number/lap-time-ms pair in the ranges the game actually emits.
    pub fn arb_lap() -> impl Strategy<Value = (u8, u32)> {
        (1u8..=78, 60_000u32..180_000)
    }

    /// A driver grid size the participants packet can legally carry.
    pub fn arb_driver_count() -> impl Strategy<Value = u8> {
        1u8..=22
    }

    /// A `synthetic_session` varied by session uid, grid size, and the
    /// completed lap's number/time, still internally consistent (frame ids
    /// increasing, `cars[0]`'s lap number increasing across the two
    /// `LapData` frames).
    pub fn arb_synthetic_session() -> impl Strategy<Value = Vec<Packet>> {
        (any::<u64>(), arb_driver_count(), arb_lap()).prop_map(
            |(session_uid, driver_count, (lap_number, lap_time_ms))| {
                vec![
                    session_packet_fixture(session_uid),
                    participants_packet_fixture(session_uid, driver_count),
                    lap_data_packet_fixture(
                        session_uid,
                        2,
                        0,
                        lap_number.saturating_sub(1).max(1),
                        0,
                    ),
                    lap_data_packet_fixture(session_uid, 3, 0, lap_number, lap_time_ms),
                ]
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_session_applies_cleanly_and_completes_one_lap() {
        let model = pitwall_race_model::RaceModel::new();
        for packet in synthetic_session(77, 10) {
            model.apply(&packet).expect("fixture packets are well-formed");
        }
        let detail = model.driver_detail(0).expect("car 0 seeded");
        assert_eq!(detail.lap_history.len(), 1);
        assert_eq!(detail.lap_history[0].lap_time_ms, 91_234);
    }
}
