//! Participants packet (id 4). State-class; seeds the race model's roster
//! (SPEC_FULL.md §4.3.1).

use crate::DecodeError;
use crate::header::{PacketHeader, parse_header};
use crate::motion::NUM_CARS;
use crate::reader::ByteReader;
use pitwall_schemas::Participant;

#[derive(Debug, Clone)]
pub struct ParticipantsPacket {
    pub header: PacketHeader,
    pub num_active_cars: u8,
    pub participants: Vec<Participant>,
}

fn parse_one(
    r: &mut ByteReader<'_>,
    car_index: u8,
    player_car_index: u8,
) -> Result<Participant, DecodeError> {
    let ai_controlled = r.read_u8()? != 0;
    r.skip(1)?; // driver id
    let network_id = r.read_u8()?;
    let team_id = r.read_u8()?;
    r.skip(1)?; // my-team flag
    r.skip(1)?; // race number
    r.skip(1)?; // nationality
    let name = r.read_fixed_str(48)?;
    let telemetry_visible = r.read_u8()? != 0;
    r.skip(1)?; // show-online-names
    r.skip(2)?; // platform / tech-level trailer, format-year dependent

    Ok(Participant {
        car_index,
        name,
        team_id,
        is_player: car_index == player_car_index,
        is_ai: ai_controlled,
        is_spectating: false,
        network_id,
        telemetry_visible,
        state: Default::default(),
        result_status: Default::default(),
        finishing_position: None,
    })
}

pub fn parse(bytes: &[u8]) -> Result<ParticipantsPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let num_active_cars = r.read_u8()?;
    let mut participants = Vec::with_capacity(NUM_CARS);
    for idx in 0..NUM_CARS as u8 {
        participants.push(parse_one(&mut r, idx, header.player_car_index)?);
    }
    Ok(ParticipantsPacket {
        header,
        num_active_cars,
        participants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_header_bytes, build_header_bytes_with_player};

    const ENTRY_SIZE: usize = 60; // ai(1)+driver(1)+network(1)+team(1)+myteam(1)+race#(1)+nat(1)+name(48)+telemetry(1)+showonline(1)+trailer(2)

    fn build_one(name: &str, team_id: u8) -> Vec<u8> {
        let mut b = vec![0u8; ENTRY_SIZE];
        b[0] = 0; // human
        b[2] = 7; // network id
        b[3] = team_id;
        let name_bytes = name.as_bytes();
        b[7..7 + name_bytes.len()].copy_from_slice(name_bytes);
        b[7 + 48] = 1; // telemetry visible
        b
    }

    #[test]
    fn decodes_a_full_grid_of_participants() {
        let mut bytes = build_header_bytes(2025, 4, 1, 1);
        bytes.push(20); // num active cars
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&build_one("Driver", 3));
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.num_active_cars, 20);
        assert_eq!(packet.participants.len(), NUM_CARS);
        assert_eq!(packet.participants[0].name, "Driver");
        assert_eq!(packet.participants[0].team_id, 3);
        assert!(!packet.participants[0].is_ai);
    }

    #[test]
    fn player_car_index_flags_the_right_participant() {
        let mut bytes = build_header_bytes_with_player(2025, 4, 1, 1, 3);
        bytes.push(20);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&build_one("X", 0));
        }
        let packet = parse(&bytes).unwrap();
        assert!(packet.participants[3].is_player);
        assert!(!packet.participants[0].is_player);
    }
}
