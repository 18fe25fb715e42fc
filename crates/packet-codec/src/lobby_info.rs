//! Lobby Info packet (id 9). Transient; pre-session grid/ready-state, used
//! to populate the roster before the first `Participants` packet in online
//! lobbies (SPEC_FULL.md §4.3.1).

use crate::DecodeError;
use crate::header::{PacketHeader, parse_header};
use crate::motion::NUM_CARS;
use crate::reader::ByteReader;

#[derive(Debug, Clone)]
pub struct LobbyPlayer {
    pub ai_controlled: bool,
    pub team_id: u8,
    pub nationality: u8,
    pub name: String,
    pub car_number: u8,
    pub ready_status: u8,
}

#[derive(Debug, Clone)]
pub struct LobbyInfoPacket {
    pub header: PacketHeader,
    pub num_players: u8,
    pub players: Vec<LobbyPlayer>,
}

fn parse_one(r: &mut ByteReader<'_>) -> Result<LobbyPlayer, DecodeError> {
    let ai_controlled = r.read_u8()? != 0;
    let team_id = r.read_u8()?;
    let nationality = r.read_u8()?;
    let name = r.read_fixed_str(48)?;
    let car_number = r.read_u8()?;
    let ready_status = r.read_u8()?;

    Ok(LobbyPlayer {
        ai_controlled,
        team_id,
        nationality,
        name,
        car_number,
        ready_status,
    })
}

pub fn parse(bytes: &[u8]) -> Result<LobbyInfoPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let num_players = r.read_u8()?;
    let mut players = Vec::with_capacity(NUM_CARS);
    for _ in 0..NUM_CARS {
        players.push(parse_one(&mut r)?);
    }
    Ok(LobbyInfoPacket {
        header,
        num_players,
        players,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    fn entry(name: &str, ready: u8) -> Vec<u8> {
        let mut b = vec![0u8; 53];
        let name_bytes = name.as_bytes();
        b[3..3 + name_bytes.len()].copy_from_slice(name_bytes);
        b[51] = 9; // car number
        b[52] = ready;
        b
    }

    #[test]
    fn decodes_a_full_lobby() {
        let mut bytes = build_header_bytes(2025, 9, 1, 1);
        bytes.push(16);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&entry("Racer", 2));
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.num_players, 16);
        assert_eq!(packet.players[0].name, "Racer");
        assert_eq!(packet.players[0].ready_status, 2);
        assert_eq!(packet.players[0].car_number, 9);
    }
}
