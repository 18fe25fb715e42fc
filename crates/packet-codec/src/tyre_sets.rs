//! Tyre Sets packet (id 12). State-class; the authoritative source of
//! [`TyreSetRecord`] availability/wear used by stint tracking (SPEC_FULL.md
//! §4.3.3) and the per-compound record aggregator (§4.4.4).

use crate::DecodeError;
use crate::enums;
use crate::header::{PacketHeader, parse_header};
use crate::reader::ByteReader;
use pitwall_schemas::TyreSetRecord;

pub const NUM_TYRE_SETS: usize = 20;

#[derive(Debug, Clone)]
pub struct TyreSetsPacket {
    pub header: PacketHeader,
    pub car_index: u8,
    pub sets: Vec<TyreSetRecord>,
    pub fitted_index: u8,
}

fn parse_one(r: &mut ByteReader<'_>, set_index: u8, year: pitwall_schemas::GameYear) -> Result<TyreSetRecord, DecodeError> {
    let actual_compound_raw = r.read_u8()?;
    let visual_compound_raw = r.read_u8()?;
    let wear_pct = r.read_u8()? as f32;
    let available = r.read_u8()? != 0;
    r.skip(1)?; // recommended session
    let lifespan_laps = r.read_u8()?;
    r.skip(1)?; // usable life
    let delta_to_set0_ms = r.read_i16()?;

    Ok(TyreSetRecord {
        set_index,
        actual_compound: enums::tyre_compound(actual_compound_raw, year),
        visual_compound: enums::tyre_compound(visual_compound_raw, year),
        age_laps: 0,
        wear_pct,
        lifespan_laps,
        delta_to_set0_ms,
        available,
    })
}

pub fn parse(bytes: &[u8]) -> Result<TyreSetsPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let car_index = r.read_u8()?;
    let mut sets = Vec::with_capacity(NUM_TYRE_SETS);
    for i in 0..NUM_TYRE_SETS as u8 {
        sets.push(parse_one(&mut r, i, header.game_year)?);
    }
    let fitted_index = r.read_u8()?;

    Ok(TyreSetsPacket {
        header,
        car_index,
        sets,
        fitted_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    #[test]
    fn decodes_a_full_tyre_set_list() {
        let mut bytes = build_header_bytes(2025, 12, 1, 1);
        bytes.push(0); // car index
        for _ in 0..NUM_TYRE_SETS {
            bytes.extend_from_slice(&[17, 17, 40, 1, 0, 30, 0, 0, 0]);
        }
        bytes.push(2); // fitted index
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.sets.len(), NUM_TYRE_SETS);
        assert_eq!(packet.fitted_index, 2);
        assert_eq!(packet.sets[0].wear_pct, 40.0);
        assert!(packet.sets[0].available);
    }
}
