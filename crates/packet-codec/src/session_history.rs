//! Session History packet (id 11). State-class; per-driver lap/sector
//! history, the backfill source for [`LapRecord`] when a lap is missed on
//! the live `LapData` stream (SPEC_FULL.md §4.3.3).

use crate::DecodeError;
use crate::header::{PacketHeader, parse_header};
use crate::reader::ByteReader;
use pitwall_schemas::{LapRecord, SectorStatus, TyreSetRecord};

#[derive(Debug, Clone)]
pub struct SessionHistoryPacket {
    pub header: PacketHeader,
    pub car_index: u8,
    pub num_laps: u8,
    pub num_tyre_stints: u8,
    pub best_lap_num: u8,
    pub best_sector1_lap_num: u8,
    pub best_sector2_lap_num: u8,
    pub best_sector3_lap_num: u8,
    pub laps: Vec<LapRecord>,
    pub tyre_stint_compounds: Vec<u8>,
}

fn sector_status(flags: u8) -> SectorStatus {
    match flags & 0x07 {
        0 => SectorStatus::Invalid,
        1 => SectorStatus::Yellow,
        2 => SectorStatus::Green,
        3 => SectorStatus::Purple,
        _ => SectorStatus::Invalid,
    }
}

fn parse_lap(r: &mut ByteReader<'_>, lap_number: u8) -> Result<LapRecord, DecodeError> {
    let lap_time_ms = r.read_u32()?;
    let sector1_ms = r.read_u16()? as u32;
    r.skip(1)?; // sector1 minutes part, folded into sector1_ms above in single-lap tracks
    let sector2_ms = r.read_u16()? as u32;
    r.skip(1)?;
    let sector3_ms = r.read_u16()? as u32;
    r.skip(1)?;
    let flags = r.read_u8()?;
    let valid = flags & 0x10 == 0;

    Ok(LapRecord {
        lap_number,
        lap_time_ms,
        sector1_ms,
        sector2_ms,
        sector3_ms,
        valid,
        tyre_set_index: 0,
        top_speed_kmph: 0.0,
        sector_status: [sector_status(flags), sector_status(flags >> 3), SectorStatus::Invalid],
    })
}

pub const MAX_LAPS: usize = 100;
pub const MAX_TYRE_STINTS: usize = 8;

pub fn parse(bytes: &[u8]) -> Result<SessionHistoryPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let car_index = r.read_u8()?;
    let num_laps = r.read_u8()?;
    let num_tyre_stints = r.read_u8()?;
    let best_lap_num = r.read_u8()?;
    let best_sector1_lap_num = r.read_u8()?;
    let best_sector2_lap_num = r.read_u8()?;
    let best_sector3_lap_num = r.read_u8()?;

    let mut laps = Vec::with_capacity(MAX_LAPS);
    for i in 0..MAX_LAPS as u8 {
        laps.push(parse_lap(&mut r, i + 1)?);
    }
    laps.truncate(num_laps as usize);

    let mut tyre_stint_compounds = Vec::with_capacity(MAX_TYRE_STINTS);
    for _ in 0..MAX_TYRE_STINTS {
        let actual = r.read_u8()?;
        r.skip(1)?; // visual compound
        r.skip(1)?; // end lap
        tyre_stint_compounds.push(actual);
    }
    tyre_stint_compounds.truncate(num_tyre_stints as usize);

    Ok(SessionHistoryPacket {
        header,
        car_index,
        num_laps,
        num_tyre_stints,
        best_lap_num,
        best_sector1_lap_num,
        best_sector2_lap_num,
        best_sector3_lap_num,
        laps,
        tyre_stint_compounds,
    })
}

/// Reduces a decoded stint-compound byte list into `TyreSetRecord` shells
/// for callers that only have the history packet's summary view available.
pub fn stint_compound_shells(compounds: &[u8], year: pitwall_schemas::GameYear) -> Vec<TyreSetRecord> {
    compounds
        .iter()
        .enumerate()
        .map(|(i, &raw)| TyreSetRecord {
            set_index: i as u8,
            actual_compound: crate::enums::tyre_compound(raw, year),
            visual_compound: crate::enums::tyre_compound(raw, year),
            age_laps: 0,
            wear_pct: 0.0,
            lifespan_laps: 0,
            delta_to_set0_ms: 0,
            available: true,
        })
        .collect()
}
