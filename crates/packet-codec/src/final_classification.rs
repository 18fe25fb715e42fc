//! Final Classification packet (id 8). Transient, arrives once at the end of
//! a session; the race model merges it into the roster's terminal result
//! status and finishing order (SPEC_FULL.md §4.3.4).

use crate::DecodeError;
use crate::enums;
use crate::header::{PacketHeader, parse_header};
use crate::motion::NUM_CARS;
use crate::reader::ByteReader;
use pitwall_schemas::ResultStatus;

#[derive(Debug, Clone, Copy, Default)]
pub struct CarFinalClassification {
    pub position: u8,
    pub num_laps: u8,
    pub grid_position: u8,
    pub points: u8,
    pub num_pit_stops: u8,
    pub result_status: ResultStatus,
    pub best_lap_time_ms: u32,
    pub total_race_time_sec: f64,
    pub penalties_time_sec: u8,
    pub num_penalties: u8,
}

#[derive(Debug, Clone)]
pub struct FinalClassificationPacket {
    pub header: PacketHeader,
    pub num_cars: u8,
    pub cars: Vec<CarFinalClassification>,
}

fn parse_one(r: &mut ByteReader<'_>) -> Result<CarFinalClassification, DecodeError> {
    let position = r.read_u8()?;
    let num_laps = r.read_u8()?;
    let grid_position = r.read_u8()?;
    let points = r.read_u8()?;
    let num_pit_stops = r.read_u8()?;
    let result_status_raw = r.read_u8()?;
    let best_lap_time_ms = r.read_u32()?;
    let total_race_time_sec = r.read_f32()? as f64;
    let penalties_time_sec = r.read_u8()?;
    let num_penalties = r.read_u8()?;
    let num_tyre_stints = r.read_u8()?;
    r.skip(8)?; // tyre stint actual compounds (u8 x8)
    r.skip(8)?; // tyre stint visual compounds (u8 x8)
    r.skip(8)?; // tyre stint end laps (u8 x8)
    let _ = num_tyre_stints;

    Ok(CarFinalClassification {
        position,
        num_laps,
        grid_position,
        points,
        num_pit_stops,
        result_status: enums::result_status(result_status_raw),
        best_lap_time_ms,
        total_race_time_sec,
        penalties_time_sec,
        num_penalties,
    })
}

pub fn parse(bytes: &[u8]) -> Result<FinalClassificationPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let num_cars = r.read_u8()?;
    let mut cars = Vec::with_capacity(NUM_CARS);
    for _ in 0..NUM_CARS {
        cars.push(parse_one(&mut r)?);
    }
    Ok(FinalClassificationPacket {
        header,
        num_cars,
        cars,
    })
}
