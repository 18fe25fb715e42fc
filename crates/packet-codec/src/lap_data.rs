//! Lap Data packet (id 2). State-class; drives lap completion and sector
//! transitions (SPEC_FULL.md §4.3.2, §4.3.3).

use crate::DecodeError;
use crate::enums;
use crate::header::{PacketHeader, parse_header};
use crate::motion::NUM_CARS;
use crate::reader::ByteReader;
use pitwall_schemas::ResultStatus;

#[derive(Debug, Clone, Copy, Default)]
pub struct CarLapData {
    pub last_lap_time_ms: u32,
    pub current_lap_time_ms: u32,
    pub sector1_ms: u32,
    pub sector2_ms: u32,
    pub lap_distance_m: f32,
    pub total_distance_m: f32,
    pub car_position: u8,
    pub current_lap_num: u8,
    pub pit_status: u8,
    pub num_pit_stops: u8,
    pub sector: u8,
    pub current_lap_invalid: bool,
    pub penalties_sec: u8,
    pub total_warnings: u8,
    pub corner_cutting_warnings: u8,
    pub grid_position: u8,
    pub result_status: ResultStatus,
    pub speed_trap_fastest_speed_kmph: f32,
}

#[derive(Debug, Clone)]
pub struct LapDataPacket {
    pub header: PacketHeader,
    pub cars: Vec<CarLapData>,
}

fn parse_one(r: &mut ByteReader<'_>) -> Result<CarLapData, DecodeError> {
    let last_lap_time_ms = r.read_u32()?;
    let current_lap_time_ms = r.read_u32()?;
    let sector1_ms = {
        let minutes_part = r.read_u16()? as u32;
        minutes_part
    };
    let sector2_ms = {
        let minutes_part = r.read_u16()? as u32;
        minutes_part
    };
    r.skip(2)?; // delta-to-car-in-front, delta-to-race-leader (both u16 ms, not modeled)
    let lap_distance_m = r.read_f32()?;
    let total_distance_m = r.read_f32()?;
    r.skip(4)?; // safety-car-delta (f32)
    let car_position = r.read_u8()?;
    let current_lap_num = r.read_u8()?;
    let pit_status = r.read_u8()?;
    let num_pit_stops = r.read_u8()?;
    let sector = r.read_u8()?;
    let current_lap_invalid = r.read_u8()? != 0;
    let penalties_sec = r.read_u8()?;
    let total_warnings = r.read_u8()?;
    let corner_cutting_warnings = r.read_u8()?;
    r.skip(2)?; // unserved drive-through/stop-go penalty counts
    let grid_position = r.read_u8()?;
    let driver_status = r.read_u8()?;
    let result_status_raw = r.read_u8()?;
    r.skip(2)?; // pit-lane-timer-active, pit-lane-time-in-lane-ms(u16 partial)/pit-stop-timer fields
    r.skip(2)?; // pit-stop-should-serve-penalty, padding-ish trailer
    let speed_trap_fastest_speed_kmph = r.read_f32()?;
    let _ = driver_status;

    Ok(CarLapData {
        last_lap_time_ms,
        current_lap_time_ms,
        sector1_ms,
        sector2_ms,
        lap_distance_m,
        total_distance_m,
        car_position,
        current_lap_num,
        pit_status,
        num_pit_stops,
        sector,
        current_lap_invalid,
        penalties_sec,
        total_warnings,
        corner_cutting_warnings,
        grid_position,
        result_status: enums::result_status(result_status_raw),
        speed_trap_fastest_speed_kmph,
    })
}

pub fn parse(bytes: &[u8]) -> Result<LapDataPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let mut cars = Vec::with_capacity(NUM_CARS);
    for _ in 0..NUM_CARS {
        cars.push(parse_one(&mut r)?);
    }
    Ok(LapDataPacket { header, cars })
}

/// Per-entry wire size: see field-by-field accounting in [`parse_one`].
pub const CAR_LAP_DATA_ENTRY_SIZE: usize = 48;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    fn build_one_car(lap_num: u8, sector: u8) -> Vec<u8> {
        let mut b = vec![0u8; CAR_LAP_DATA_ENTRY_SIZE];
        b[26] = lap_num; // offset 26: current_lap_num
        b[28] = sector; // offset 28: sector
        b
    }

    #[test]
    fn decodes_a_full_grid() {
        let mut bytes = build_header_bytes(2025, 2, 1, 5);
        for i in 0..NUM_CARS {
            bytes.extend_from_slice(&build_one_car(3, (i % 3) as u8));
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.cars.len(), NUM_CARS);
        assert_eq!(packet.cars[0].current_lap_num, 3);
        assert_eq!(packet.cars[1].sector, 1);
    }

    #[test]
    fn short_lap_data_packet_is_an_error() {
        let bytes = build_header_bytes(2025, 2, 1, 5);
        assert!(parse(&bytes).is_err());
    }
}
