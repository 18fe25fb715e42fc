//! Car Status packet (id 7). State-class; feeds [`CarStatusSnapshot`] via its
//! validating builder. The per-car body is 47 bytes on format year 2023 and
//! 55 bytes on 2024/2025 — the extra 8 bytes are the `engine_power_ice`/
//! `engine_power_mguk` fields F1 24 added ahead of the ERS block; both
//! layouts end with a trailing network-paused flag byte.

use crate::DecodeError;
use crate::enums;
use crate::header::{PacketHeader, parse_header};
use crate::motion::NUM_CARS;
use crate::reader::ByteReader;
use pitwall_schemas::{CarStatusSnapshot, GameYear};

pub const CAR_STATUS_ENTRY_SIZE_2023: usize = 47;
pub const CAR_STATUS_ENTRY_SIZE_2024_25: usize = 55;

#[derive(Debug, Clone)]
pub struct CarStatusPacket {
    pub header: PacketHeader,
    pub cars: Vec<CarStatusSnapshot>,
}

fn parse_one(r: &mut ByteReader<'_>, year: GameYear) -> Result<CarStatusSnapshot, DecodeError> {
    r.skip(1)?; // traction control
    r.skip(1)?; // anti-lock brakes
    let fuel_mix_raw = r.read_u8()?;
    r.skip(1)?; // front brake bias
    r.skip(1)?; // pit limiter status
    let fuel_in_tank_kg = r.read_f32()?;
    let fuel_capacity_kg = r.read_f32()?;
    let fuel_remaining_laps = r.read_f32()?;
    r.skip(2)?; // max rpm
    r.skip(2)?; // idle rpm
    r.skip(1)?; // max gears
    let drs_allowed = r.read_u8()? != 0;
    r.skip(2)?; // drs activation distance
    r.skip(1)?; // actual tyre compound (tracked via TyreSets instead)
    r.skip(1)?; // visual tyre compound
    r.skip(1)?; // tyres age laps
    r.skip(1)?; // vehicle fia flags
    if !matches!(year, GameYear::F1_23) {
        r.skip(4)?; // engine power ice (f32), F1 24+ only
        r.skip(4)?; // engine power mguk (f32), F1 24+ only
    }
    let ers_store_energy_j = r.read_f32()?;
    let ers_mode_raw = r.read_u8()?;
    let ers_harvested_mguk_j = r.read_f32()?;
    let ers_harvested_mguh_j = r.read_f32()?;
    let ers_deployed_this_lap_j = r.read_f32()?;
    r.skip(1)?; // network-paused

    Ok(CarStatusSnapshot::builder()
        .ers_store_energy_j(ers_store_energy_j)
        .ers_deployed_this_lap_j(ers_deployed_this_lap_j)
        .ers_harvested_mguh_j(ers_harvested_mguh_j)
        .ers_harvested_mguk_j(ers_harvested_mguk_j)
        .ers_max_capacity_j(4_000_000.0)
        .ers_mode(enums::ers_mode(ers_mode_raw))
        .fuel_in_tank_kg(fuel_in_tank_kg)
        .fuel_capacity_kg(fuel_capacity_kg)
        .fuel_mix(enums::fuel_mix(fuel_mix_raw))
        .fuel_remaining_laps(fuel_remaining_laps)
        .drs_allowed(drs_allowed)
        .drs_active(false)
        .build())
}

pub fn parse(bytes: &[u8]) -> Result<CarStatusPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let mut cars = Vec::with_capacity(NUM_CARS);
    for _ in 0..NUM_CARS {
        cars.push(parse_one(&mut r, header.game_year)?);
    }
    Ok(CarStatusPacket { header, cars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    #[test]
    fn decodes_2023_layout_at_47_bytes_per_car() {
        let mut bytes = build_header_bytes(2023, 7, 1, 1);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&vec![0u8; CAR_STATUS_ENTRY_SIZE_2023]);
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.cars.len(), NUM_CARS);
    }

    #[test]
    fn decodes_2024_layout_at_55_bytes_per_car() {
        let mut bytes = build_header_bytes(2024, 7, 1, 1);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&vec![0u8; CAR_STATUS_ENTRY_SIZE_2024_25]);
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.cars.len(), NUM_CARS);
    }

    #[test]
    fn decodes_2025_layout_at_55_bytes_per_car() {
        let mut bytes = build_header_bytes(2025, 7, 1, 1);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&vec![0u8; CAR_STATUS_ENTRY_SIZE_2024_25]);
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.cars.len(), NUM_CARS);
    }

    #[test]
    fn mismatched_year_and_entry_size_is_a_short_read() {
        let mut bytes = build_header_bytes(2023, 7, 1, 1);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&vec![0u8; CAR_STATUS_ENTRY_SIZE_2024_25]);
        }
        // 2023 decoder reads fewer bytes/car than supplied; still succeeds,
        // it just doesn't consume the tail. Truncate to prove the opposite
        // direction (2024 decoder against 2023-sized bytes) fails instead.
        let mut short_bytes = build_header_bytes(2024, 7, 1, 1);
        for _ in 0..NUM_CARS {
            short_bytes.extend_from_slice(&vec![0u8; CAR_STATUS_ENTRY_SIZE_2023]);
        }
        assert!(parse(&short_bytes).is_err());
    }
}
