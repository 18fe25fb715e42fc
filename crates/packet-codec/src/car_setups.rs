//! Car Setups packet (id 5). State-class, low cadence; setup data is
//! surfaced as-is without further modeling (SPEC_FULL.md §4.1 — a
//! supplemental, not a core, data source for the race model).

use crate::DecodeError;
use crate::header::{PacketHeader, parse_header};
use crate::motion::NUM_CARS;
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy, Default)]
pub struct CarSetupData {
    pub front_wing: u8,
    pub rear_wing: u8,
    pub on_throttle_pct: u8,
    pub off_throttle_pct: u8,
    pub front_camber_deg: f32,
    pub rear_camber_deg: f32,
    pub front_tyre_pressure_psi: f32,
    pub rear_tyre_pressure_psi: f32,
    pub ballast: u8,
    pub fuel_load_kg: f32,
}

#[derive(Debug, Clone)]
pub struct CarSetupsPacket {
    pub header: PacketHeader,
    pub cars: Vec<CarSetupData>,
}

fn parse_one(r: &mut ByteReader<'_>) -> Result<CarSetupData, DecodeError> {
    let front_wing = r.read_u8()?;
    let rear_wing = r.read_u8()?;
    let on_throttle_pct = r.read_u8()?;
    let off_throttle_pct = r.read_u8()?;
    let front_camber_deg = r.read_f32()?;
    let rear_camber_deg = r.read_f32()?;
    r.skip(8)?; // front/rear toe (f32 x2)
    r.skip(2)?; // front/rear suspension
    r.skip(2)?; // front/rear anti-roll-bar
    r.skip(8)?; // front/rear suspension height, brake bias/pressure (simplified)
    let front_tyre_pressure_psi = r.read_f32()?;
    let rear_tyre_pressure_psi = r.read_f32()?;
    let ballast = r.read_u8()?;
    let fuel_load_kg = r.read_f32()?;

    Ok(CarSetupData {
        front_wing,
        rear_wing,
        on_throttle_pct,
        off_throttle_pct,
        front_camber_deg,
        rear_camber_deg,
        front_tyre_pressure_psi,
        rear_tyre_pressure_psi,
        ballast,
        fuel_load_kg,
    })
}

pub const CAR_SETUP_ENTRY_SIZE: usize = 45;

pub fn parse(bytes: &[u8]) -> Result<CarSetupsPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let mut cars = Vec::with_capacity(NUM_CARS);
    for _ in 0..NUM_CARS {
        cars.push(parse_one(&mut r)?);
    }
    Ok(CarSetupsPacket { header, cars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    #[test]
    fn decodes_a_full_grid() {
        let mut bytes = build_header_bytes(2025, 5, 1, 1);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&[0u8; CAR_SETUP_ENTRY_SIZE]);
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.cars.len(), NUM_CARS);
    }
}
