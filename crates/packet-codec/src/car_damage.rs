//! Car Damage packet (id 10). State-class; feeds [`DamageSnapshot`] and the
//! tyre-wear predictor's sample stream (SPEC_FULL.md §4.4.2).

use crate::DecodeError;
use crate::header::{PacketHeader, parse_header};
use crate::motion::NUM_CARS;
use crate::reader::ByteReader;
use pitwall_schemas::DamageSnapshot;

#[derive(Debug, Clone)]
pub struct CarDamagePacket {
    pub header: PacketHeader,
    pub cars: Vec<DamageSnapshot>,
}

fn parse_one(r: &mut ByteReader<'_>) -> Result<DamageSnapshot, DecodeError> {
    let tyre_wear_pct = [
        r.read_f32()?,
        r.read_f32()?,
        r.read_f32()?,
        r.read_f32()?,
    ];
    let tyre_damage_pct = [
        r.read_u8()?,
        r.read_u8()?,
        r.read_u8()?,
        r.read_u8()?,
    ];
    r.skip(4)?; // brake damage pct x4
    let front_left_wing_damage_pct = r.read_u8()?;
    let front_right_wing_damage_pct = r.read_u8()?;
    let rear_wing_damage_pct = r.read_u8()?;
    let floor_damage_pct = r.read_u8()?;
    let diffuser_damage_pct = r.read_u8()?;
    let sidepod_damage_pct = r.read_u8()?;
    r.skip(1)?; // drs fault flag
    r.skip(1)?; // ers fault flag
    let gearbox_damage_pct = r.read_u8()?;
    let engine_damage_pct = r.read_u8()?;
    r.skip(6)?; // per-component engine wear breakdown (mguh/es/ce/ice/mguk/tc), not modeled
    r.skip(1)?; // engine blown
    r.skip(1)?; // engine seized

    Ok(DamageSnapshot {
        tyre_wear_pct,
        tyre_damage_pct,
        front_left_wing_damage_pct,
        front_right_wing_damage_pct,
        rear_wing_damage_pct,
        floor_damage_pct,
        diffuser_damage_pct,
        sidepod_damage_pct,
        engine_damage_pct,
        gearbox_damage_pct,
    })
}

pub const CAR_DAMAGE_ENTRY_SIZE: usize = 42;

pub fn parse(bytes: &[u8]) -> Result<CarDamagePacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let mut cars = Vec::with_capacity(NUM_CARS);
    for _ in 0..NUM_CARS {
        cars.push(parse_one(&mut r)?);
    }
    Ok(CarDamagePacket { header, cars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    #[test]
    fn decodes_a_full_grid() {
        let mut bytes = build_header_bytes(2025, 10, 1, 1);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&[0u8; CAR_DAMAGE_ENTRY_SIZE]);
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.cars.len(), NUM_CARS);
    }

    #[test]
    fn decodes_nonzero_wear_values() {
        let mut bytes = build_header_bytes(2025, 10, 1, 1);
        let mut entry = vec![0u8; CAR_DAMAGE_ENTRY_SIZE];
        entry[0..4].copy_from_slice(&12.5f32.to_le_bytes());
        bytes.extend_from_slice(&entry);
        for _ in 1..NUM_CARS {
            bytes.extend_from_slice(&[0u8; CAR_DAMAGE_ENTRY_SIZE]);
        }
        let packet = parse(&bytes).unwrap();
        assert!((packet.cars[0].tyre_wear_pct[0] - 12.5).abs() < 1e-3);
    }
}
