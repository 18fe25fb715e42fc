//! Car Telemetry packet (id 6). Physics-class: dashboard readouts, not
//! folded into the race snapshot's state (SPEC_FULL.md §4.2).

use crate::DecodeError;
use crate::header::{PacketHeader, parse_header};
use crate::motion::NUM_CARS;
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy, Default)]
pub struct CarTelemetryData {
    pub speed_kmph: u16,
    pub throttle_pct: f32,
    pub steer: f32,
    pub brake_pct: f32,
    pub clutch_pct: u8,
    pub gear: i8,
    pub engine_rpm: u16,
    pub drs_active: bool,
    pub rev_lights_pct: u8,
    pub brakes_temp_c: [u16; 4],
    pub tyres_surface_temp_c: [u8; 4],
    pub tyres_inner_temp_c: [u8; 4],
    pub engine_temp_c: u16,
    pub tyres_pressure_kpa: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct CarTelemetryPacket {
    pub header: PacketHeader,
    pub cars: Vec<CarTelemetryData>,
}

fn parse_one(r: &mut ByteReader<'_>) -> Result<CarTelemetryData, DecodeError> {
    let speed_kmph = r.read_u16()?;
    let throttle_pct = r.read_f32()? * 100.0;
    let steer = r.read_f32()?;
    let brake_pct = r.read_f32()? * 100.0;
    let clutch_pct = r.read_u8()?;
    let gear = r.read_i8()?;
    let engine_rpm = r.read_u16()?;
    let drs_active = r.read_u8()? != 0;
    let rev_lights_pct = r.read_u8()?;
    r.skip(2)?; // rev-lights-bit-value (u16), not modeled
    let brakes_temp_c = [
        r.read_u16()?,
        r.read_u16()?,
        r.read_u16()?,
        r.read_u16()?,
    ];
    let tyres_surface_temp_c = [
        r.read_u8()?,
        r.read_u8()?,
        r.read_u8()?,
        r.read_u8()?,
    ];
    let tyres_inner_temp_c = [
        r.read_u8()?,
        r.read_u8()?,
        r.read_u8()?,
        r.read_u8()?,
    ];
    let engine_temp_c = r.read_u16()?;
    let tyres_pressure_kpa = [
        r.read_f32()?,
        r.read_f32()?,
        r.read_f32()?,
        r.read_f32()?,
    ];
    r.skip(4)?; // surface type per corner (u8 x4), not modeled

    Ok(CarTelemetryData {
        speed_kmph,
        throttle_pct,
        steer,
        brake_pct,
        clutch_pct,
        gear,
        engine_rpm,
        drs_active,
        rev_lights_pct,
        brakes_temp_c,
        tyres_surface_temp_c,
        tyres_inner_temp_c,
        engine_temp_c,
        tyres_pressure_kpa,
    })
}

pub const CAR_TELEMETRY_ENTRY_SIZE: usize = 60;

pub fn parse(bytes: &[u8]) -> Result<CarTelemetryPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let mut cars = Vec::with_capacity(NUM_CARS);
    for _ in 0..NUM_CARS {
        cars.push(parse_one(&mut r)?);
    }
    Ok(CarTelemetryPacket { header, cars })
}
