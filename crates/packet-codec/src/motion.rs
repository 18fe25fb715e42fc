//! Motion packet (id 0) and Motion-Ex packet (id 13).
//!
//! Physics-class: per SPEC_FULL.md §4.2 these are the packets the ingress
//! queue drops first under backpressure, and per §5 the race model keeps
//! them in a short-lock mutable slot rather than folding them into the
//! immutable snapshot.

use crate::DecodeError;
use crate::header::{HEADER_SIZE, PacketHeader, parse_header};
use crate::reader::ByteReader;

pub const NUM_CARS: usize = 22;

#[derive(Debug, Clone, Copy, Default)]
pub struct CarMotionData {
    pub world_position: [f32; 3],
    pub world_velocity: [f32; 3],
    pub world_forward_dir: [i16; 3],
    pub world_right_dir: [i16; 3],
    pub g_force_lateral: f32,
    pub g_force_longitudinal: f32,
    pub g_force_vertical: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

#[derive(Debug, Clone)]
pub struct MotionPacket {
    pub header: PacketHeader,
    pub cars: Vec<CarMotionData>,
}

fn parse_car_motion(r: &mut ByteReader<'_>) -> Result<CarMotionData, DecodeError> {
    let world_position = [r.read_f32()?, r.read_f32()?, r.read_f32()?];
    let world_velocity = [r.read_f32()?, r.read_f32()?, r.read_f32()?];
    let world_forward_dir = [r.read_i16()?, r.read_i16()?, r.read_i16()?];
    let world_right_dir = [r.read_i16()?, r.read_i16()?, r.read_i16()?];
    let g_force_lateral = r.read_f32()?;
    let g_force_longitudinal = r.read_f32()?;
    let g_force_vertical = r.read_f32()?;
    let yaw = r.read_f32()?;
    let pitch = r.read_f32()?;
    let roll = r.read_f32()?;
    Ok(CarMotionData {
        world_position,
        world_velocity,
        world_forward_dir,
        world_right_dir,
        g_force_lateral,
        g_force_longitudinal,
        g_force_vertical,
        yaw,
        pitch,
        roll,
    })
}

pub fn parse(bytes: &[u8]) -> Result<MotionPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let mut cars = Vec::with_capacity(NUM_CARS);
    for _ in 0..NUM_CARS {
        cars.push(parse_car_motion(&mut r)?);
    }
    Ok(MotionPacket { header, cars })
}

/// Per-entry byte size: 3×f32 + 3×f32 + 3×i16 + 3×i16 + 6×f32.
pub const CAR_MOTION_ENTRY_SIZE: usize = (3 + 3) * 4 + (3 + 3) * 2 + 6 * 4;
pub const MIN_MOTION_PACKET_SIZE: usize = HEADER_SIZE + NUM_CARS * CAR_MOTION_ENTRY_SIZE;

#[derive(Debug, Clone, Copy, Default)]
pub struct MotionExData {
    pub suspension_position: [f32; 4],
    pub suspension_velocity: [f32; 4],
    pub suspension_acceleration: [f32; 4],
    pub wheel_speed: [f32; 4],
    pub wheel_slip_ratio: [f32; 4],
    pub local_velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub front_wheels_angle: f32,
}

#[derive(Debug, Clone)]
pub struct MotionExPacket {
    pub header: PacketHeader,
    pub data: MotionExData,
}

fn read4(r: &mut ByteReader<'_>) -> Result<[f32; 4], DecodeError> {
    Ok([r.read_f32()?, r.read_f32()?, r.read_f32()?, r.read_f32()?])
}

pub fn parse_ex(bytes: &[u8]) -> Result<MotionExPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let suspension_position = read4(&mut r)?;
    let suspension_velocity = read4(&mut r)?;
    let suspension_acceleration = read4(&mut r)?;
    let wheel_speed = read4(&mut r)?;
    let wheel_slip_ratio = read4(&mut r)?;
    let local_velocity = [r.read_f32()?, r.read_f32()?, r.read_f32()?];
    let angular_velocity = [r.read_f32()?, r.read_f32()?, r.read_f32()?];
    let front_wheels_angle = r.read_f32()?;
    Ok(MotionExPacket {
        header,
        data: MotionExData {
            suspension_position,
            suspension_velocity,
            suspension_acceleration,
            wheel_speed,
            wheel_slip_ratio,
            local_velocity,
            angular_velocity,
            front_wheels_angle,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    #[test]
    fn decodes_a_full_grid_of_motion_entries() {
        let mut bytes = build_header_bytes(2025, 0, 1, 10);
        for _ in 0..NUM_CARS {
            bytes.extend_from_slice(&[0u8; CAR_MOTION_ENTRY_SIZE]);
        }
        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.cars.len(), NUM_CARS);
    }

    #[test]
    fn short_motion_packet_is_an_error() {
        let bytes = build_header_bytes(2025, 0, 1, 10);
        assert!(parse(&bytes).is_err());
    }
}
