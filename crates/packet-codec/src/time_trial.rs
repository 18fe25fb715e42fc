//! Time Trial packet (id 14). Transient; personal-best/rival/session-best
//! data points specific to the Time Trial game mode (SPEC_FULL.md §4.1 —
//! surfaced alongside the core race model rather than folded into it, since
//! Time Trial has no multi-car race state).

use crate::DecodeError;
use crate::header::{PacketHeader, parse_header};
use crate::reader::ByteReader;

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeTrialDataSet {
    pub car_idx: u8,
    pub team_id: u8,
    pub lap_time_ms: u32,
    pub sector1_ms: u32,
    pub sector2_ms: u32,
    pub sector3_ms: u32,
    pub traction_control: u8,
    pub anti_lock_brakes: u8,
    pub gearbox_assist: u8,
    pub assists_active: bool,
}

fn parse_one(r: &mut ByteReader<'_>) -> Result<TimeTrialDataSet, DecodeError> {
    let car_idx = r.read_u8()?;
    let team_id = r.read_u8()?;
    let lap_time_ms = r.read_u32()?;
    let sector1_ms = r.read_u32()?;
    let sector2_ms = r.read_u32()?;
    let sector3_ms = r.read_u32()?;
    let traction_control = r.read_u8()?;
    let anti_lock_brakes = r.read_u8()?;
    let gearbox_assist = r.read_u8()?;
    r.skip(1)?; // pit assist
    r.skip(1)?; // pit release assist
    r.skip(1)?; // ers assist
    r.skip(1)?; // drs assist
    r.skip(1)?; // dynamic racing line
    r.skip(1)?; // dynamic racing line type
    let assists_active = anti_lock_brakes != 0 || traction_control != 0 || gearbox_assist != 0;

    Ok(TimeTrialDataSet {
        car_idx,
        team_id,
        lap_time_ms,
        sector1_ms,
        sector2_ms,
        sector3_ms,
        traction_control,
        anti_lock_brakes,
        gearbox_assist,
        assists_active,
    })
}

#[derive(Debug, Clone)]
pub struct TimeTrialPacket {
    pub header: PacketHeader,
    pub player_session_best: TimeTrialDataSet,
    pub personal_best: TimeTrialDataSet,
    pub rival: TimeTrialDataSet,
}

pub fn parse(bytes: &[u8]) -> Result<TimeTrialPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;
    let player_session_best = parse_one(&mut r)?;
    let personal_best = parse_one(&mut r)?;
    let rival = parse_one(&mut r)?;
    Ok(TimeTrialPacket {
        header,
        player_session_best,
        personal_best,
        rival,
    })
}
