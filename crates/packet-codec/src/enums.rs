//! Closed mapping tables for the game's wire-level enums.
//!
//! Per SPEC_FULL.md §4.1 and the §9 re-architecture flag against dynamic
//! attribute access: every enum is decoded through one of these tables, keyed
//! by the numeric wire value. An out-of-range value never panics — it comes
//! back as the domain type's `Unknown`/default variant, with the raw value
//! preserved where the type carries one, and the decoder counts it as an
//! enum-range error (see [`crate::DecodeError::EnumOutOfRange`]) at the call
//! site that cares.

use pitwall_schemas::{
    ErsMode, FuelMix, GameYear, PenaltyKind, ResultStatus, SafetyCarState, SessionType,
    TyreCompound, Weather,
};

pub fn weather(raw: u8) -> Weather {
    match raw {
        0 => Weather::Clear,
        1 => Weather::LightCloud,
        2 => Weather::Overcast,
        3 => Weather::LightRain,
        4 => Weather::HeavyRain,
        5 => Weather::Storm,
        _ => Weather::Unknown(raw),
    }
}

pub fn session_type(raw: u8) -> SessionType {
    match raw {
        1 => SessionType::Practice1,
        2 => SessionType::Practice2,
        3 => SessionType::Practice3,
        4 => SessionType::PracticeShort,
        5 => SessionType::Qualifying1,
        6 => SessionType::Qualifying2,
        7 => SessionType::Qualifying3,
        8 => SessionType::QualifyingShort,
        9 => SessionType::OneShotQualifying,
        10 => SessionType::Race,
        11 => SessionType::Race2,
        12 => SessionType::Race3,
        13 => SessionType::TimeTrial,
        _ => SessionType::Unknown,
    }
}

pub fn safety_car_state(raw: u8) -> SafetyCarState {
    match raw {
        1 => SafetyCarState::Full,
        2 => SafetyCarState::Virtual,
        3 => SafetyCarState::FormationLap,
        _ => SafetyCarState::None,
    }
}

/// Actual/visual tyre compound. The wire encoding differs slightly between
/// format years (F1 23/24 vs F1 25 added a couple of development-only
/// values); both are folded into the same closed table since the domain
/// never distinguishes them.
pub fn tyre_compound(raw: u8, _year: GameYear) -> TyreCompound {
    match raw {
        16 => TyreCompound::SuperSoft,
        17 => TyreCompound::Soft,
        18 => TyreCompound::Medium,
        19 => TyreCompound::Hard,
        7 => TyreCompound::Inter,
        8 | 15 => TyreCompound::Wet,
        _ => TyreCompound::Unknown(raw),
    }
}

pub fn ers_mode(raw: u8) -> ErsMode {
    match raw {
        1 => ErsMode::Medium,
        2 => ErsMode::Hotlap,
        3 => ErsMode::Overtake,
        _ => ErsMode::None,
    }
}

pub fn fuel_mix(raw: u8) -> FuelMix {
    match raw {
        0 => FuelMix::Lean,
        2 => FuelMix::Rich,
        3 => FuelMix::Max,
        _ => FuelMix::Standard,
    }
}

pub fn result_status(raw: u8) -> ResultStatus {
    match raw {
        1 => ResultStatus::Inactive,
        2 => ResultStatus::Active,
        3 => ResultStatus::Finished,
        4 => ResultStatus::DidNotFinish,
        5 => ResultStatus::Disqualified,
        6 => ResultStatus::NotClassified,
        7 => ResultStatus::Retired,
        _ => ResultStatus::Invalid,
    }
}

pub fn penalty_kind(raw: u8) -> Option<PenaltyKind> {
    match raw {
        0..=8 | 14 | 21 => Some(PenaltyKind::CornerCutting),
        9 | 10 | 11 => Some(PenaltyKind::TimePenalty),
        12 => Some(PenaltyKind::DriveThrough),
        13 => Some(PenaltyKind::StopGo),
        19 | 20 => Some(PenaltyKind::TotalWarnings),
        _ => None,
    }
}

/// 4-byte ASCII event codes the `Event` packet dispatches on
/// (SPEC_FULL.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCode {
    SessionStarted,
    SessionEnded,
    FastestLap,
    Retirement,
    DrsEnabled,
    DrsDisabled,
    TeamMateInPits,
    ChequeredFlag,
    RaceWinner,
    PenaltyIssued,
    SpeedTrapTriggered,
    StartLights,
    LightsOut,
    DriveThroughServed,
    StopGoServed,
    Flashback,
    ButtonStatus,
    RedFlag,
    Overtake,
    SafetyCar,
    Collision,
    Unknown([u8; 4]),
}

impl EventCode {
    pub fn from_ascii(code: [u8; 4]) -> Self {
        match &code {
            b"SSTA" => Self::SessionStarted,
            b"SEND" => Self::SessionEnded,
            b"FTLP" => Self::FastestLap,
            b"RTMT" => Self::Retirement,
            b"DRSE" => Self::DrsEnabled,
            b"DRSD" => Self::DrsDisabled,
            b"TMPT" => Self::TeamMateInPits,
            b"CHQF" => Self::ChequeredFlag,
            b"RCWN" => Self::RaceWinner,
            b"PENA" => Self::PenaltyIssued,
            b"SPTP" => Self::SpeedTrapTriggered,
            b"STLG" => Self::StartLights,
            b"LGOT" => Self::LightsOut,
            b"DTSV" => Self::DriveThroughServed,
            b"SGSV" => Self::StopGoServed,
            b"FLBK" => Self::Flashback,
            b"BUTN" => Self::ButtonStatus,
            b"RDFL" => Self::RedFlag,
            b"OVTK" => Self::Overtake,
            b"SCAR" => Self::SafetyCar,
            b"COLL" => Self::Collision,
            _ => Self::Unknown(code),
        }
    }
}
