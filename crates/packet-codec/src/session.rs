//! Session packet (id 1).
//!
//! State-class (SPEC_FULL.md §4.2: never dropped under backpressure). Feeds
//! the race model's session-boundary detection (§4.3.1).

use crate::DecodeError;
use crate::enums;
use crate::header::{PacketHeader, parse_header};
use crate::reader::ByteReader;
use pitwall_schemas::{Session, WeatherForecastSample};

#[derive(Debug, Clone)]
pub struct SessionPacket {
    pub header: PacketHeader,
    pub session: Session,
}

fn parse_weather_sample(r: &mut ByteReader<'_>) -> Result<WeatherForecastSample, DecodeError> {
    let session_type_raw = r.read_u8()?;
    let time_offset_min = r.read_u8()?;
    let weather_raw = r.read_u8()?;
    let track_temp_c = r.read_i8()?;
    let air_temp_c = r.read_i8()?;
    let rain_probability_pct = r.read_u8()?;
    Ok(WeatherForecastSample {
        session_type: enums::session_type(session_type_raw),
        time_offset_min,
        weather: enums::weather(weather_raw),
        track_temp_c,
        air_temp_c,
        rain_probability_pct,
    })
}

pub fn parse(bytes: &[u8]) -> Result<SessionPacket, DecodeError> {
    let mut r = ByteReader::new(bytes);
    let header = parse_header(&mut r)?;

    let weather_raw = r.read_u8()?;
    let track_temp_c = r.read_i8()?;
    let air_temp_c = r.read_i8()?;
    let total_laps = r.read_u8()?;
    r.skip(2)?; // track length (u16), not modeled
    let session_type_raw = r.read_u8()?;
    let track_id = r.read_i8()?;
    r.skip(1)?; // formula, not modeled
    r.skip(4)?; // session time left (u16) + session duration (u16)
    let pit_speed_limit_kmph = r.read_u8()?;
    r.skip(3)?; // game-paused, is-spectating, spectator-car-index
    r.skip(1)?; // sli-pro-native-support
    let num_marshal_zones = r.read_u8()?;
    r.skip(num_marshal_zones as usize * 5)?; // zone-start fraction (f32) + zone-flag (i8) each

    let num_samples = r.read_u8()?;
    let mut weather_forecast = Vec::with_capacity(num_samples as usize);
    for _ in 0..num_samples {
        weather_forecast.push(parse_weather_sample(&mut r)?);
    }
    r.skip(3)?; // forecast accuracy, air-temp-change, track-temp-change
    let safety_car_raw = r.read_u8()?;

    let mut session = Session::seed(header.session_uid, header.game_year);
    session.session_type = enums::session_type(session_type_raw);
    session.track_id = track_id;
    session.total_laps = total_laps;
    session.session_time_sec = header.session_time_sec;
    session.safety_car_state = enums::safety_car_state(safety_car_raw);
    session.pit_speed_limit_kmph = pit_speed_limit_kmph;
    session.air_temp_c = air_temp_c;
    session.track_temp_c = track_temp_c;
    session.weather_forecast = weather_forecast;
    let _ = weather_raw; // current-weather byte; forecast samples carry the same enum per-offset

    Ok(SessionPacket { header, session })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_header_bytes;

    #[test]
    fn decodes_session_core_fields_with_no_forecast_samples() {
        let mut bytes = build_header_bytes(2025, 0, 1, 1);
        bytes.push(2); // weather
        bytes.push(25); // track temp
        bytes.push(30); // air temp
        bytes.push(58); // total laps
        bytes.extend_from_slice(&1000u16.to_le_bytes()); // track length
        bytes.push(10); // session type = Race
        bytes.push(5); // track id = Monaco
        bytes.push(0); // formula
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.push(80); // pit speed limit
        bytes.extend_from_slice(&[0u8; 5]);
        bytes.push(0); // num weather samples
        bytes.extend_from_slice(&[0u8; 3]);
        bytes.push(1); // safety car = full

        let packet = parse(&bytes).unwrap();
        assert_eq!(packet.session.total_laps, 58);
        assert_eq!(packet.session.track_id, 5);
        assert_eq!(packet.session.pit_speed_limit_kmph, 80);
        assert!(packet.session.weather_forecast.is_empty());
    }
}
