//! Shared packet-body builders for the per-module unit tests in this crate.

use crate::header::HEADER_SIZE;

/// Builds a well-formed 29-byte header followed by nothing. Callers append
/// their packet-kind-specific body after this.
pub fn build_header_bytes(format_year: u16, packet_id: u8, session_uid: u64, frame_id: u32) -> Vec<u8> {
    let mut b = Vec::with_capacity(HEADER_SIZE);
    b.extend_from_slice(&format_year.to_le_bytes()); // packet_format
    b.push(1); // game_major_version
    b.push(0); // game_minor_version
    b.push(1); // packet_version
    b.push(packet_id); // packet_id
    b.extend_from_slice(&session_uid.to_le_bytes()); // session_uid
    b.extend_from_slice(&0.0f32.to_le_bytes()); // session_time
    b.extend_from_slice(&frame_id.to_le_bytes()); // frame_id
    b.extend_from_slice(&0u32.to_le_bytes()); // overall_frame_identifier
    b.push(0); // player_car_index
    b.push(1); // secondary_player_car_index
    assert_eq!(b.len(), HEADER_SIZE);
    b
}

/// Like [`build_header_bytes`] but with an explicit player car index, for
/// tests that depend on which grid slot is "the player".
pub fn build_header_bytes_with_player(
    format_year: u16,
    packet_id: u8,
    session_uid: u64,
    frame_id: u32,
    player_car_index: u8,
) -> Vec<u8> {
    let mut b = build_header_bytes(format_year, packet_id, session_uid, frame_id);
    b[HEADER_SIZE - 2] = player_car_index;
    b
}
