use thiserror::Error;

/// Failure modes for [`crate::RaceModel::apply`]. A packet that fails one of
/// these invariants is logged and dropped; it never poisons the model for
/// packets that follow.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplyError {
    #[error("car index {0} is outside the 0..22 grid range")]
    CarIndexOutOfRange(u8),

    #[error("packet references session {packet_uid} but the model is tracking {model_uid}")]
    SessionMismatch { packet_uid: u64, model_uid: u64 },

    #[error("frame {frame_id} is older than the last frame seen for this packet kind ({last_seen})")]
    StaleFrame { frame_id: u32, last_seen: u32 },
}
