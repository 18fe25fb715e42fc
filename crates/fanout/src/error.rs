use thiserror::Error;

#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("client {0} is not registered")]
    UnknownClient(uuid::Uuid),

    #[error("request {0} timed out after the 3s budget")]
    RequestTimeout(String),

    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket transport error: {0}")]
    Transport(#[from] axum::Error),
}
