//! Wire message families for the fan-out bus (SPEC_FULL.md §4.5, §6).

use pitwall_schemas::{DriverDetail, RaceSnapshot, RaceStats};
use serde::{Deserialize, Serialize};

/// Subscriber role declared by a client's `register-client` handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientRole {
    RaceTable,
    PlayerStreamOverlay,
    EngView,
    HudIpc,
}

impl ClientRole {
    pub const ALL: [ClientRole; 4] = [
        ClientRole::RaceTable,
        ClientRole::PlayerStreamOverlay,
        ClientRole::EngView,
        ClientRole::HudIpc,
    ];

    /// Parses the same kebab-case key the wire handshake and the
    /// `role_cadence_overrides` config section both use, e.g. `"eng-view"`.
    pub fn parse_config_key(key: &str) -> Option<Self> {
        match key {
            "race-table" => Some(ClientRole::RaceTable),
            "player-stream-overlay" => Some(ClientRole::PlayerStreamOverlay),
            "eng-view" => Some(ClientRole::EngView),
            "hud-ipc" => Some(ClientRole::HudIpc),
            _ => None,
        }
    }
}

/// Messages a client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    RegisterClient { client_type: ClientRole },
    RaceInfo { request_id: String },
    DriverInfo { request_id: String, index: u8 },
}

/// Messages the server may send.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    RaceTableUpdate {
        sequence: u64,
        session_uid: u64,
        snapshot: RaceSnapshot,
        stats: RaceStats,
    },
    PlayerOverlayUpdate {
        sequence: u64,
        session_uid: u64,
        detail: DriverDetail,
    },
    RaceInfoResponse {
        request_id: String,
        stats: RaceStats,
    },
    DriverInfoResponse {
        request_id: String,
        detail: Option<DriverDetail>,
    },
    FrontendUpdate {
        message_type: String,
        message: String,
    },
    Error {
        request_id: Option<String>,
        error: String,
    },
}

impl ServerMessage {
    pub fn timeout(request_id: String) -> Self {
        ServerMessage::Error {
            request_id: Some(request_id),
            error: "timeout".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_client_round_trips_through_json() {
        let json = r#"{"type":"register-client","client_type":"player-stream-overlay"}"#;
        let parsed: ClientMessage = serde_json::from_str(json).expect("valid message");
        match parsed {
            ClientMessage::RegisterClient { client_type } => {
                assert_eq!(client_type, ClientRole::PlayerStreamOverlay);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn driver_info_request_carries_index_and_request_id() {
        let json = r#"{"type":"driver-info","request_id":"abc-1","index":7}"#;
        let parsed: ClientMessage = serde_json::from_str(json).expect("valid message");
        match parsed {
            ClientMessage::DriverInfo { request_id, index } => {
                assert_eq!(request_id, "abc-1");
                assert_eq!(index, 7);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn timeout_response_carries_the_original_request_id() {
        let message = ServerMessage::timeout("req-9".to_string());
        let json = serde_json::to_value(&message).expect("serializable");
        assert_eq!(json["type"], "error");
        assert_eq!(json["request_id"], "req-9");
        assert_eq!(json["error"], "timeout");
    }
}
