//! Wire messages for the local IPC bus (SPEC_FULL.md §4.7, §6).
//!
//! The IPC bus carries the same JSON schema as the WebSocket fan-out bus
//! (`register-client`, `race-info`, `driver-info`, and the server's push and
//! response variants) plus three control verbs the WS bus has no use for:
//! `switch-page`, `set-scale`, `ping`. Rather than redefine the shared
//! vocabulary, [`IpcClientMessage`] and [`IpcServerMessage`] wrap
//! `pitwall_fanout`'s message types untagged and add the control verbs as a
//! second variant.

use pitwall_fanout::{ClientMessage, ServerMessage};
use serde::{Deserialize, Serialize};

/// A control verb named in SPEC_FULL.md §6 that has no counterpart on the
/// WebSocket bus: overlay-specific page/scale commands and a keepalive.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    SwitchPage { page: String },
    SetScale { scale: f32 },
    Ping,
}

/// Anything an overlay process may send over the IPC socket: either the
/// fan-out bus's own vocabulary, or one of the three IPC-only control verbs.
/// Untagged so the two enums' distinct `type` values both parse correctly.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IpcClientMessage {
    Control(ControlMessage),
    Bus(ClientMessage),
}

/// The acknowledgement sent back for a [`ControlMessage`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlAck {
    PageSwitched { page: String },
    ScaleSet { scale: f32 },
    Pong,
}

/// Anything the IPC server may send: the fan-out bus's own vocabulary, or a
/// [`ControlAck`] for a control verb.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum IpcServerMessage {
    Control(ControlAck),
    Bus(ServerMessage),
}

impl From<ServerMessage> for IpcServerMessage {
    fn from(message: ServerMessage) -> Self {
        IpcServerMessage::Bus(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_control_verb_parses_distinctly_from_a_bus_message() {
        let json = r#"{"type":"switch-page","page":"fuel"}"#;
        let parsed: IpcClientMessage = serde_json::from_str(json).expect("valid message");
        match parsed {
            IpcClientMessage::Control(ControlMessage::SwitchPage { page }) => {
                assert_eq!(page, "fuel");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn a_register_client_message_parses_as_a_bus_message() {
        let json = r#"{"type":"register-client","client_type":"hud-ipc"}"#;
        let parsed: IpcClientMessage = serde_json::from_str(json).expect("valid message");
        assert!(matches!(parsed, IpcClientMessage::Bus(ClientMessage::RegisterClient { .. })));
    }

    #[test]
    fn ping_round_trips_to_a_pong_ack() {
        let json = r#"{"type":"ping"}"#;
        let parsed: IpcClientMessage = serde_json::from_str(json).expect("valid message");
        assert!(matches!(parsed, IpcClientMessage::Control(ControlMessage::Ping)));

        let ack = IpcServerMessage::Control(ControlAck::Pong);
        let encoded = serde_json::to_value(&ack).expect("serializable");
        assert_eq!(encoded["type"], "pong");
    }
}
