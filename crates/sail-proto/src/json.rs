// SPDX-License-Identifier: Apache-2.0
//! JSON wire schema used by `sail-ws-gateway` (§6). Every message is
//! tagged by its `type` field so both directions can be represented as
//! a single enum, matching the WebSocket gateway's existing dispatch
//! shape.

use sail_core::ident::{ModuleId, PlayerId, SessionId};
use sail_core::interaction::InteractionError;
use sail_core::snapshot::{BaselineFrame, DeltaFrame};
use serde::{Deserialize, Serialize};

/// Messages a client may send (§6 ingress).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Handshake {
        name: String,
        client_version: String,
    },
    InputFrame {
        sequence: u32,
        throttle: f32,
        turn: f32,
        move_x: f32,
        move_y: f32,
    },
    CannonAim {
        module_id: u32,
        aim_direction: f32,
    },
    CannonFire {
        module_id: u32,
    },
    ModuleInteract {
        module_id: u32,
        action: InteractAction,
    },
    Ping {
        client_time_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractAction {
    Mount,
    Dismount,
}

/// Frozen vocabulary of module-interaction failure reasons (§4.7): the
/// wire never carries a free-text error string, only one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionFailureReason {
    NotOnShip,
    ShipNotFound,
    ModuleNotFound,
    OutOfRange,
    ModuleDestroyed,
    ModuleOccupied,
    NotInteractive,
}

impl From<InteractionError> for InteractionFailureReason {
    fn from(err: InteractionError) -> Self {
        match err {
            InteractionError::PlayerNotFound | InteractionError::NotOccupant => {
                InteractionFailureReason::NotOnShip
            }
            InteractionError::ShipNotFound => InteractionFailureReason::ShipNotFound,
            InteractionError::ModuleNotFound => InteractionFailureReason::ModuleNotFound,
            InteractionError::TooFar => InteractionFailureReason::OutOfRange,
            InteractionError::ModuleDestroyed => InteractionFailureReason::ModuleDestroyed,
            InteractionError::AlreadyOccupied => InteractionFailureReason::ModuleOccupied,
            InteractionError::NotInteractable
            | InteractionError::NoAmmo
            | InteractionError::Reloading => InteractionFailureReason::NotInteractive,
        }
    }
}

/// Messages the server may send (§6 egress).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    HandshakeResponse {
        session_id: u32,
        player_id: u32,
        tick_rate: f64,
    },
    GameStateBaseline {
        frame: BaselineFrame,
    },
    GameStateDelta {
        frame: DeltaFrame,
    },
    ModuleInteractResult {
        module_id: u32,
        success: bool,
        reason: Option<InteractionFailureReason>,
    },
    Pong {
        client_time_ms: u64,
        server_tick: u64,
    },
    Disconnect {
        reason: String,
    },
}

impl ClientMessage {
    /// Parses one JSON text frame. Malformed JSON is a validation
    /// failure, not a panic (§7).
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl ServerMessage {
    #[must_use]
    pub fn to_json(&self) -> String {
        // Every variant here is composed of JSON-safe primitives and
        // already-`Serialize` frame types, so this cannot fail.
        serde_json::to_string(self).unwrap_or_else(|err| {
            tracing::error!(%err, "failed to serialize outgoing message");
            "{\"type\":\"disconnect\",\"reason\":\"internal encode error\"}".to_string()
        })
    }
}

pub type WireModuleId = ModuleId;
pub type WirePlayerId = PlayerId;
pub type WireSessionId = SessionId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_roundtrips_through_json() {
        let msg = ClientMessage::Handshake {
            name: "Calico Jack".to_string(),
            client_version: "1.0.0".to_string(),
        };
        let text = serde_json::to_string(&msg).unwrap();
        let parsed = ClientMessage::from_json(&text).unwrap();
        matches!(parsed, ClientMessage::Handshake { .. });
    }

    #[test]
    fn malformed_json_is_an_error_not_a_panic() {
        assert!(ClientMessage::from_json("{not json}").is_err());
    }

    #[test]
    fn server_message_encodes_tagged_type_field() {
        let msg = ServerMessage::Pong {
            client_time_ms: 42,
            server_tick: 7,
        };
        let text = msg.to_json();
        assert!(text.contains("\"type\":\"pong\""));
    }
}
