//! Wire protocol message definitions
//! One JSON object per line; every object carries an `action` (events) or `status` (acks)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::physics::Position;

/// Walking direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Left => f.write_str("left"),
            Direction::Right => f.write_str("right"),
        }
    }
}

/// Every action name a client may send
pub const CLIENT_ACTIONS: [&str; 5] = ["start_moving", "stop_moving", "jump", "attack", "restart"];

/// Commands sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Key pressed: walk in a direction until stopped
    StartMoving { direction: Direction },

    /// Key released
    StopMoving { direction: Direction },

    Jump,

    /// Hit the opponent; the kind only flavours the messages
    Attack {
        #[serde(rename = "type")]
        kind: String,
    },

    /// Reset both fighters
    Restart,
}

impl ClientMsg {
    pub fn action(&self) -> &'static str {
        match self {
            ClientMsg::StartMoving { .. } => "start_moving",
            ClientMsg::StopMoving { .. } => "stop_moving",
            ClientMsg::Jump => "jump",
            ClientMsg::Attack { .. } => "attack",
            ClientMsg::Restart => "restart",
        }
    }
}

/// Events sent from server to clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMsg {
    /// First message on every connection
    Welcome {
        id: Uuid,
        server_time: u64,
        tick_rate: u32,
    },

    /// Full roster snapshot, slot 0 first
    Initialize {
        players: [Option<RosterEntry>; 2],
        queue_len: usize,
    },

    /// A fighter moved far enough to be worth reporting
    UpdatePosition {
        slot: usize,
        id: Uuid,
        position: Position,
    },

    /// An attack landed
    Attacked {
        attacker: Uuid,
        target: Uuid,
        #[serde(rename = "type")]
        kind: String,
        target_health: u8,
    },

    /// A fighter's health reached zero
    MatchOver { winner: Uuid, loser: Uuid },

    /// A connection went away; `slot` is None for a queued player
    PlayerLeft { id: Uuid, slot: Option<usize> },
}

/// One occupied slot in a roster snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub id: Uuid,
    pub position: Position,
    pub health: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Acknowledgement sent only to the connection that issued a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_health: Option<u8>,
}

impl CommandResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            action: None,
            target_health: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            action: None,
            target_health: None,
        }
    }

    pub fn with_action(mut self, action: &'static str) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_target_health(mut self, health: u8) -> Self {
        self.target_health = Some(health);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_client_actions_match_variants() {
        let samples = [
            ClientMsg::StartMoving {
                direction: Direction::Left,
            },
            ClientMsg::StopMoving {
                direction: Direction::Right,
            },
            ClientMsg::Jump,
            ClientMsg::Attack {
                kind: "medium_punch".to_string(),
            },
            ClientMsg::Restart,
        ];
        for (msg, name) in samples.iter().zip(CLIENT_ACTIONS) {
            assert_eq!(msg.action(), name);
        }
    }

    #[test]
    fn test_attack_kind_uses_type_field() {
        let msg: ClientMsg =
            serde_json::from_value(json!({"action": "attack", "type": "medium_punch"})).unwrap();
        assert_eq!(
            msg,
            ClientMsg::Attack {
                kind: "medium_punch".to_string()
            }
        );
    }

    #[test]
    fn test_update_position_shape() {
        let id = Uuid::new_v4();
        let msg = ServerMsg::UpdatePosition {
            slot: 1,
            id,
            position: Position::new(500, 318),
        };
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["action"], "update_position");
        assert_eq!(value["slot"], 1);
        assert_eq!(value["id"], id.to_string());
        assert_eq!(value["position"], json!([500, 318]));
    }

    #[test]
    fn test_initialize_keeps_empty_slots() {
        let id = Uuid::new_v4();
        let msg = ServerMsg::Initialize {
            players: [
                Some(RosterEntry {
                    id,
                    position: Position::new(100, 318),
                    health: 100,
                }),
                None,
            ],
            queue_len: 0,
        };
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["action"], "initialize");
        assert_eq!(value["players"][0]["position"], json!([100, 318]));
        assert_eq!(value["players"][1], Value::Null);
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let value = serde_json::to_value(CommandResponse::error("Unknown action")).unwrap();
        assert_eq!(value, json!({"status": "error", "message": "Unknown action"}));

        let value = serde_json::to_value(
            CommandResponse::success("Started moving left").with_action("start_moving"),
        )
        .unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["action"], "start_moving");
    }
}
