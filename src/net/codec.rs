//! Newline-delimited JSON framing

use serde::Serialize;
use serde_json::Value;

use super::protocol::{ClientMsg, CLIENT_ACTIONS};

/// Reasons an inbound line could not become a command
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Message must be a JSON object")]
    NotAnObject,

    #[error("Missing action")]
    MissingAction,

    #[error("Unknown action")]
    UnknownAction(String),

    #[error("Invalid {action} command: {source}")]
    InvalidFields {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode one line (without its terminator) into a command
pub fn decode_command(line: &str) -> Result<ClientMsg, CodecError> {
    let value: Value = serde_json::from_str(line.trim()).map_err(CodecError::Malformed)?;

    let action = value
        .as_object()
        .ok_or(CodecError::NotAnObject)?
        .get("action")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingAction)?
        .to_string();

    if !CLIENT_ACTIONS.contains(&action.as_str()) {
        return Err(CodecError::UnknownAction(action));
    }

    serde_json::from_value(value).map_err(|source| CodecError::InvalidFields { action, source })
}

/// Encode a message as a single line (no terminator)
pub fn encode<T: Serialize>(msg: &T) -> Result<String, CodecError> {
    serde_json::to_string(msg).map_err(CodecError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::{CommandResponse, Direction};

    #[test]
    fn test_decode_start_moving() {
        let msg = decode_command(r#"{"action":"start_moving","direction":"left"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::StartMoving {
                direction: Direction::Left
            }
        );
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let msg = decode_command(r#"{"action":"jump","player":"player1"}"#).unwrap();
        assert_eq!(msg, ClientMsg::Jump);
    }

    #[test]
    fn test_decode_tolerates_carriage_return() {
        let msg = decode_command("{\"action\":\"restart\"}\r").unwrap();
        assert_eq!(msg, ClientMsg::Restart);
    }

    #[test]
    fn test_unknown_action() {
        let err = decode_command(r#"{"action":"move","direction":"up"}"#).unwrap_err();
        assert!(matches!(err, CodecError::UnknownAction(ref a) if a == "move"));
        assert_eq!(err.to_string(), "Unknown action");
    }

    #[test]
    fn test_missing_action() {
        assert!(matches!(
            decode_command(r#"{"direction":"left"}"#),
            Err(CodecError::MissingAction)
        ));
        assert!(matches!(
            decode_command(r#"{"action":7}"#),
            Err(CodecError::MissingAction)
        ));
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            decode_command(r#"["jump"]"#),
            Err(CodecError::NotAnObject)
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            decode_command("{\"action\":"),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_direction() {
        let err = decode_command(r#"{"action":"start_moving"}"#).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFields { ref action, .. } if action == "start_moving"));
    }

    #[test]
    fn test_bad_direction() {
        let err = decode_command(r#"{"action":"start_moving","direction":"up"}"#).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFields { .. }));
    }

    #[test]
    fn test_encode_is_single_line() {
        let line = encode(&CommandResponse::success("Jumped")).unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(line, r#"{"status":"success","message":"Jumped"}"#);
    }
}
