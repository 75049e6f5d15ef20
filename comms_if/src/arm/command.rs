//! # Command objects
//!
//! Objects exchanged on the `<robot>/commands` channel, in both directions.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use super::{ArmParseError, Client, Point, Signal, Trajectory};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A command, or the response to one.
///
/// The `client` is only ever `Some` for a valid (non-empty) client, invalid clients are dropped
/// when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CommandWire", into = "CommandWire")]
pub struct CommandObject {
    pub signal: Signal,

    pub client: Option<Client>,

    /// Whether the arm is in an error state.
    pub error: bool,

    pub payload: Payload,
}

/// JSON layout of a command object.
#[derive(Serialize, Deserialize)]
struct CommandWire {
    signal: Signal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    client: Option<Client>,

    #[serde(default)]
    error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    point: Option<Point>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    trajectory: Option<Trajectory>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The data carried by a command, at most one of a point or a trajectory.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Point(Point),
    Trajectory(Trajectory),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CommandObject {
    /// Create a new command with no client and no payload.
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            client: None,
            error: false,
            payload: Payload::None,
        }
    }

    /// Set the client of this command, invalid clients are ignored.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client).filter(Client::is_valid);
        self
    }

    pub fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    pub fn with_point(mut self, point: Point) -> Self {
        self.payload = Payload::Point(point);
        self
    }

    pub fn with_trajectory(mut self, trajectory: Trajectory) -> Self {
        self.payload = Payload::Trajectory(trajectory);
        self
    }

    /// Return the point carried by this command, if any.
    pub fn point(&self) -> Option<&Point> {
        match &self.payload {
            Payload::Point(p) => Some(p),
            _ => None,
        }
    }

    /// Return the trajectory carried by this command, if any.
    pub fn trajectory(&self) -> Option<&Trajectory> {
        match &self.payload {
            Payload::Trajectory(t) => Some(t),
            _ => None,
        }
    }

    /// Parse a command from a JSON packet.
    pub fn from_json(json_str: &str) -> Result<Self, ArmParseError> {
        let wire: CommandWire = serde_json::from_str(json_str)?;

        Self::try_from(wire)
    }

    /// Serialize the command into a JSON packet.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl TryFrom<CommandWire> for CommandObject {
    type Error = ArmParseError;

    fn try_from(wire: CommandWire) -> Result<Self, Self::Error> {
        let payload = match (wire.point, wire.trajectory) {
            (Some(_), Some(_)) => return Err(ArmParseError::ConflictingPayload),
            (Some(p), None) => Payload::Point(p),
            (None, Some(t)) => Payload::Trajectory(t),
            (None, None) => Payload::None,
        };

        Ok(Self {
            signal: wire.signal,
            client: wire.client.filter(Client::is_valid),
            error: wire.error,
            payload,
        })
    }
}

impl From<CommandObject> for CommandWire {
    fn from(cmd: CommandObject) -> Self {
        let (point, trajectory) = match cmd.payload {
            Payload::None => (None, None),
            Payload::Point(p) => (Some(p), None),
            Payload::Trajectory(t) => (None, Some(t)),
        };

        Self {
            signal: cmd.signal,
            client: cmd.client.filter(Client::is_valid),
            error: cmd.error,
            point,
            trajectory,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::{json, Value};

    fn alice() -> Client {
        Client::new("alice")
    }

    #[test]
    fn test_round_trip_each_payload_kind() {
        let cmds = vec![
            CommandObject::new(Signal::Connect).with_client(alice()),
            CommandObject::new(Signal::MoveToPoint)
                .with_client(alice())
                .with_point(Point::new(vec![10.0, 20.0, 0.0, 0.0, 0.0, 0.0])),
            CommandObject::new(Signal::ApplyTrajectory)
                .with_client(alice())
                .with_error(true)
                .with_trajectory(Trajectory::new(vec![
                    Point::new(vec![1.0, 2.0]),
                    Point::new(vec![3.0, 4.0]),
                ])),
        ];

        for cmd in cmds {
            let json = cmd.to_json().unwrap();
            assert_eq!(CommandObject::from_json(&json).unwrap(), cmd);
        }
    }

    #[test]
    fn test_both_payloads_rejected() {
        let json = json!({
            "signal": 7,
            "client": {"id": "alice"},
            "error": false,
            "point": {"coordinates": [1.0]},
            "trajectory": {"points": [{"coordinates": [1.0]}]}
        });

        assert!(matches!(
            CommandObject::from_json(&json.to_string()),
            Err(ArmParseError::ConflictingPayload)
        ));
    }

    #[test]
    fn test_encoding_layout() {
        let cmd = CommandObject::new(Signal::Status).with_client(Client::new(""));
        let val: Value = serde_json::from_str(&cmd.to_json().unwrap()).unwrap();

        assert_eq!(val, json!({"signal": 4, "error": false}));

        let cmd = CommandObject::new(Signal::MoveToPoint)
            .with_client(alice())
            .with_point(Point::new(vec![1.5]));
        let val: Value = serde_json::from_str(&cmd.to_json().unwrap()).unwrap();

        assert_eq!(
            val,
            json!({
                "signal": 7,
                "client": {"id": "alice"},
                "error": false,
                "point": {"coordinates": [1.5]}
            })
        );
    }

    #[test]
    fn test_decoding_defaults() {
        // Clients don't have to send the error flag
        let cmd = CommandObject::from_json(r#"{"signal": 5, "client": {"id": "bob"}}"#).unwrap();
        assert_eq!(cmd.signal, Signal::Connect);
        assert_eq!(cmd.client, Some(Client::new("bob")));
        assert!(!cmd.error);
        assert_eq!(cmd.payload, Payload::None);

        // Empty client ids are treated as no client
        let cmd = CommandObject::from_json(r#"{"signal": 5, "client": {"id": ""}}"#).unwrap();
        assert_eq!(cmd.client, None);
    }

    #[test]
    fn test_malformed_commands() {
        // Client without an id
        assert!(matches!(
            CommandObject::from_json(r#"{"signal": 5, "client": {}}"#),
            Err(ArmParseError::InvalidSchema(_))
        ));

        // Point without coordinates
        assert!(matches!(
            CommandObject::from_json(r#"{"signal": 7, "point": {}}"#),
            Err(ArmParseError::InvalidSchema(_))
        ));

        // Unknown signal code
        assert!(CommandObject::from_json(r#"{"signal": 42}"#).is_err());

        // Truncated packet
        assert!(matches!(
            CommandObject::from_json(r#"{"signal": 5"#),
            Err(ArmParseError::InvalidJson(_))
        ));
    }
}
