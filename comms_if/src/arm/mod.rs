//! # Arm protocol
//!
//! Objects exchanged with clients of the arm controller, and their JSON codecs.
//!
//! Three channels are used:
//! - `metainfo`: clients request the static description of the arm, the controller answers.
//! - `<robot>/commands`: clients send commands, the controller publishes responses.
//! - `<robot>/moved`: the controller publishes a report each time the arm reaches a point.
//!
//! Every message belonging to the protocol carries an integer `signal` field. Messages without
//! one are not part of this protocol and are ignored by the controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod command;
mod metainfo;
mod moved;
mod types;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::{error::Category, Value};
use std::convert::TryFrom;
use thiserror::Error;

pub use command::{CommandObject, Payload};
pub use metainfo::MetaInfoObject;
pub use moved::MovedObject;
pub use types::{Client, JointInfo, Point, Trajectory};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Name of the meta information channel.
pub const META_INFO_CHANNEL: &str = "metainfo";

/// Name of the commands channel, prefixed by the robot name to build the topic.
pub const COMMANDS_CHANNEL: &str = "commands";

/// Name of the moved channel, prefixed by the robot name to build the topic.
pub const MOVED_CHANNEL: &str = "moved";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The full topic names used by one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// `metainfo`
    pub metainfo: String,

    /// `<robot>/commands`
    pub commands: String,

    /// `<robot>/moved`
    pub moved: String,
}

/// The integer code did not match any known signal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{0} is not a recognised signal code")]
pub struct UnknownSignal(pub i64);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Signal codes identifying the semantic type of a protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Signal {
    GetMetaInfo = 1,
    MetaInfo = 2,
    CheckStatus = 3,
    Status = 4,
    Connect = 5,
    Connected = 6,
    MoveToPoint = 7,
    ApplyTrajectory = 8,
    CancelTrajectory = 9,
    CanceledTrajectory = 10,
    Disconnect = 11,
    Disconnected = 12,
    HomeSearched = 13,
}

/// Possible errors when decoding a protocol message.
#[derive(Debug, Error)]
pub enum ArmParseError {
    #[error("Message contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Message does not match the expected schema: {0}")]
    InvalidSchema(serde_json::Error),

    #[error("Expected \"signal\" to be an integer, found {0}")]
    InvalidSignalField(String),

    #[error(transparent)]
    UnknownSignal(#[from] UnknownSignal),

    #[error("Command carries both a point and a trajectory")]
    ConflictingPayload,

    #[error("Expected a {expected:?} message, found {found:?}")]
    UnexpectedSignal { expected: Signal, found: Signal },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Topics {
    /// Build the topic names for the robot with the given name.
    pub fn new(robot_name: &str) -> Self {
        Self {
            metainfo: META_INFO_CHANNEL.to_string(),
            commands: format!("{}/{}", robot_name, COMMANDS_CHANNEL),
            moved: format!("{}/{}", robot_name, MOVED_CHANNEL),
        }
    }
}

impl TryFrom<i64> for Signal {
    type Error = UnknownSignal;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Signal::GetMetaInfo,
            2 => Signal::MetaInfo,
            3 => Signal::CheckStatus,
            4 => Signal::Status,
            5 => Signal::Connect,
            6 => Signal::Connected,
            7 => Signal::MoveToPoint,
            8 => Signal::ApplyTrajectory,
            9 => Signal::CancelTrajectory,
            10 => Signal::CanceledTrajectory,
            11 => Signal::Disconnect,
            12 => Signal::Disconnected,
            13 => Signal::HomeSearched,
            c => return Err(UnknownSignal(c)),
        })
    }
}

impl From<Signal> for i64 {
    fn from(signal: Signal) -> Self {
        signal as i64
    }
}

impl From<serde_json::Error> for ArmParseError {
    /// Syntax errors mean the payload isn't JSON at all, data errors mean a field is missing or
    /// has the wrong type.
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            Category::Data => ArmParseError::InvalidSchema(e),
            _ => ArmParseError::InvalidJson(e),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Extract the raw signal code from a message.
///
/// Returns `Ok(None)` if the message has no `signal` field, meaning it does not belong to this
/// protocol.
pub fn extract_signal(json_str: &str) -> Result<Option<i64>, ArmParseError> {
    let val: Value = serde_json::from_str(json_str)?;

    match val.get("signal") {
        None => Ok(None),
        Some(s) => match s.as_i64() {
            Some(code) => Ok(Some(code)),
            None => Err(ArmParseError::InvalidSignalField(s.to_string())),
        },
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_topics() {
        let topics = Topics::new("EDScorbotSim");

        assert_eq!(topics.metainfo, "metainfo");
        assert_eq!(topics.commands, "EDScorbotSim/commands");
        assert_eq!(topics.moved, "EDScorbotSim/moved");
    }

    #[test]
    fn test_signal_codes() {
        for code in 1..=13 {
            let signal = Signal::try_from(code).unwrap();
            assert_eq!(i64::from(signal), code);
        }

        assert_eq!(Signal::try_from(0), Err(UnknownSignal(0)));
        assert_eq!(Signal::try_from(14), Err(UnknownSignal(14)));
        assert_eq!(serde_json::to_string(&Signal::HomeSearched).unwrap(), "13");
    }

    #[test]
    fn test_extract_signal() {
        assert_eq!(extract_signal(r#"{"signal": 5, "client": {"id": "a"}}"#).unwrap(), Some(5));
        assert_eq!(extract_signal(r#"{"signal": 99}"#).unwrap(), Some(99));
        assert_eq!(extract_signal(r#"{"legacy": true}"#).unwrap(), None);
        assert_eq!(extract_signal("[1, 2]").unwrap(), None);

        assert!(matches!(
            extract_signal(r#"{"signal": "five"}"#),
            Err(ArmParseError::InvalidSignalField(_))
        ));
        assert!(matches!(
            extract_signal("not json"),
            Err(ArmParseError::InvalidJson(_))
        ));
    }
}
