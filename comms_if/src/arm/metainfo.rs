//! # Meta information objects
//!
//! Static description of the arm, published on the `metainfo` channel.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{ArmParseError, JointInfo, Signal};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Description of the arm: its name and the limits of each joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaInfoObject {
    /// Always [`Signal::MetaInfo`].
    pub signal: Signal,

    pub name: String,

    pub joints: Vec<JointInfo>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MetaInfoObject {
    pub fn new<S: Into<String>>(name: S, joints: Vec<JointInfo>) -> Self {
        Self {
            signal: Signal::MetaInfo,
            name: name.into(),
            joints,
        }
    }

    /// Parse a meta information object from a JSON packet.
    pub fn from_json(json_str: &str) -> Result<Self, ArmParseError> {
        let obj: Self = serde_json::from_str(json_str)?;

        match obj.signal {
            Signal::MetaInfo => Ok(obj),
            found => Err(ArmParseError::UnexpectedSignal {
                expected: Signal::MetaInfo,
                found,
            }),
        }
    }

    /// Serialize the object into a JSON packet.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
