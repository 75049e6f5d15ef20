//! # Moved objects
//!
//! Reports published on the `<robot>/moved` channel each time the arm finishes a motion.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{ArmParseError, Client, Point};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Report on a completed motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovedObject {
    /// The client which requested the motion.
    pub client: Client,

    /// Whether the arm is in an error state.
    pub error: bool,

    /// The point reached by the arm.
    pub content: Point,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MovedObject {
    pub fn new(client: Client, error: bool, content: Point) -> Self {
        Self {
            client,
            error,
            content,
        }
    }

    /// Parse a moved report from a JSON packet.
    pub fn from_json(json_str: &str) -> Result<Self, ArmParseError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize the report into a JSON packet.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
