//! # Arm Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::arm::{JointInfo, MetaInfoObject};
use serde::Deserialize;
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct ArmExecParams {

    /// Name of the robot, used to build the commands and moved topics
    pub robot_name: String,

    /// Endpoint the inbound (SUB) socket binds to, clients publish their requests here
    pub commands_endpoint: String,

    /// Endpoint the outbound (PUB) socket binds to, clients subscribe to responses here
    pub events_endpoint: String,

    /// Maximum time the main loop waits for a message before checking again
    ///
    /// Units: milliseconds
    pub recv_timeout_ms: i32,

    /// Maximum time a publish may block for
    ///
    /// Units: milliseconds
    pub send_timeout_ms: i32,

    /// Time taken by the simulated arm to find its home position
    ///
    /// Units: seconds
    pub home_search_duration_s: f64,

    /// Time taken by the simulated arm to reach a point
    ///
    /// Units: seconds
    pub move_duration_s: f64,

    /// Limits of each joint of the arm, in order
    pub joints: Vec<JointInfo>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmExecParams {
    /// Build the static meta information object describing this arm.
    pub fn metainfo(&self) -> MetaInfoObject {
        MetaInfoObject::new(self.robot_name.clone(), self.joints.clone())
    }

    pub fn home_search_duration(&self) -> Duration {
        util::time::seconds_to_std_duration(self.home_search_duration_s)
    }

    pub fn move_duration(&self) -> Duration {
        util::time::seconds_to_std_duration(self.move_duration_s)
    }
}
