//! # Actuators
//!
//! The [`Actuator`] trait is the only way the controller touches the arm. The physical drivers
//! are not part of this software, a [`SimulatedActuator`] stands in for them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::arm::{JointInfo, Point};
use log::debug;
use std::{thread, time::Duration};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Performs motions of the arm.
///
/// Both functions block until the motion is finished. An actuation in progress is never
/// interrupted.
pub trait Actuator: Send {
    /// Move the arm to its home position.
    fn search_home(&mut self) -> Result<(), ActuationError>;

    /// Move the arm to the target, returning the point actually reached.
    fn move_to(&mut self, target: &Point) -> Result<Point, ActuationError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An arm which takes a fixed time for each motion and always reaches its target, as long as
/// the target is within the joint limits.
pub struct SimulatedActuator {
    joints: Vec<JointInfo>,

    home_duration: Duration,

    move_duration: Duration,

    position: Point,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActuationError {
    #[error("Expected a point with {expected} coordinates, found {found}")]
    WrongDimension { expected: usize, found: usize },

    #[error("Coordinate {value} of joint {joint} is outside of the joint limits [{minimum}, {maximum}]")]
    OutOfRange {
        joint: usize,
        value: f64,
        minimum: f64,
        maximum: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimulatedActuator {
    pub fn new(joints: Vec<JointInfo>, home_duration: Duration, move_duration: Duration) -> Self {
        let position = Point::new(vec![0.0; joints.len()]);

        Self {
            joints,
            home_duration,
            move_duration,
            position,
        }
    }

    /// The last point reached by the arm.
    pub fn position(&self) -> &Point {
        &self.position
    }

    fn check_target(&self, target: &Point) -> Result<(), ActuationError> {
        if target.len() != self.joints.len() {
            return Err(ActuationError::WrongDimension {
                expected: self.joints.len(),
                found: target.len(),
            });
        }

        for (i, (joint, value)) in self.joints.iter().zip(target.coordinates.iter()).enumerate() {
            if !joint.contains(*value) {
                return Err(ActuationError::OutOfRange {
                    joint: i,
                    value: *value,
                    minimum: joint.minimum,
                    maximum: joint.maximum,
                });
            }
        }

        Ok(())
    }
}

impl Actuator for SimulatedActuator {
    fn search_home(&mut self) -> Result<(), ActuationError> {
        thread::sleep(self.home_duration);

        self.position = Point::new(vec![0.0; self.joints.len()]);

        Ok(())
    }

    fn move_to(&mut self, target: &Point) -> Result<Point, ActuationError> {
        self.check_target(target)?;

        debug!("Simulated arm moving to {:?}", target.coordinates);
        thread::sleep(self.move_duration);

        self.position = target.clone();

        Ok(self.position.clone())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
