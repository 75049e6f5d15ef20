//! # Motion module
//!
//! Executes accepted motion requests on the arm. The arm is represented by a single
//! [`MotionSlot`]: every request becomes a job on the slot's queue, and jobs run one at a time in
//! the order they were accepted. Nothing here ever blocks the caller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod actuator;
mod executor;
mod slot;
mod trajectory;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use actuator::{ActuationError, Actuator, SimulatedActuator};
pub use executor::MotionExecutor;
pub use slot::{MotionJob, MotionSlot, MotionSlotError};
pub use trajectory::TrajectoryRunner;
