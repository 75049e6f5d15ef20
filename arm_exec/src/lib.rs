//! # Arm control library.
//!
//! Coordinates a single robotic arm shared between many clients. One client at a time may own
//! the arm, and only the owner may move it. Motion requests are executed in the background, one
//! at a time, while new messages keep being handled.
//!
//! # Architecture
//!
//! - `router` receives raw messages, validates them and passes commands on
//! - `dispatcher` runs the command protocol, checking ownership with `ownership`
//! - `motion` executes accepted requests on the single `MotionSlot`
//! - `notifier` publishes responses and reports
//!
//! All mutable state is held in one `SessionState`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command dispatcher - the protocol state machine
pub mod dispatcher;

/// Motion execution - the motion slot, actuators, home search, point moves and trajectories
pub mod motion;

/// Notifier - best effort publishing of outbound objects
pub mod notifier;

/// Ownership manager - grants and revokes exclusive control of the arm
pub mod ownership;

/// Executable parameters
pub mod params;

/// Message router - demultiplexes inbound messages by topic and signal
pub mod router;

/// Session state - all mutable state shared between the dispatcher and motion jobs
pub mod state;

#[cfg(test)]
mod test_util;
