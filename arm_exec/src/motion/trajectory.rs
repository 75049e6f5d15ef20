//! # Trajectory runner
//!
//! Drives the arm through every point of a trajectory. The whole trajectory is a single job on
//! the motion slot, so queued trajectories and point moves never interleave with it.
//!
//! Cancellation is cooperative: the cancel flag is checked before each point, a move in progress
//! always completes and is reported.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::arm::{Client, Trajectory};
use log::{debug, info};

use super::{executor::move_and_report, Actuator, MotionExecutor, MotionSlotError};
use crate::state::Ticket;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Clone)]
pub struct TrajectoryRunner {
    executor: MotionExecutor,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrajectoryRunner {
    pub fn new(executor: MotionExecutor) -> Self {
        Self { executor }
    }

    /// Queue the trajectory staged under `ticket`.
    ///
    /// A moved report is published for each point reached. Once all points are reached, or the
    /// trajectory is cancelled, it is marked as finished in the session state.
    pub fn start(
        &self,
        owner: Client,
        ticket: Ticket,
        trajectory: Trajectory,
    ) -> Result<(), MotionSlotError> {
        let state = self.executor.state().clone();
        let notifier = self.executor.notifier().clone();

        let result = self.executor.submit(Box::new(move |actuator: &mut dyn Actuator| {
            state.begin_trajectory(ticket);
            info!(
                "Executing trajectory {} ({} points) for {}",
                ticket,
                trajectory.len(),
                owner
            );

            let mut reached = 0;
            for point in trajectory.points.iter() {
                if state.is_cancelled(ticket) {
                    info!(
                        "Trajectory {} cancelled after {} of {} points",
                        ticket,
                        reached,
                        trajectory.len()
                    );
                    break;
                }

                move_and_report(actuator, &state, &notifier, &owner, point);
                reached += 1;
            }

            debug!("Trajectory {} finished", ticket);
            state.finish_trajectory(ticket);
        }));

        if result.is_err() {
            self.executor.state().finish_trajectory(ticket);
        }

        result
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
