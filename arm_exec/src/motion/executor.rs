//! # Motion executor
//!
//! Runs home searches and single point moves on the motion slot and publishes their results.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::arm::{Client, CommandObject, MovedObject, Point, Signal};
use log::{info, warn};
use std::sync::Arc;

use super::{Actuator, MotionJob, MotionSlot, MotionSlotError};
use crate::{
    notifier::Notifier,
    state::{SessionState, Ticket},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Schedules single motions on the motion slot.
#[derive(Clone)]
pub struct MotionExecutor {
    slot: Arc<MotionSlot>,

    state: SessionState,

    notifier: Notifier,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionExecutor {
    pub fn new(slot: Arc<MotionSlot>, state: SessionState, notifier: Notifier) -> Self {
        Self {
            slot,
            state,
            notifier,
        }
    }

    /// Queue a home search for the given owner.
    ///
    /// Once the arm is home `HOME_SEARCHED` is published on the commands topic. A failed home
    /// search raises the error flag. Reaching home never clears it.
    pub fn run_home_search(&self, owner: Client) -> Result<(), MotionSlotError> {
        let state = self.state.clone();
        let notifier = self.notifier.clone();

        self.submit(Box::new(move |actuator: &mut dyn Actuator| {
            info!("Searching for home position...");

            match actuator.search_home() {
                Ok(()) => info!("Home position reached"),
                Err(e) => {
                    warn!("Home search failed: {}", e);
                    state.set_error();
                }
            }

            notifier.command(
                &CommandObject::new(Signal::HomeSearched)
                    .with_client(owner)
                    .with_error(state.error()),
            );
        }))
    }

    /// Queue a move to the given point, staged in the session state under `ticket`.
    ///
    /// On completion a moved report is published and the staged point is cleared. If the slot
    /// no longer accepts jobs the staged point is cleared straight away.
    pub fn run_move_to_point(
        &self,
        owner: Client,
        ticket: Ticket,
        point: Point,
    ) -> Result<(), MotionSlotError> {
        let state = self.state.clone();
        let notifier = self.notifier.clone();

        let result = self.submit(Box::new(move |actuator: &mut dyn Actuator| {
            move_and_report(actuator, &state, &notifier, &owner, &point);
            state.finish_point(ticket);
        }));

        if result.is_err() {
            self.state.finish_point(ticket);
        }

        result
    }

    pub(crate) fn submit(&self, job: MotionJob) -> Result<(), MotionSlotError> {
        self.slot.submit(job)
    }

    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Move the arm to a single point and publish the moved report.
///
/// Failures raise the error flag, the report is still published with `error: true` and the
/// requested point as content.
pub(crate) fn move_and_report(
    actuator: &mut dyn Actuator,
    state: &SessionState,
    notifier: &Notifier,
    owner: &Client,
    point: &Point,
) {
    let reached = match actuator.move_to(point) {
        Ok(p) => {
            info!("Arm moved to point {:?}", p.coordinates);
            p
        }
        Err(e) => {
            warn!("Move to {:?} failed: {}", point.coordinates, e);
            state.set_error();
            point.clone()
        }
    };

    notifier.moved(&MovedObject::new(owner.clone(), state.error(), reached));
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
