//! # Session state
//!
//! All mutable state of the controller lives here, behind a single mutex. The dispatcher and the
//! background motion jobs only ever touch it through the methods below, each of which holds the
//! lock for the duration of the call and never across an actuation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::arm::{Client, Point, Trajectory};
use log::warn;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Identifies one accepted motion request.
///
/// Tickets are issued in acceptance order, so comparing two tickets tells which request was
/// accepted first.
pub type Ticket = u64;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Shared handle to the session state. Clones refer to the same state.
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<StateInner>>,
}

#[derive(Default)]
pub(crate) struct StateInner {
    /// The client holding exclusive control of the arm
    pub(crate) owner: Option<Client>,

    /// The most recently accepted single point move, until it completes
    staged_point: Option<(Ticket, Point)>,

    /// The most recently accepted trajectory, until it completes or is cancelled
    staged_trajectory: Option<(Ticket, Trajectory)>,

    /// Number of trajectories accepted but not yet finished
    pending_trajectories: usize,

    /// The trajectory whose job is running on the motion slot
    running_trajectory: Option<Ticket>,

    /// Trajectories with a ticket below this value are cancelled
    cancel_horizon: Ticket,

    next_ticket: Ticket,

    /// Persistent error flag, raised by actuation failures. Nothing in the protocol lowers it.
    error: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state.
    ///
    /// A panic in another holder doesn't leave the state inconsistent (every method is a handful
    /// of field assignments) so poisoning is ignored.
    pub(crate) fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- OWNER ----

    /// The client currently owning the arm.
    pub fn owner(&self) -> Option<Client> {
        self.lock().owner.clone()
    }

    // ---- ERROR FLAG ----

    pub fn error(&self) -> bool {
        self.lock().error
    }

    /// Raise the persistent error flag.
    pub fn set_error(&self) {
        let mut inner = self.lock();
        if !inner.error {
            warn!("Arm entering error state");
            inner.error = true;
        }
    }

    // ---- SINGLE POINT ----

    /// Stage a point to move to, returning the ticket of the request.
    pub fn stage_point(&self, point: Point) -> Ticket {
        let mut inner = self.lock();
        let ticket = inner.issue_ticket();
        inner.staged_point = Some((ticket, point));
        ticket
    }

    /// The point of the most recent move which hasn't completed yet.
    pub fn staged_point(&self) -> Option<Point> {
        self.lock().staged_point.as_ref().map(|(_, p)| p.clone())
    }

    /// Mark the move with the given ticket as complete.
    ///
    /// The staged point is only cleared if no other move was staged since.
    pub fn finish_point(&self, ticket: Ticket) {
        let mut inner = self.lock();
        if matches!(inner.staged_point, Some((t, _)) if t == ticket) {
            inner.staged_point = None;
        }
    }

    // ---- TRAJECTORY ----

    /// Stage a trajectory, returning the ticket of the request.
    pub fn stage_trajectory(&self, trajectory: Trajectory) -> Ticket {
        let mut inner = self.lock();
        let ticket = inner.issue_ticket();
        inner.staged_trajectory = Some((ticket, trajectory));
        inner.pending_trajectories += 1;
        ticket
    }

    /// The most recently accepted trajectory which hasn't finished yet.
    pub fn staged_trajectory(&self) -> Option<Trajectory> {
        self.lock().staged_trajectory.as_ref().map(|(_, t)| t.clone())
    }

    /// Mark the trajectory with the given ticket as running on the motion slot.
    pub fn begin_trajectory(&self, ticket: Ticket) {
        self.lock().running_trajectory = Some(ticket);
    }

    /// True only while a trajectory job is running. Queued trajectories don't count.
    pub fn is_executing(&self) -> bool {
        self.lock().running_trajectory.is_some()
    }

    /// Cancel every trajectory accepted so far, returning whether any was still pending, either
    /// running or queued.
    ///
    /// Trajectories accepted after this call are not affected.
    pub fn request_cancel(&self) -> bool {
        let mut inner = self.lock();
        inner.cancel_horizon = inner.next_ticket;
        inner.pending_trajectories > 0
    }

    /// Check if the trajectory with the given ticket has been cancelled.
    pub fn is_cancelled(&self, ticket: Ticket) -> bool {
        ticket < self.lock().cancel_horizon
    }

    /// Mark the trajectory with the given ticket as finished, either because all its points were
    /// executed or because it was cancelled.
    pub fn finish_trajectory(&self, ticket: Ticket) {
        let mut inner = self.lock();
        inner.pending_trajectories = inner.pending_trajectories.saturating_sub(1);
        if inner.running_trajectory == Some(ticket) {
            inner.running_trajectory = None;
        }
        if matches!(inner.staged_trajectory, Some((t, _)) if t == ticket) {
            inner.staged_trajectory = None;
        }
    }
}

impl StateInner {
    fn issue_ticket(&mut self) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
