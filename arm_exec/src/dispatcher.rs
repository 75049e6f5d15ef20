//! # Command dispatcher
//!
//! The command protocol state machine. Every command from the commands topic is handled here:
//! ownership is checked, motion requests are staged and queued on the motion slot, and immediate
//! responses are published.
//!
//! The dispatcher never waits for a motion. Responses to motion requests (`HOME_SEARCHED` and the
//! moved reports) are published by the motion jobs once the arm has moved.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::arm::{Client, CommandObject, Signal};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::{
    motion::{MotionExecutor, MotionSlot, TrajectoryRunner},
    notifier::Notifier,
    ownership::{OwnershipError, OwnershipManager},
    state::SessionState,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct CommandDispatcher {
    state: SessionState,

    ownership: OwnershipManager,

    executor: MotionExecutor,

    runner: TrajectoryRunner,

    notifier: Notifier,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What the dispatcher did with a command.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A response with the given signal was published.
    Replied(Signal),

    /// Motion was queued, its results will be published once it is executed.
    Scheduled(Signal),

    /// The command was refused, nothing was published.
    Rejected(Rejection),

    /// The signal isn't a command the controller handles.
    Ignored(Signal),
}

/// Reasons for refusing a command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("the arm is already owned by {0}")]
    Busy(Client),

    #[error("the command carries no valid client")]
    InvalidClient,

    #[error("the client is not the owner of the arm")]
    Unauthorized,

    #[error("the command carries no point or trajectory to execute")]
    MissingPayload,

    #[error("the motion slot is not accepting jobs")]
    SlotUnavailable,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CommandDispatcher {
    pub fn new(state: SessionState, slot: Arc<MotionSlot>, notifier: Notifier) -> Self {
        let executor = MotionExecutor::new(slot, state.clone(), notifier.clone());

        Self {
            ownership: OwnershipManager::new(state.clone()),
            runner: TrajectoryRunner::new(executor.clone()),
            executor,
            state,
            notifier,
        }
    }

    /// Handle a single command.
    pub fn dispatch(&self, cmd: &CommandObject) -> DispatchOutcome {
        debug!("Dispatching {:?} from {:?}", cmd.signal, cmd.client);

        let outcome = match cmd.signal {
            Signal::CheckStatus => self.check_status(),
            Signal::Connect => self.connect(cmd),
            Signal::MoveToPoint => self.move_to_point(cmd),
            Signal::ApplyTrajectory => self.apply_trajectory(cmd),
            Signal::CancelTrajectory => self.cancel_trajectory(cmd),
            Signal::Disconnect => self.disconnect(cmd),
            s => DispatchOutcome::Ignored(s),
        };

        match &outcome {
            DispatchOutcome::Rejected(r) => warn!("{:?} rejected: {}", cmd.signal, r),
            DispatchOutcome::Ignored(s) => debug!("Ignoring {:?} on the commands topic", s),
            _ => (),
        }

        outcome
    }

    /// The session state shared with the motion jobs.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn check_status(&self) -> DispatchOutcome {
        self.reply(Signal::Status, None)
    }

    fn connect(&self, cmd: &CommandObject) -> DispatchOutcome {
        let candidate = match &cmd.client {
            Some(c) => c,
            None => return DispatchOutcome::Rejected(Rejection::InvalidClient),
        };

        match self.ownership.acquire(candidate) {
            Ok(_) => (),
            Err(OwnershipError::Busy(owner)) => {
                return DispatchOutcome::Rejected(Rejection::Busy(owner))
            }
            Err(_) => return DispatchOutcome::Rejected(Rejection::InvalidClient),
        }

        // The client must learn it is connected before it can see the home search complete
        let outcome = self.reply(Signal::Connected, Some(candidate.clone()));

        if let Err(e) = self.executor.run_home_search(candidate.clone()) {
            error!("Could not queue the home search: {}", e);
        }

        outcome
    }

    fn move_to_point(&self, cmd: &CommandObject) -> DispatchOutcome {
        let owner = match self.authorized(cmd) {
            Ok(o) => o,
            Err(r) => return DispatchOutcome::Rejected(r),
        };

        let point = match cmd.point() {
            Some(p) if !p.is_empty() => p.clone(),
            _ => return DispatchOutcome::Rejected(Rejection::MissingPayload),
        };

        info!("Moving to point {:?} for {}", point.coordinates, owner);

        let ticket = self.state.stage_point(point.clone());

        match self.executor.run_move_to_point(owner, ticket, point) {
            Ok(()) => DispatchOutcome::Scheduled(Signal::MoveToPoint),
            Err(e) => {
                error!("Could not queue the move: {}", e);
                DispatchOutcome::Rejected(Rejection::SlotUnavailable)
            }
        }
    }

    fn apply_trajectory(&self, cmd: &CommandObject) -> DispatchOutcome {
        let owner = match self.authorized(cmd) {
            Ok(o) => o,
            Err(r) => return DispatchOutcome::Rejected(r),
        };

        let trajectory = match cmd.trajectory() {
            Some(t) if !t.is_empty() => t.clone(),
            _ => return DispatchOutcome::Rejected(Rejection::MissingPayload),
        };

        info!(
            "Applying trajectory of {} points for {}",
            trajectory.len(),
            owner
        );

        let ticket = self.state.stage_trajectory(trajectory.clone());

        match self.runner.start(owner, ticket, trajectory) {
            Ok(()) => DispatchOutcome::Scheduled(Signal::ApplyTrajectory),
            Err(e) => {
                error!("Could not queue the trajectory: {}", e);
                DispatchOutcome::Rejected(Rejection::SlotUnavailable)
            }
        }
    }

    fn cancel_trajectory(&self, cmd: &CommandObject) -> DispatchOutcome {
        let owner = match self.authorized(cmd) {
            Ok(o) => o,
            Err(r) => return DispatchOutcome::Rejected(r),
        };

        if self.state.request_cancel() {
            info!("Trajectory cancelled by {}", owner);
        } else {
            info!("Cancel requested by {} with no trajectory executing", owner);
        }

        self.reply(Signal::CanceledTrajectory, Some(owner))
    }

    fn disconnect(&self, cmd: &CommandObject) -> DispatchOutcome {
        let requester = match &cmd.client {
            Some(c) => c,
            None => return DispatchOutcome::Rejected(Rejection::Unauthorized),
        };

        match self.ownership.release(requester) {
            Ok(_) => self.reply(Signal::Disconnected, Some(requester.clone())),
            Err(_) => DispatchOutcome::Rejected(Rejection::Unauthorized),
        }
    }

    /// Get the client of the command if it owns the arm.
    fn authorized(&self, cmd: &CommandObject) -> Result<Client, Rejection> {
        match &cmd.client {
            Some(c) if self.ownership.authorize(c) => Ok(c.clone()),
            _ => Err(Rejection::Unauthorized),
        }
    }

    /// Publish a response carrying the current error flag.
    fn reply(&self, signal: Signal, client: Option<Client>) -> DispatchOutcome {
        let mut response = CommandObject::new(signal).with_error(self.state.error());
        if let Some(c) = client {
            response = response.with_client(c);
        }

        self.notifier.command(&response);

        DispatchOutcome::Replied(signal)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        motion::SimulatedActuator,
        test_util::{recording_notifier, Recorder},
    };
    use comms_if::arm::{JointInfo, MovedObject, Point, Trajectory};
    use std::time::Duration;

    fn dispatcher() -> (CommandDispatcher, Arc<MotionSlot>, Arc<Recorder>) {
        let actuator = SimulatedActuator::new(
            vec![JointInfo::new(-100.0, 100.0); 2],
            Duration::ZERO,
            Duration::ZERO,
        );
        let slot = Arc::new(MotionSlot::new(Box::new(actuator)).unwrap());
        let (notifier, recorder) = recording_notifier();

        (
            CommandDispatcher::new(SessionState::new(), slot.clone(), notifier),
            slot,
            recorder,
        )
    }

    fn cmd(signal: Signal, client: &str) -> CommandObject {
        CommandObject::new(signal).with_client(Client::new(client))
    }

    #[test]
    fn test_check_status() {
        let (disp, _slot, recorder) = dispatcher();
        disp.state().set_error();

        assert_eq!(
            disp.dispatch(&CommandObject::new(Signal::CheckStatus)),
            DispatchOutcome::Replied(Signal::Status)
        );

        let cmds = recorder.commands();
        assert_eq!(cmds, vec![CommandObject::new(Signal::Status).with_error(true)]);
    }

    #[test]
    fn test_connect_then_home_searched() {
        let (disp, slot, recorder) = dispatcher();

        assert_eq!(
            disp.dispatch(&cmd(Signal::Connect, "alice")),
            DispatchOutcome::Replied(Signal::Connected)
        );
        slot.shutdown();

        let cmds = recorder.wait_commands(2);
        let signals: Vec<Signal> = cmds.iter().map(|c| c.signal).collect();
        assert_eq!(signals, vec![Signal::Connected, Signal::HomeSearched]);
        assert!(cmds.iter().all(|c| c.client == Some(Client::new("alice"))));
    }

    #[test]
    fn test_connect_when_busy() {
        let (disp, slot, recorder) = dispatcher();

        disp.dispatch(&cmd(Signal::Connect, "alice"));

        assert_eq!(
            disp.dispatch(&cmd(Signal::Connect, "bob")),
            DispatchOutcome::Rejected(Rejection::Busy(Client::new("alice")))
        );
        assert_eq!(
            disp.dispatch(&CommandObject::new(Signal::Connect)),
            DispatchOutcome::Rejected(Rejection::InvalidClient)
        );
        slot.shutdown();

        // Only alice's connection and home search were published
        assert_eq!(recorder.commands().len(), 2);
        assert_eq!(disp.state().owner(), Some(Client::new("alice")));
    }

    #[test]
    fn test_motion_requires_owner() {
        let (disp, slot, recorder) = dispatcher();
        let point = Point::new(vec![1.0, 2.0]);

        assert_eq!(
            disp.dispatch(&cmd(Signal::MoveToPoint, "bob").with_point(point.clone())),
            DispatchOutcome::Rejected(Rejection::Unauthorized)
        );

        disp.dispatch(&cmd(Signal::Connect, "alice"));

        assert_eq!(
            disp.dispatch(&cmd(Signal::MoveToPoint, "bob").with_point(point.clone())),
            DispatchOutcome::Rejected(Rejection::Unauthorized)
        );
        assert_eq!(
            disp.dispatch(
                &cmd(Signal::ApplyTrajectory, "bob")
                    .with_trajectory(Trajectory::new(vec![point.clone()]))
            ),
            DispatchOutcome::Rejected(Rejection::Unauthorized)
        );
        assert_eq!(
            disp.dispatch(&cmd(Signal::CancelTrajectory, "bob")),
            DispatchOutcome::Rejected(Rejection::Unauthorized)
        );
        slot.shutdown();

        assert!(recorder.wait_moved(0).is_empty());
    }

    #[test]
    fn test_empty_payloads_rejected() {
        let (disp, _slot, _) = dispatcher();
        disp.dispatch(&cmd(Signal::Connect, "alice"));

        assert_eq!(
            disp.dispatch(&cmd(Signal::MoveToPoint, "alice")),
            DispatchOutcome::Rejected(Rejection::MissingPayload)
        );
        assert_eq!(
            disp.dispatch(&cmd(Signal::MoveToPoint, "alice").with_point(Point::default())),
            DispatchOutcome::Rejected(Rejection::MissingPayload)
        );
        assert_eq!(
            disp.dispatch(
                &cmd(Signal::ApplyTrajectory, "alice").with_trajectory(Trajectory::default())
            ),
            DispatchOutcome::Rejected(Rejection::MissingPayload)
        );
        assert!(!disp.state().is_executing());
        assert_eq!(disp.state().staged_point(), None);
    }

    #[test]
    fn test_move_and_trajectory_reported() {
        let (disp, slot, recorder) = dispatcher();
        disp.dispatch(&cmd(Signal::Connect, "alice"));

        let point = Point::new(vec![10.0, 20.0]);
        let traj = Trajectory::new(vec![Point::new(vec![1.0, 1.0]), Point::new(vec![2.0, 2.0])]);

        assert_eq!(
            disp.dispatch(&cmd(Signal::MoveToPoint, "alice").with_point(point.clone())),
            DispatchOutcome::Scheduled(Signal::MoveToPoint)
        );
        assert_eq!(
            disp.dispatch(&cmd(Signal::ApplyTrajectory, "alice").with_trajectory(traj.clone())),
            DispatchOutcome::Scheduled(Signal::ApplyTrajectory)
        );
        slot.shutdown();

        let alice = Client::new("alice");
        assert_eq!(
            recorder.wait_moved(3),
            vec![
                MovedObject::new(alice.clone(), false, point),
                MovedObject::new(alice.clone(), false, traj.points[0].clone()),
                MovedObject::new(alice, false, traj.points[1].clone()),
            ]
        );
        assert!(!disp.state().is_executing());
    }

    #[test]
    fn test_cancel_replies_immediately() {
        let (disp, _slot, recorder) = dispatcher();
        disp.dispatch(&cmd(Signal::Connect, "alice"));

        assert_eq!(
            disp.dispatch(&cmd(Signal::CancelTrajectory, "alice")),
            DispatchOutcome::Replied(Signal::CanceledTrajectory)
        );

        assert!(recorder
            .commands()
            .contains(&cmd(Signal::CanceledTrajectory, "alice")));
    }

    #[test]
    fn test_disconnect_only_by_owner() {
        let (disp, _slot, recorder) = dispatcher();
        disp.dispatch(&cmd(Signal::Connect, "alice"));

        assert_eq!(
            disp.dispatch(&cmd(Signal::Disconnect, "bob")),
            DispatchOutcome::Rejected(Rejection::Unauthorized)
        );
        assert_eq!(disp.state().owner(), Some(Client::new("alice")));

        assert_eq!(
            disp.dispatch(&cmd(Signal::Disconnect, "alice")),
            DispatchOutcome::Replied(Signal::Disconnected)
        );
        assert_eq!(disp.state().owner(), None);
        assert!(recorder
            .commands()
            .contains(&cmd(Signal::Disconnected, "alice")));

        // Another client may now connect
        assert_eq!(
            disp.dispatch(&cmd(Signal::Connect, "bob")),
            DispatchOutcome::Replied(Signal::Connected)
        );
    }

    #[test]
    fn test_response_signals_ignored() {
        let (disp, _slot, recorder) = dispatcher();

        for s in [Signal::Connected, Signal::Status, Signal::HomeSearched, Signal::GetMetaInfo] {
            assert_eq!(disp.dispatch(&cmd(s, "alice")), DispatchOutcome::Ignored(s));
        }

        assert!(recorder.commands().is_empty());
    }
}
