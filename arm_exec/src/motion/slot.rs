//! # Motion slot
//!
//! The single execution resource representing the arm. A dedicated worker thread owns the
//! actuator and runs queued jobs one after the other, so no two motions can ever overlap and
//! jobs always run in the order they were submitted.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
};

use super::Actuator;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// A unit of work run with exclusive access to the actuator.
pub type MotionJob = Box<dyn FnOnce(&mut dyn Actuator) + Send + 'static>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Single-concurrency job queue in front of the actuator.
pub struct MotionSlot {
    /// `None` once the slot has been shut down
    sender: Mutex<Option<Sender<MotionJob>>>,

    join_handle: Mutex<Option<JoinHandle<()>>>,

    /// Number of jobs submitted but not yet finished
    pending: Arc<AtomicUsize>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MotionSlotError {
    #[error("Could not spawn the motion worker thread: {0}")]
    SpawnError(std::io::Error),

    #[error("The motion slot is shut down and no longer accepts jobs")]
    Closed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionSlot {
    /// Create the slot, spawning the worker which takes ownership of the actuator.
    pub fn new(actuator: Box<dyn Actuator>) -> Result<Self, MotionSlotError> {
        let (tx, rx) = channel();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker_pending = pending.clone();
        let join_handle = thread::Builder::new()
            .name("motion_slot".into())
            .spawn(move || motion_worker(actuator, rx, worker_pending))
            .map_err(MotionSlotError::SpawnError)?;

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            join_handle: Mutex::new(Some(join_handle)),
            pending,
        })
    }

    /// Queue a job. Returns immediately, the job runs once every job submitted before it has
    /// finished.
    pub fn submit(&self, job: MotionJob) -> Result<(), MotionSlotError> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);

        let sender = sender.as_ref().ok_or(MotionSlotError::Closed)?;

        self.pending.fetch_add(1, Ordering::SeqCst);

        sender.send(job).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            MotionSlotError::Closed
        })
    }

    /// Number of jobs submitted but not yet finished, including the one running.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop accepting jobs and wait for the queued ones to finish.
    pub fn shutdown(&self) {
        // Dropping the sender ends the worker loop once the queue is drained
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let join_handle = self
            .join_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(jh) = join_handle {
            info!("Waiting for {} queued motion job(s) to finish", self.pending());
            jh.join().ok();
        }
    }
}

impl Drop for MotionSlot {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn motion_worker(
    mut actuator: Box<dyn Actuator>,
    receiver: Receiver<MotionJob>,
    pending: Arc<AtomicUsize>,
) {
    debug!("Motion worker started");

    while let Ok(job) = receiver.recv() {
        // A panicking job must not take the arm down with it
        let result = panic::catch_unwind(AssertUnwindSafe(|| job(actuator.as_mut())));

        if result.is_err() {
            error!("Motion job panicked, continuing with the next job");
        }

        pending.fetch_sub(1, Ordering::SeqCst);
    }

    debug!("Motion worker stopped");
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion::ActuationError;
    use comms_if::arm::Point;
    use std::{sync::mpsc, time::Duration};

    /// Records how many motions overlap.
    struct ProbeActuator {
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl Actuator for ProbeActuator {
        fn search_home(&mut self) -> Result<(), ActuationError> {
            Ok(())
        }

        fn move_to(&mut self, target: &Point) -> Result<Point, ActuationError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(target.clone())
        }
    }

    fn probe() -> (ProbeActuator, Arc<AtomicUsize>) {
        let max = Arc::new(AtomicUsize::new(0));
        let act = ProbeActuator {
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: max.clone(),
        };
        (act, max)
    }

    #[test]
    fn test_jobs_run_in_submission_order() {
        let (act, _) = probe();
        let slot = MotionSlot::new(Box::new(act)).unwrap();
        let (tx, rx) = mpsc::channel();

        for i in 0..10 {
            let tx = tx.clone();
            slot.submit(Box::new(move |a: &mut dyn Actuator| {
                a.move_to(&Point::new(vec![i as f64])).unwrap();
                tx.send(i).unwrap();
            }))
            .unwrap();
        }

        let order: Vec<i32> = (0..10)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_jobs_never_overlap() {
        let (act, max) = probe();
        let slot = Arc::new(MotionSlot::new(Box::new(act)).unwrap());

        let submitters: Vec<_> = (0..4)
            .map(|_| {
                let slot = slot.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        slot.submit(Box::new(|a: &mut dyn Actuator| {
                            a.move_to(&Point::new(vec![0.0])).ok();
                        }))
                        .unwrap();
                    }
                })
            })
            .collect();

        for s in submitters {
            s.join().unwrap();
        }

        slot.shutdown();

        assert_eq!(max.load(Ordering::SeqCst), 1);
        assert_eq!(slot.pending(), 0);
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let (act, _) = probe();
        let slot = MotionSlot::new(Box::new(act)).unwrap();
        let (tx, rx) = mpsc::channel();

        slot.submit(Box::new(|_: &mut dyn Actuator| panic!("job failure"))).unwrap();
        slot.submit(Box::new(move |_: &mut dyn Actuator| tx.send(()).unwrap())).unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_submit_after_shutdown() {
        let (act, _) = probe();
        let slot = MotionSlot::new(Box::new(act)).unwrap();

        slot.shutdown();

        assert!(matches!(
            slot.submit(Box::new(|_: &mut dyn Actuator| ())),
            Err(MotionSlotError::Closed)
        ));
    }
}
