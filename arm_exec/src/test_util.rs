//! Helpers shared by the unit tests of this crate.

use comms_if::{
    arm::{CommandObject, MovedObject, Topics},
    net::{Publish, PublishError},
};
use std::{
    sync::{Arc, Condvar, Mutex},
    time::{Duration, Instant},
};

use crate::notifier::Notifier;

pub(crate) const ROBOT: &str = "arm";

/// Publisher keeping every message it is given.
#[derive(Default)]
pub(crate) struct Recorder {
    sent: Mutex<Vec<(String, String)>>,
    cond: Condvar,
}

impl Publish for Recorder {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        self.cond.notify_all();
        Ok(())
    }
}

impl Recorder {
    /// Wait until at least `count` messages were published on `topic`, returning all of them.
    pub(crate) fn wait_for(&self, topic: &str, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut sent = self.sent.lock().unwrap();

        loop {
            let on_topic: Vec<String> = sent
                .iter()
                .filter(|(t, _)| t == topic)
                .map(|(_, p)| p.clone())
                .collect();

            let now = Instant::now();
            if on_topic.len() >= count || now >= deadline {
                return on_topic;
            }

            sent = self.cond.wait_timeout(sent, deadline - now).unwrap().0;
        }
    }

    pub(crate) fn on_topic(&self, topic: &str) -> Vec<String> {
        self.wait_for(topic, 0)
    }

    pub(crate) fn commands(&self) -> Vec<CommandObject> {
        self.on_topic(&Topics::new(ROBOT).commands)
            .iter()
            .map(|p| CommandObject::from_json(p).unwrap())
            .collect()
    }

    pub(crate) fn wait_commands(&self, count: usize) -> Vec<CommandObject> {
        self.wait_for(&Topics::new(ROBOT).commands, count)
            .iter()
            .map(|p| CommandObject::from_json(p).unwrap())
            .collect()
    }

    pub(crate) fn wait_moved(&self, count: usize) -> Vec<MovedObject> {
        self.wait_for(&Topics::new(ROBOT).moved, count)
            .iter()
            .map(|p| MovedObject::from_json(p).unwrap())
            .collect()
    }
}

/// Build a notifier publishing into a new recorder.
pub(crate) fn recording_notifier() -> (Notifier, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let notifier = Notifier::new(recorder.clone(), Topics::new(ROBOT));
    (notifier, recorder)
}
