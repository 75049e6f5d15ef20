//! # Notifier
//!
//! Publishes outbound protocol objects on their topics. Publishing is best effort: failures are
//! logged and never propagated to the caller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    arm::{CommandObject, MetaInfoObject, MovedObject, Topics},
    net::Publish,
};
use log::{trace, warn};
use std::sync::Arc;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Serializes and publishes outbound objects. Clones share the same publisher.
#[derive(Clone)]
pub struct Notifier {
    publisher: Arc<dyn Publish>,

    topics: Topics,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Notifier {
    pub fn new(publisher: Arc<dyn Publish>, topics: Topics) -> Self {
        Self { publisher, topics }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Publish a command response on the commands topic.
    pub fn command(&self, cmd: &CommandObject) {
        self.send(&self.topics.commands, cmd.to_json());
    }

    /// Publish a motion report on the moved topic.
    pub fn moved(&self, moved: &MovedObject) {
        self.send(&self.topics.moved, moved.to_json());
    }

    /// Publish the meta information on the metainfo topic.
    pub fn metainfo(&self, metainfo: &MetaInfoObject) {
        self.send(&self.topics.metainfo, metainfo.to_json());
    }

    fn send(&self, topic: &str, payload: Result<String, serde_json::Error>) {
        let payload = match payload {
            Ok(p) => p,
            Err(e) => {
                warn!("Could not serialize message for {}: {}", topic, e);
                return;
            }
        };

        trace!("Publishing on {}: {}", topic, payload);

        if let Err(e) = self.publisher.publish(topic, &payload) {
            warn!("Could not publish message: {}", e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
