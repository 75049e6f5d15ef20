//! # Message router
//!
//! Entry point for every inbound message. Messages are sorted by topic and signal, validated, and
//! handed on either to the meta information responder or to the [`CommandDispatcher`].
//!
//! Routing never panics: invalid messages are reported as a [`RouterError`] for the caller to log
//! and the receive loop carries on.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::arm::{self, ArmParseError, CommandObject, MetaInfoObject, Signal};
use log::{debug, info};
use std::convert::TryFrom;

use crate::{
    dispatcher::{CommandDispatcher, DispatchOutcome},
    notifier::Notifier,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct MessageRouter {
    dispatcher: CommandDispatcher,

    notifier: Notifier,

    metainfo: MetaInfoObject,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What happened to a routed message.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// The meta information was published.
    MetaInfo,

    /// The message was a command and was dispatched.
    Dispatched(DispatchOutcome),

    /// The message was dropped without effect.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreReason {
    /// The message has no `signal` field, it uses the legacy format.
    NoSignal,

    /// Nothing is handled on this topic.
    UnknownTopic(String),

    /// The signal code is not part of the protocol.
    UnrecognisedSignal(i64),

    /// The signal isn't handled on the topic it arrived on.
    NotForChannel(Signal),
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Malformed message on {topic}: {source}")]
    MalformedMessage {
        topic: String,
        source: ArmParseError,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MessageRouter {
    pub fn new(dispatcher: CommandDispatcher, notifier: Notifier, metainfo: MetaInfoObject) -> Self {
        Self {
            dispatcher,
            notifier,
            metainfo,
        }
    }

    /// Route a single message received on `topic`.
    pub fn route(&self, topic: &str, payload: &str) -> Result<RouteOutcome, RouterError> {
        let malformed = |source| RouterError::MalformedMessage {
            topic: topic.to_string(),
            source,
        };

        let code = match arm::extract_signal(payload).map_err(malformed)? {
            Some(c) => c,
            None => return Ok(RouteOutcome::Ignored(IgnoreReason::NoSignal)),
        };

        let signal = match Signal::try_from(code) {
            Ok(s) => s,
            Err(_) => {
                info!("Ignoring unrecognised signal {} on {}", code, topic);
                return Ok(RouteOutcome::Ignored(IgnoreReason::UnrecognisedSignal(code)));
            }
        };

        let topics = self.notifier.topics();

        if topic == topics.metainfo {
            match signal {
                Signal::GetMetaInfo => {
                    self.publish_metainfo();
                    Ok(RouteOutcome::MetaInfo)
                }
                s => Ok(RouteOutcome::Ignored(IgnoreReason::NotForChannel(s))),
            }
        } else if topic == topics.commands {
            let cmd = CommandObject::from_json(payload).map_err(malformed)?;
            Ok(RouteOutcome::Dispatched(self.dispatcher.dispatch(&cmd)))
        } else {
            debug!("Ignoring message on unknown topic {}", topic);
            Ok(RouteOutcome::Ignored(IgnoreReason::UnknownTopic(
                topic.to_string(),
            )))
        }
    }

    /// Publish the static meta information of the arm.
    pub fn publish_metainfo(&self) {
        debug!("Publishing meta information");
        self.notifier.metainfo(&self.metainfo);
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
