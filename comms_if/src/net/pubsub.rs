//! # Publish/subscribe transport
//!
//! Messages are sent as two-frame multipart messages, the first frame holding the topic and the
//! second the JSON payload. Subscribers filter on the topic frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Mutex;

use super::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something that can publish a payload on a named topic.
///
/// Publishing is at-least-once and fire-and-forget, no acknowledgement is tracked.
pub trait Publish: Send + Sync {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Publisher backed by a zmq `PUB` socket.
///
/// The socket is shared between threads behind a mutex so that both frames of a message are
/// always sent together.
pub struct ZmqPublisher {
    socket: Mutex<MonitoredSocket>,
}

/// Subscriber backed by a zmq `SUB` socket.
pub struct ZmqSubscriber {
    socket: MonitoredSocket,
}

/// A message received by a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Could not send message on topic {0}: {1}")]
    SendError(String, zmq::Error),

    #[error("The publisher socket lock is poisoned")]
    LockPoisoned,
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Could not recieve a message: {0}")]
    RecvError(zmq::Error),

    #[error("Expected a message with 2 frames (topic, payload), found {0}")]
    InvalidFrameCount(usize),

    #[error("A recieved frame was not valid UTF-8")]
    NonUtf8Frame,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ZmqPublisher {
    /// Create a new publisher.
    ///
    /// If `bind` is set the socket binds the endpoint (server side), otherwise it connects to it.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        bind: bool,
        send_timeout_ms: i32,
    ) -> Result<Self, MonitoredSocketError> {
        let socket_options = SocketOptions {
            bind,
            send_timeout: send_timeout_ms,
            linger: 1000,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::PUB, socket_options, endpoint)?;

        Ok(Self {
            socket: Mutex::new(socket),
        })
    }
}

impl Publish for ZmqPublisher {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
        let socket = self.socket.lock().map_err(|_| PublishError::LockPoisoned)?;

        socket
            .send_multipart([topic.as_bytes(), payload.as_bytes()], 0)
            .map_err(|e| PublishError::SendError(topic.to_string(), e))
    }
}

impl ZmqSubscriber {
    /// Create a new subscriber receiving messages on the given topics.
    ///
    /// `recv_timeout_ms` bounds how long [`ZmqSubscriber::recv`] blocks before returning
    /// `Ok(None)`.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        bind: bool,
        topics: &[&str],
        recv_timeout_ms: i32,
    ) -> Result<Self, MonitoredSocketError> {
        let socket_options = SocketOptions {
            bind,
            recv_timeout: recv_timeout_ms,
            linger: 0,
            subscriptions: topics.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, endpoint)?;

        Ok(Self { socket })
    }

    /// Return if at least one publisher is connected.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Receive a single message.
    ///
    /// Returns `Ok(None)` if no message arrived within the receive timeout.
    pub fn recv(&self) -> Result<Option<InboundMessage>, SubscriberError> {
        let frames = match self.socket.recv_multipart(0) {
            Ok(f) => f,
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(SubscriberError::RecvError(e)),
        };

        if frames.len() != 2 {
            return Err(SubscriberError::InvalidFrameCount(frames.len()));
        }

        let mut frames = frames.into_iter().map(|f| String::from_utf8(f).ok());

        match (frames.next().flatten(), frames.next().flatten()) {
            (Some(topic), Some(payload)) => Ok(Some(InboundMessage { topic, payload })),
            _ => Err(SubscriberError::NonUtf8Frame),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
