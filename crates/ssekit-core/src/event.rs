//! Connection states and the events published to listeners.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decoder::{RawFrame, decode_payload};
use crate::error::StreamError;

/// Name of the event published when the stream opens.
pub const OPEN: &str = "open";
/// Name of the event published on a network or server error.
pub const ERROR: &str = "error";
/// Name of the event published when the client closes.
pub const CLOSE: &str = "close";
/// Name of the event published on every state transition.
pub const STATE: &str = "state";
/// Name of the event published when the server ends the stream.
pub const TIMEOUT: &str = "timeout";

/// Lifecycle event names. Content frames may still use them.
pub const RESERVED_EVENT_NAMES: [&str; 5] = [OPEN, ERROR, CLOSE, STATE, TIMEOUT];

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// A request is in flight or a retry is scheduled.
    Connecting,
    /// The server accepted the stream.
    Open,
    /// No request in flight and nothing scheduled.
    Closed,
}

impl ConnectionState {
    /// Upper-case name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }

    /// Whether the client is connecting or open.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content frame, ready for listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Event type from the `event` field, `"message"` by default.
    pub event_type: String,
    /// Payload, JSON-decoded when possible.
    pub data: Value,
    /// Payload exactly as received.
    pub raw_data: String,
    /// Last event id when the frame was dispatched.
    pub last_event_id: Option<String>,
}

impl From<RawFrame> for MessageEvent {
    fn from(frame: RawFrame) -> Self {
        Self {
            data: decode_payload(&frame.data),
            event_type: frame.event_type,
            raw_data: frame.data,
            last_event_id: frame.last_event_id,
        }
    }
}

/// Anything published to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The stream is open.
    Open,
    /// The connection state changed.
    State(ConnectionState),
    /// A decoded content frame.
    Message(MessageEvent),
    /// A network or server failure.
    Error(StreamError),
    /// The client closed.
    Close {
        /// Whether the close followed an error.
        after_error: bool,
    },
    /// The server ended the stream; a reconnect is scheduled.
    Timeout,
}

impl Event {
    /// Name the event is dispatched under.
    ///
    /// Content frames use their own event type, even when it matches one of
    /// the [`RESERVED_EVENT_NAMES`].
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Open => OPEN,
            Self::State(_) => STATE,
            Self::Message(message) => &message.event_type,
            Self::Error(_) => ERROR,
            Self::Close { .. } => CLOSE,
            Self::Timeout => TIMEOUT,
        }
    }

    /// The content frame, if this is one.
    #[must_use]
    pub fn as_message(&self) -> Option<&MessageEvent> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }
}
