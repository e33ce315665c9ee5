//! Incremental decoder for the `text/event-stream` framing.
//!
//! The transport hands over the *cumulative* response text of the current
//! attempt every time more data arrives. [`FrameDecoder`] remembers how many
//! bytes it has already consumed (the cursor) and only looks at the suffix.
//! A line is acted on once its terminator has been seen; an unterminated tail
//! stays unconsumed and is picked up again by the next call.
//!
//! Recognised fields:
//!
//! | Line | Effect |
//! |------|--------|
//! | `event: <name>` | event type of the frame in progress |
//! | `data: <text>` | appends a data line |
//! | `id: <value>` | sets the last event id |
//! | `id` | clears the last event id |
//! | `retry: <ms>` | sets the reconnect interval |
//! | *(blank)* | dispatches the frame if it has data |
//!
//! Anything else, including `:` comments, is ignored.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace, warn};

/// Event type used when a frame carries no `event` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// One complete frame decoded from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Event type (`"message"` unless overridden).
    pub event_type: String,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Last event id at the time the frame was dispatched.
    pub last_event_id: Option<String>,
}

/// Incremental frame decoder for one client.
///
/// The cursor and the pending frame belong to the current transport attempt
/// and are reset by [`begin_attempt`](Self::begin_attempt). The last event id
/// and the reconnect interval outlive attempts.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    cursor: usize,
    data_lines: Vec<String>,
    event_type: Option<String>,
    last_event_id: Option<String>,
    reconnect_interval: Option<Duration>,
}

impl FrameDecoder {
    /// Create a decoder with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder that resumes from a known event id.
    #[must_use]
    pub fn with_last_event_id(id: impl Into<String>) -> Self {
        Self {
            last_event_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Bytes of the current response already consumed.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The last event id seen on the stream, if any.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnect interval announced by the server via `retry:`.
    #[must_use]
    pub fn reconnect_interval(&self) -> Option<Duration> {
        self.reconnect_interval
    }

    /// Whether a frame is partially accumulated.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.data_lines.is_empty() || self.event_type.is_some()
    }

    /// Prepare for a fresh response body.
    pub fn begin_attempt(&mut self) {
        self.cursor = 0;
        self.clear_pending();
    }

    /// Drop any partially accumulated frame.
    pub fn end_attempt(&mut self) {
        self.clear_pending();
    }

    /// Consume newly arrived text and return every frame it completes.
    ///
    /// `text` is the full response body received so far in this attempt.
    pub fn decode(&mut self, text: &str) -> Vec<RawFrame> {
        let mut frames = Vec::new();

        let mut rest = match text.get(self.cursor..) {
            Some(rest) => rest,
            None => {
                warn!(
                    cursor = self.cursor,
                    len = text.len(),
                    "response text does not extend consumed prefix, restarting decoder"
                );
                self.begin_attempt();
                text
            }
        };

        while let Some((line_end, next)) = find_eol(rest.as_bytes()) {
            self.process_line(&rest[..line_end], &mut frames);
            self.cursor += next;
            rest = &rest[next..];
        }

        frames
    }

    fn process_line(&mut self, line: &str, frames: &mut Vec<RawFrame>) {
        // `str::trim` covers U+00A0 along with ASCII whitespace.
        let line = line.trim();

        if line.is_empty() {
            self.dispatch(frames);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field.trim_end(), Some(value.trim_start())),
            None => (line, None),
        };

        match field {
            "event" => {
                self.event_type = value.filter(|v| !v.is_empty()).map(str::to_owned);
            }
            "data" => self.data_lines.push(value.unwrap_or_default().to_owned()),
            "id" => self.last_event_id = value.map(str::to_owned),
            "retry" => match value.and_then(|v| v.parse::<u64>().ok()) {
                Some(ms) => self.reconnect_interval = Some(Duration::from_millis(ms)),
                None => debug!(value, "ignoring malformed retry field"),
            },
            other => trace!(field = other, "ignoring unknown field"),
        }
    }

    fn dispatch(&mut self, frames: &mut Vec<RawFrame>) {
        let event_type = self.event_type.take();
        if self.data_lines.is_empty() {
            return;
        }

        let data = self.data_lines.join("\n");
        self.data_lines.clear();

        frames.push(RawFrame {
            event_type: event_type.unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            data,
            last_event_id: self.last_event_id.clone(),
        });
    }

    fn clear_pending(&mut self) {
        self.data_lines.clear();
        self.event_type = None;
    }
}

/// Finds the next end-of-line in `bytes`.
///
/// Returns `(line_end, remainder_start)`, or `None` when more data is
/// needed. A trailing lone CR may be the first half of a CRLF pair.
fn find_eol(bytes: &[u8]) -> Option<(usize, usize)> {
    let pos = bytes.iter().position(|&b| b == b'\n' || b == b'\r')?;

    if bytes[pos] == b'\n' {
        return Some((pos, pos + 1));
    }
    match bytes.get(pos + 1) {
        None => None,
        Some(b'\n') => Some((pos, pos + 2)),
        Some(_) => Some((pos, pos + 1)),
    }
}

/// Best-effort structured decoding of a data payload.
///
/// Returns the parsed JSON value, or the raw text as a JSON string when it
/// is not valid JSON.
#[must_use]
pub fn decode_payload(raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            trace!(error = %e, "payload is not JSON, keeping raw text");
            Value::String(raw.to_owned())
        }
    }
}
