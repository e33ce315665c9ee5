//! The public client handle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ssekit_core::{ClientConfig, ConnectionState, Event, RetryPolicyConfig};

use crate::builder::EventSourceBuilder;
use crate::error::ClientError;
use crate::listeners::{Handler, ListenerId};
use crate::machine::Machine;

/// A reconnecting server-sent events client.
///
/// `EventSource` is a cheap, cloneable handle: every clone drives the same
/// connection and shares the same listeners. Handlers receive `&Event` and
/// may hold a clone to call [`close`](Self::close) from inside a handler.
///
/// Listeners survive [`close`](Self::close) and a later [`open`](Self::open);
/// only [`destroy`](Self::destroy) removes them.
///
/// # Example
///
/// ```rust
/// use ssekit_client::EventSource;
/// use ssekit_core::Event;
/// use ssekit_testing::{ManualScheduler, MockTransport};
///
/// # fn main() -> Result<(), ssekit_client::ClientError> {
/// let transport = MockTransport::new();
/// let source = EventSource::builder("https://example.com")
///     .path("/events")
///     .transport(transport.clone())
///     .scheduler(ManualScheduler::new())
///     .build()?;
///
/// source.on("message", |event: &Event| {
///     if let Some(message) = event.as_message() {
///         println!("got {}", message.raw_data);
///     }
/// });
///
/// source.open();
/// transport.respond(200);
/// transport.send("data: hello\n\n");
/// source.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EventSource {
    machine: Arc<Machine>,
}

impl EventSource {
    /// Start building a client for `url`.
    #[must_use]
    pub fn builder(url: impl Into<String>) -> EventSourceBuilder {
        EventSourceBuilder::new(url)
    }

    pub(crate) fn from_machine(machine: Machine) -> Self {
        Self {
            machine: Arc::new(machine),
        }
    }

    /// Connect, unless already connecting or open.
    pub fn open(&self) {
        self.machine.open();
    }

    /// Cancel any pending retry, abort the in-flight request and move to
    /// `CLOSED`. Does nothing unless connecting or open.
    ///
    /// If another thread is publishing events at the time, that thread
    /// delivers the `"close"` event, after any event already handed to a
    /// listener. Nothing from the closed connection follows it.
    pub fn close(&self) {
        self.machine.close();
    }

    /// Close, then remove every listener.
    pub fn destroy(&self) {
        self.machine.close();
        self.machine.bus().clear();
    }

    /// Register `handler` for events named `name`.
    ///
    /// Lifecycle events use the names `"open"`, `"error"`, `"close"`,
    /// `"state"` and `"timeout"`. Content frames use their event type,
    /// `"message"` by default.
    pub fn on<F>(&self, name: &str, handler: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.machine.bus().subscribe(name, handler)
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        self.machine.bus().unsubscribe(name, id)
    }

    /// Number of handlers registered for `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.machine.bus().listener_count(name)
    }

    /// Merge headers into the configuration.
    ///
    /// Like every setter here, this takes effect on the next attempt. The
    /// request already in flight is unaffected.
    pub fn set_headers<K, V>(&self, headers: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.machine
            .update_config(|config| config.clone().with_headers(headers));
    }

    /// Merge query parameters into the configuration.
    pub fn set_params<K, V>(&self, params: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.machine
            .update_config(|config| config.clone().with_params(params));
    }

    /// Replace the base URL.
    pub fn set_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.machine
            .update_config(|config| config.clone().with_url(url));
    }

    /// Replace the path appended to the base URL.
    pub fn set_path(&self, path: impl Into<String>) {
        let path = path.into();
        self.machine
            .update_config(|config| config.clone().with_path(path));
    }

    /// Replace the retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the current policy in place, if the
    /// minimum interval exceeds the maximum.
    pub fn set_retry_policy(&self, policy: RetryPolicyConfig) -> Result<(), ClientError> {
        policy.validate()?;
        self.machine
            .update_config(|config| config.clone().with_retry(policy));
        Ok(())
    }

    /// Current state, or `None` before the first [`open`](Self::open).
    #[must_use]
    pub fn state(&self) -> Option<ConnectionState> {
        self.machine.state()
    }

    /// Retries scheduled since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.machine.attempts()
    }

    /// Bytes of the current response already consumed by the decoder.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.machine.cursor()
    }

    /// Resumption token sent as `Last-Event-ID` on the next attempt.
    #[must_use]
    pub fn last_event_id(&self) -> Option<String> {
        self.machine.last_event_id()
    }

    /// Reconnect interval announced by the server, if any.
    #[must_use]
    pub fn reconnect_interval(&self) -> Option<Duration> {
        self.machine.reconnect_interval()
    }

    /// Snapshot of the configuration the next attempt will use.
    #[must_use]
    pub fn config(&self) -> Arc<ClientConfig> {
        self.machine.config()
    }
}

impl fmt::Debug for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.machine.config();
        f.debug_struct("EventSource")
            .field("url", &config.url)
            .field("path", &config.path)
            .field("state", &self.machine.state())
            .field("attempts", &self.machine.attempts())
            .finish_non_exhaustive()
    }
}
