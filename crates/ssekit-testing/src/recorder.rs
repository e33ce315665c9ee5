//! A listener that records what it sees.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ssekit_core::{ConnectionState, Event, MessageEvent, StreamError};

/// Collects every event delivered to its handlers, in delivery order.
///
/// ```rust
/// use ssekit_core::Event;
/// use ssekit_testing::EventRecorder;
///
/// let recorder = EventRecorder::new();
/// let handler = recorder.handler();
/// handler(&Event::Open);
/// assert_eq!(recorder.names(), vec!["open"]);
/// ```
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A handler that appends to this recorder. Register it under as many
    /// names as needed.
    #[must_use]
    pub fn handler(&self) -> impl Fn(&Event) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event: &Event| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        }
    }

    /// Everything recorded.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Names of everything recorded.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.name().to_string()).collect()
    }

    /// Every `"state"` payload, in order.
    #[must_use]
    pub fn states(&self) -> Vec<ConnectionState> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Event::State(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    /// Every content frame, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<MessageEvent> {
        self.lock()
            .iter()
            .filter_map(Event::as_message)
            .cloned()
            .collect()
    }

    /// Every error, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<StreamError> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Event::Error(error) => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    /// The `after_error` flag of every close, in order.
    #[must_use]
    pub fn closes(&self) -> Vec<bool> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Event::Close { after_error } => Some(*after_error),
                _ => None,
            })
            .collect()
    }

    /// How many recorded events are named `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.lock().iter().filter(|e| e.name() == name).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
