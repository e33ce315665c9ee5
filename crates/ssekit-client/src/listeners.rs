//! Listener registration and event publication.
//!
//! The state machine never calls handlers directly. It hands every event to
//! an [`EventBus`], which routes it to the handlers subscribed under the
//! event's name. [`ListenerRegistry`] is the in-process implementation used
//! by default.
//!
//! Names are matched exactly and case-sensitively. Handlers for one name run
//! in registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ssekit_core::Event;

/// A listener callback.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Token identifying one subscription, used to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw numeric value of the token.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Publish/subscribe capability the client dispatches through.
///
/// Implementations must not hold internal locks while invoking handlers:
/// a handler may subscribe, unsubscribe or close the client re-entrantly.
pub trait EventBus: Send + Sync {
    /// Register `handler` under `name`.
    fn subscribe(&self, name: &str, handler: Handler) -> ListenerId;

    /// Remove the subscription `id` from `name`. Returns whether it existed.
    fn unsubscribe(&self, name: &str, id: ListenerId) -> bool;

    /// Deliver `event` to every handler registered under `name`.
    fn publish(&self, name: &str, event: &Event);

    /// Number of handlers registered under `name`.
    fn listener_count(&self, name: &str) -> usize;

    /// Remove every subscription.
    fn clear(&self);
}

impl<B: EventBus + ?Sized> EventBus for Arc<B> {
    fn subscribe(&self, name: &str, handler: Handler) -> ListenerId {
        (**self).subscribe(name, handler)
    }

    fn unsubscribe(&self, name: &str, id: ListenerId) -> bool {
        (**self).unsubscribe(name, id)
    }

    fn publish(&self, name: &str, event: &Event) {
        (**self).publish(name, event);
    }

    fn listener_count(&self, name: &str) -> usize {
        (**self).listener_count(name)
    }

    fn clear(&self) {
        (**self).clear();
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<String, Vec<(ListenerId, Handler)>>,
}

/// In-process [`EventBus`].
#[derive(Default)]
pub struct ListenerRegistry {
    registry: Mutex<Registry>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        let mut names: Vec<_> = registry
            .handlers
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        names.sort_unstable();
        f.debug_struct("ListenerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl EventBus for ListenerRegistry {
    fn subscribe(&self, name: &str, handler: Handler) -> ListenerId {
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = ListenerId(registry.next_id);
        registry
            .handlers
            .entry(name.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    fn unsubscribe(&self, name: &str, id: ListenerId) -> bool {
        let mut registry = self.lock();
        let Some(handlers) = registry.handlers.get_mut(name) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            registry.handlers.remove(name);
        }
        removed
    }

    fn publish(&self, name: &str, event: &Event) {
        // Snapshot so handlers run without the lock held.
        let handlers: Vec<Handler> = match self.lock().handlers.get(name) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return,
        };
        for handler in handlers {
            handler(event);
        }
    }

    fn listener_count(&self, name: &str) -> usize {
        self.lock().handlers.get(name).map_or(0, Vec::len)
    }

    fn clear(&self) {
        self.lock().handlers.clear();
    }
}
