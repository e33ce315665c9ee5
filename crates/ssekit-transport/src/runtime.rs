//! Timer abstraction for delayed retries.
//!
//! The state machine schedules at most one retry at a time through a
//! [`Scheduler`] and cancels it through the returned [`ScheduledTask`]. The
//! Tokio implementation spawns a sleeping task; tests use a manual clock.

use std::time::Duration;

/// A callback run once when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a pending timer.
pub trait ScheduledTask: Send {
    /// Prevent the callback from running. Idempotent.
    fn cancel(&mut self);
}

/// Runs callbacks after a delay.
pub trait Scheduler: Send + Sync {
    /// Run `callback` once after `delay`.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> Box<dyn ScheduledTask>;
}

impl<S: Scheduler + ?Sized> Scheduler for std::sync::Arc<S> {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> Box<dyn ScheduledTask> {
        (**self).schedule(delay, callback)
    }
}

#[cfg(feature = "tokio-runtime")]
pub use tokio_impl::TokioScheduler;

#[cfg(feature = "tokio-runtime")]
mod tokio_impl {
    use super::{ScheduledTask, Scheduler, TimerCallback};
    use crate::error::TransportError;
    use std::time::Duration;
    use tokio::runtime::Handle;
    use tokio::task::AbortHandle;

    /// Scheduler backed by a Tokio runtime.
    #[derive(Debug, Clone)]
    pub struct TokioScheduler {
        handle: Handle,
    }

    impl TokioScheduler {
        /// Use the runtime of the calling context.
        pub fn current() -> Result<Self, TransportError> {
            let handle = Handle::try_current().map_err(|e| TransportError::NoRuntime {
                message: e.to_string(),
            })?;
            Ok(Self { handle })
        }

        /// Use an explicit runtime handle.
        #[must_use]
        pub fn new(handle: Handle) -> Self {
            Self { handle }
        }
    }

    struct TokioTimer(AbortHandle);

    impl ScheduledTask for TokioTimer {
        fn cancel(&mut self) {
            self.0.abort();
        }
    }

    impl Scheduler for TokioScheduler {
        fn schedule(&self, delay: Duration, callback: TimerCallback) -> Box<dyn ScheduledTask> {
            let task = self.handle.spawn(async move {
                tokio::time::sleep(delay).await;
                callback();
            });
            Box::new(TokioTimer(task.abort_handle()))
        }
    }
}
