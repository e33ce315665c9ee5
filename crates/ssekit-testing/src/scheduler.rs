//! A virtual clock for retry timers.
//!
//! [`ManualScheduler`] never fires on its own. Time moves only when the test
//! calls [`advance`](ManualScheduler::advance) or
//! [`fire_next`](ManualScheduler::fire_next), and callbacks run on the
//! calling thread, in due order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ssekit_transport::runtime::TimerCallback;
use ssekit_transport::{ScheduledTask, Scheduler};

struct Timer {
    seq: u64,
    due: Duration,
    callback: TimerCallback,
    cancelled: Arc<AtomicBool>,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_seq: u64,
    timers: Vec<Timer>,
    delays: Vec<Duration>,
}

/// Scheduler double with a manually advanced clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<Clock>>,
    cancelled: Arc<AtomicUsize>,
}

struct ManualTask {
    cancelled: Arc<AtomicBool>,
    counter: Arc<AtomicUsize>,
}

impl ScheduledTask for ManualTask {
    fn cancel(&mut self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl ManualScheduler {
    /// Create a scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Virtual time elapsed.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Timers scheduled and neither fired nor cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock()
            .timers
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Every delay ever requested, in order.
    #[must_use]
    pub fn scheduled_delays(&self) -> Vec<Duration> {
        self.lock().delays.clone()
    }

    /// Number of timers ever scheduled.
    #[must_use]
    pub fn scheduled_count(&self) -> usize {
        self.lock().delays.len()
    }

    /// Number of timers cancelled before firing.
    #[must_use]
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Time until the next live timer is due.
    #[must_use]
    pub fn next_due_in(&self) -> Option<Duration> {
        let clock = self.lock();
        clock
            .timers
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .map(|t| t.due.saturating_sub(clock.now))
            .min()
    }

    /// Remove and return the earliest live timer due at or before `limit`.
    fn take_due(&self, limit: Option<Duration>) -> Option<TimerCallback> {
        let mut clock = self.lock();
        clock.timers.retain(|t| !t.cancelled.load(Ordering::SeqCst));
        let index = clock
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| limit.is_none_or(|limit| t.due <= limit))
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        let timer = clock.timers.remove(index);
        clock.now = clock.now.max(timer.due);
        Some(timer.callback)
    }

    /// Move the clock forward by `by`, firing every timer that falls due,
    /// including timers scheduled by the callbacks themselves. Returns how
    /// many fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let mut fired = 0;
        while let Some(callback) = self.take_due(Some(target)) {
            callback();
            fired += 1;
        }
        let mut clock = self.lock();
        clock.now = clock.now.max(target);
        fired
    }

    /// Jump to the earliest live timer and fire it. Returns whether one
    /// fired.
    pub fn fire_next(&self) -> bool {
        match self.take_due(None) {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> Box<dyn ScheduledTask> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut clock = self.lock();
        clock.next_seq += 1;
        let timer = Timer {
            seq: clock.next_seq,
            due: clock.now.saturating_add(delay),
            callback,
            cancelled: Arc::clone(&cancelled),
        };
        clock.timers.push(timer);
        clock.delays.push(delay);
        Box::new(ManualTask {
            cancelled,
            counter: Arc::clone(&self.cancelled),
        })
    }
}
