//! The connection state machine.
//!
//! ```text
//!            open()
//!   (none) ─────────► CONNECTING ──── headers/progress 200 ───► OPEN
//!   CLOSED ─────────►     ▲  │                                    │
//!                         │  │ failure, retry allowed             │ complete 200 (peer close)
//!                         │  ▼                                    │ or failure, retry allowed
//!                    retry timer ◄────────────────────────────────┘
//!
//!   close() from anywhere ──► CLOSED
//!   failure, retry not allowed ──► CLOSED (after error)
//! ```
//!
//! All mutable state lives in one [`Inner`] behind a mutex. Every entry point
//! (public call, transport callback, timer callback) locks, updates the
//! bookkeeping and collects the resulting events and side effects into
//! [`Effects`]. Before the lock is released the collected events join an
//! ordered outbox. Side effects run and listeners are invoked without the
//! lock held, so handlers may call back into the client freely.
//!
//! One caller at a time drains the outbox. A call made from a handler, or
//! from another thread while a drain is in progress, only queues its events
//! and leaves publication to the current drainer. Events queued under an
//! epoch that a close has since ended are dropped, so nothing from a closed
//! connection reaches listeners after its `"close"`.
//!
//! Transport callbacks carry the id of the attempt they belong to and timer
//! callbacks carry the generation of the retry they were scheduled for.
//! Anything that no longer matches is ignored.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use rand::rngs::StdRng;
use ssekit_core::backoff::peer_close_delay;
use ssekit_core::{ClientConfig, ConnectionState, Event, FrameDecoder, MessageEvent, StreamError};
use ssekit_transport::{
    ResponseSink, STATUS_NETWORK_ERROR, STATUS_OK, ScheduledTask, Scheduler, StreamRequest,
    Transport, TransportHandle,
};
use tracing::{debug, info, warn};

use crate::listeners::EventBus;

/// Everything the state machine owns.
struct Inner {
    state: Option<ConnectionState>,
    config: Arc<ClientConfig>,
    attempts: u32,
    decoder: FrameDecoder,
    errored: bool,
    rng: StdRng,

    transport: Option<Box<dyn TransportHandle>>,
    attempt_id: u64,
    in_flight: bool,

    retry: Option<Box<dyn ScheduledTask>>,
    retry_generation: u64,
    retry_scheduled: bool,

    /// Bumped on every close. Events collected under an older epoch are
    /// dropped instead of published.
    epoch: u64,
    /// Events awaiting publication, tagged with their epoch.
    outbox: VecDeque<(u64, Event)>,
    draining: bool,
}

/// Work to do once the lock is released.
#[must_use]
struct Effects {
    epoch: u64,
    events: Vec<Event>,
    abort: Option<Box<dyn TransportHandle>>,
    cancel: Option<Box<dyn ScheduledTask>>,
    schedule: Option<(u64, Duration)>,
}

impl Effects {
    fn new(epoch: u64) -> Self {
        Self {
            epoch,
            events: Vec::new(),
            abort: None,
            cancel: None,
            schedule: None,
        }
    }
}

/// A prepared transport attempt.
struct Attempt {
    id: u64,
    request: StreamRequest,
}

impl Inner {
    fn is_current(&self, attempt_id: u64) -> bool {
        self.in_flight && self.attempt_id == attempt_id
    }

    fn is_active(&self) -> bool {
        self.state.is_some_and(ConnectionState::is_active)
    }

    /// Move the collected events into the outbox. Called before the lock
    /// that collected them is released, so the outbox follows state order.
    fn commit(&mut self, mut effects: Effects) -> Effects {
        let epoch = effects.epoch;
        self.outbox
            .extend(effects.events.drain(..).map(|event| (epoch, event)));
        effects
    }

    fn transition(&mut self, state: ConnectionState, effects: &mut Effects) {
        if self.state != Some(state) {
            debug!(from = ?self.state, to = %state, "state transition");
            self.state = Some(state);
            effects.events.push(Event::State(state));
        }
    }

    /// CONNECTING to OPEN on the first success signal of an attempt.
    fn promote(&mut self, effects: &mut Effects) {
        if self.state == Some(ConnectionState::Connecting) {
            info!(url = %self.config.url, "event stream open");
            self.attempts = 0;
            self.transition(ConnectionState::Open, effects);
            effects.events.push(Event::Open);
        }
    }

    /// Start a fresh attempt against the current configuration snapshot.
    ///
    /// An unusable configuration publishes a request error and closes.
    fn prepare_attempt(&mut self, effects: &mut Effects) -> Option<Attempt> {
        self.attempt_id += 1;
        self.in_flight = true;
        self.decoder.begin_attempt();

        let config = Arc::clone(&self.config);
        match StreamRequest::build(&config, self.decoder.last_event_id()) {
            Ok(request) => {
                debug!(attempt = self.attempt_id, url = %request.url, "prepared attempt");
                Some(Attempt {
                    id: self.attempt_id,
                    request,
                })
            }
            Err(e) => {
                warn!(error = %e, "cannot build stream request");
                self.fail_request(e.to_string(), effects);
                None
            }
        }
    }

    fn fail_request(&mut self, message: String, effects: &mut Effects) {
        effects.events.push(Event::Error(StreamError::request(message)));
        self.errored = true;
        self.close(effects);
    }

    fn schedule_retry(&mut self, delay: Duration, effects: &mut Effects) {
        self.retry_generation += 1;
        self.retry_scheduled = true;
        effects.schedule = Some((self.retry_generation, delay));

        // Always observable, even when already CONNECTING.
        if self.state == Some(ConnectionState::Connecting) {
            effects
                .events
                .push(Event::State(ConnectionState::Connecting));
        } else {
            self.transition(ConnectionState::Connecting, effects);
        }
    }

    /// Retry after a failure, or close if the policy forbids it.
    fn retry_or_close(&mut self, allowed: bool, effects: &mut Effects) {
        let config = Arc::clone(&self.config);
        if allowed && !config.retry.ceiling_reached(self.attempts) {
            self.attempts += 1;
            let delay = config
                .retry
                .backoff()
                .delay_for_attempt(self.attempts, &mut self.rng);
            warn!(
                attempt = self.attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "scheduling retry"
            );
            self.schedule_retry(delay, effects);
        } else {
            warn!(attempts = self.attempts, "giving up on event stream");
            self.errored = true;
            self.close(effects);
        }
    }

    fn close(&mut self, effects: &mut Effects) {
        if let Some(task) = self.retry.take() {
            effects.cancel = Some(task);
        }
        self.retry_generation += 1;
        self.retry_scheduled = false;
        effects.schedule = None;

        if let Some(handle) = self.transport.take() {
            effects.abort = Some(handle);
        }
        self.attempt_id += 1;
        self.in_flight = false;

        self.decoder.end_attempt();
        self.attempts = 0;
        info!(after_error = self.errored, "event stream closed");
        self.transition(ConnectionState::Closed, effects);
        effects.events.push(Event::Close {
            after_error: self.errored,
        });

        self.epoch += 1;
        effects.epoch = self.epoch;
    }

    fn decode(&mut self, text: &str, effects: &mut Effects) {
        for frame in self.decoder.decode(text) {
            debug!(event_type = %frame.event_type, bytes = frame.data.len(), "frame");
            effects
                .events
                .push(Event::Message(MessageEvent::from(frame)));
        }
    }
}

/// Shared core behind every [`EventSource`](crate::EventSource) handle.
pub(crate) struct Machine {
    inner: Mutex<Inner>,
    transport: Arc<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    bus: Arc<dyn EventBus>,
}

impl Machine {
    pub(crate) fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
        bus: Arc<dyn EventBus>,
        rng: StdRng,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: None,
                config: Arc::new(config),
                attempts: 0,
                decoder: FrameDecoder::new(),
                errored: false,
                rng,
                transport: None,
                attempt_id: 0,
                in_flight: false,
                retry: None,
                retry_generation: 0,
                retry_scheduled: false,
                epoch: 0,
                outbox: VecDeque::new(),
                draining: false,
            }),
            transport,
            scheduler,
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn bus(&self) -> &Arc<dyn EventBus> {
        &self.bus
    }

    pub(crate) fn state(&self) -> Option<ConnectionState> {
        self.lock().state
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.lock().attempts
    }

    pub(crate) fn cursor(&self) -> usize {
        self.lock().decoder.cursor()
    }

    pub(crate) fn last_event_id(&self) -> Option<String> {
        self.lock().decoder.last_event_id().map(str::to_owned)
    }

    pub(crate) fn reconnect_interval(&self) -> Option<Duration> {
        self.lock().decoder.reconnect_interval()
    }

    pub(crate) fn config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.lock().config)
    }

    /// Replace the configuration. Read again on the next attempt only.
    pub(crate) fn update_config(&self, update: impl FnOnce(&ClientConfig) -> ClientConfig) {
        let mut inner = self.lock();
        let next = update(&inner.config);
        inner.config = Arc::new(next);
    }

    pub(crate) fn open(self: &Arc<Self>) {
        let (effects, attempt) = {
            let mut inner = self.lock();
            if inner.is_active() {
                debug!(state = ?inner.state, "open ignored: already active");
                return;
            }
            info!(url = %inner.config.url, path = %inner.config.path, "opening event stream");
            let mut effects = Effects::new(inner.epoch);
            inner.errored = false;
            inner.attempts = 0;
            inner.transition(ConnectionState::Connecting, &mut effects);
            let attempt = inner.prepare_attempt(&mut effects);
            (inner.commit(effects), attempt)
        };
        self.apply(effects);
        if let Some(attempt) = attempt {
            self.launch(attempt);
        }
    }

    pub(crate) fn close(self: &Arc<Self>) {
        let effects = {
            let mut inner = self.lock();
            if !inner.is_active() {
                debug!(state = ?inner.state, "close ignored: not active");
                return;
            }
            let mut effects = Effects::new(inner.epoch);
            inner.close(&mut effects);
            inner.commit(effects)
        };
        self.apply(effects);
    }

    /// Issue `attempt` unless it was superseded while events were published.
    fn launch(self: &Arc<Self>, attempt: Attempt) {
        if !self.lock().is_current(attempt.id) {
            debug!(attempt = attempt.id, "attempt superseded before issue");
            return;
        }

        let sink = Arc::new(AttemptSink {
            machine: Arc::downgrade(self),
            attempt: attempt.id,
        });
        match self.transport.issue(attempt.request, sink) {
            Ok(mut handle) => {
                let mut inner = self.lock();
                if inner.is_current(attempt.id) {
                    inner.transport = Some(handle);
                } else {
                    drop(inner);
                    handle.abort();
                }
            }
            Err(e) => {
                warn!(attempt = attempt.id, error = %e, "transport refused request");
                let effects = {
                    let mut inner = self.lock();
                    if !inner.is_current(attempt.id) {
                        return;
                    }
                    let mut effects = Effects::new(inner.epoch);
                    inner.fail_request(e.to_string(), &mut effects);
                    inner.commit(effects)
                };
                self.apply(effects);
            }
        }
    }

    /// Run side effects, then publish queued events, all without the lock
    /// held.
    fn apply(self: &Arc<Self>, effects: Effects) {
        let Effects {
            abort,
            cancel,
            schedule,
            ..
        } = effects;

        if let Some(mut task) = cancel {
            task.cancel();
        }
        if let Some(mut handle) = abort {
            handle.abort();
        }
        if let Some((generation, delay)) = schedule {
            self.arm_retry(generation, delay);
        }

        self.drain();
    }

    /// Publish the outbox in order unless another caller already is.
    fn drain(&self) {
        {
            let mut inner = self.lock();
            if inner.draining {
                return;
            }
            inner.draining = true;
        }

        let _guard = DrainGuard(self);
        while let Some(event) = self.next_event() {
            self.bus.publish(event.name(), &event);
        }
    }

    /// Pop the next event of the current epoch. Gives up the drain role, under
    /// the same lock, once the outbox is empty.
    fn next_event(&self) -> Option<Event> {
        let mut inner = self.lock();
        while let Some((epoch, event)) = inner.outbox.pop_front() {
            if epoch == inner.epoch {
                return Some(event);
            }
            debug!(event = event.name(), "dropping event superseded by close");
        }
        inner.draining = false;
        None
    }

    fn arm_retry(self: &Arc<Self>, generation: u64, delay: Duration) {
        let machine = Arc::downgrade(self);
        let mut task = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(machine) = machine.upgrade() {
                    machine.fire_retry(generation);
                }
            }),
        );

        let mut inner = self.lock();
        if inner.retry_scheduled && inner.retry_generation == generation {
            inner.retry = Some(task);
        } else {
            drop(inner);
            task.cancel();
        }
    }

    fn fire_retry(self: &Arc<Self>, generation: u64) {
        let (effects, attempt) = {
            let mut inner = self.lock();
            if !inner.retry_scheduled || inner.retry_generation != generation {
                debug!(generation, "stale retry timer ignored");
                return;
            }
            inner.retry_scheduled = false;
            inner.retry = None;
            if !inner.is_active() {
                return;
            }
            debug!(attempt = inner.attempts, "retry timer fired");
            let mut effects = Effects::new(inner.epoch);
            inner.transition(ConnectionState::Connecting, &mut effects);
            let attempt = inner.prepare_attempt(&mut effects);
            (inner.commit(effects), attempt)
        };
        self.apply(effects);
        if let Some(attempt) = attempt {
            self.launch(attempt);
        }
    }

    fn on_headers(self: &Arc<Self>, attempt: u64, status: u16) {
        let effects = {
            let mut inner = self.lock();
            if !inner.is_current(attempt) {
                debug!(attempt, "stale headers ignored");
                return;
            }
            let mut effects = Effects::new(inner.epoch);
            if status == STATUS_OK {
                inner.promote(&mut effects);
            } else {
                debug!(attempt, status, "non-success status, awaiting body");
            }
            inner.commit(effects)
        };
        self.apply(effects);
    }

    fn on_progress(self: &Arc<Self>, attempt: u64, status: u16, text: &str) {
        let effects = {
            let mut inner = self.lock();
            if !inner.is_current(attempt) {
                debug!(attempt, "stale progress ignored");
                return;
            }
            if status != STATUS_OK {
                return;
            }
            let mut effects = Effects::new(inner.epoch);
            inner.promote(&mut effects);
            inner.decode(text, &mut effects);
            inner.commit(effects)
        };
        self.apply(effects);
    }

    fn on_complete(self: &Arc<Self>, attempt: u64, status: u16, text: &str) {
        let effects = {
            let mut inner = self.lock();
            if !inner.is_current(attempt) {
                debug!(attempt, "stale completion ignored");
                return;
            }
            inner.in_flight = false;
            inner.transport = None;
            let mut effects = Effects::new(inner.epoch);

            match status {
                STATUS_OK => {
                    inner.promote(&mut effects);
                    inner.decode(text, &mut effects);
                    inner.decoder.end_attempt();
                    effects.events.push(Event::Timeout);

                    let config = Arc::clone(&inner.config);
                    let interval = inner
                        .decoder
                        .reconnect_interval()
                        .unwrap_or_else(|| config.retry.base_interval());
                    let delay = peer_close_delay(interval, config.retry.min_interval(), &mut inner.rng);
                    info!(
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "server ended stream, reconnecting"
                    );
                    inner.schedule_retry(delay, &mut effects);
                }
                STATUS_NETWORK_ERROR => {
                    inner.decoder.end_attempt();
                    warn!(attempt = inner.attempts, "network failure");
                    if inner.attempts == 0 {
                        effects.events.push(Event::Error(StreamError::Network));
                    }
                    let allowed = inner.config.retry.retry_on_network_error;
                    inner.retry_or_close(allowed, &mut effects);
                }
                status => {
                    inner.decoder.end_attempt();
                    warn!(attempt = inner.attempts, status, "server error");
                    effects
                        .events
                        .push(Event::Error(StreamError::server(status, text)));
                    let allowed = inner.config.retry.retries_status(status);
                    inner.retry_or_close(allowed, &mut effects);
                }
            }
            inner.commit(effects)
        };
        self.apply(effects);
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut task) = inner.retry.take() {
            task.cancel();
        }
        if let Some(mut handle) = inner.transport.take() {
            handle.abort();
        }
    }
}

/// Hands the drain role back if a handler panics mid-publication.
struct DrainGuard<'a>(&'a Machine);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}

/// Routes transport callbacks for one attempt back to the machine.
struct AttemptSink {
    machine: Weak<Machine>,
    attempt: u64,
}

impl ResponseSink for AttemptSink {
    fn on_headers(&self, status: u16) {
        if let Some(machine) = self.machine.upgrade() {
            machine.on_headers(self.attempt, status);
        }
    }

    fn on_progress(&self, status: u16, text: &str) {
        if let Some(machine) = self.machine.upgrade() {
            machine.on_progress(self.attempt, status, text);
        }
    }

    fn on_complete(&self, status: u16, text: &str) {
        if let Some(machine) = self.machine.upgrade() {
            machine.on_complete(self.attempt, status, text);
        }
    }
}
