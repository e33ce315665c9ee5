//! A scripted transport.
//!
//! [`MockTransport`] records every request it is asked to issue and lets the
//! test drive each attempt by hand: deliver headers, stream body chunks,
//! complete with any status. Nothing happens unless the test says so.
//!
//! The driving methods (`respond`, `send`, `finish`, ...) act on the latest
//! attempt. Use [`MockTransport::attempt`] to drive an older one, for example
//! to check that a callback from a superseded attempt is ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ssekit_transport::{
    ResponseSink, STATUS_NETWORK_ERROR, STATUS_OK, StreamRequest, Transport, TransportError,
    TransportHandle,
};

struct Recorded {
    request: StreamRequest,
    sink: Arc<dyn ResponseSink>,
    aborted: Arc<AtomicBool>,
    body: String,
}

#[derive(Default)]
struct State {
    attempts: Vec<Recorded>,
    refusal: Option<String>,
}

/// Transport double driven by the test.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

struct MockHandle(Arc<AtomicBool>);

impl TransportHandle for MockHandle {
    fn abort(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl MockTransport {
    /// Create a transport with no attempts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every following `issue` fail with `message`.
    pub fn refuse(&self, message: impl Into<String>) {
        self.lock().refusal = Some(message.into());
    }

    /// Accept requests again.
    pub fn accept(&self) {
        self.lock().refusal = None;
    }

    /// Every request issued so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.lock()
            .attempts
            .iter()
            .map(|a| a.request.clone())
            .collect()
    }

    /// Number of requests issued.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().attempts.len()
    }

    /// The latest request.
    #[must_use]
    pub fn last_request(&self) -> Option<StreamRequest> {
        self.lock().attempts.last().map(|a| a.request.clone())
    }

    /// Number of attempts the client aborted.
    #[must_use]
    pub fn abort_count(&self) -> usize {
        self.lock()
            .attempts
            .iter()
            .filter(|a| a.aborted.load(Ordering::SeqCst))
            .count()
    }

    /// Handle to attempt `index` (0-based, in issue order).
    #[must_use]
    pub fn attempt(&self, index: usize) -> MockAttempt {
        MockAttempt {
            transport: self.clone(),
            index,
        }
    }

    fn latest(&self) -> MockAttempt {
        let count = self.request_count();
        assert!(count > 0, "no request has been issued");
        self.attempt(count - 1)
    }

    /// Deliver response headers with `status` on the latest attempt.
    pub fn respond(&self, status: u16) {
        self.latest().respond(status);
    }

    /// Append `chunk` to the latest attempt's body and report progress.
    pub fn send(&self, chunk: &str) {
        self.latest().send(chunk);
    }

    /// End the latest attempt's stream cleanly (status 200).
    pub fn finish(&self) {
        self.latest().finish();
    }

    /// Fail the latest attempt at the network level (status 0).
    pub fn fail(&self) {
        self.latest().fail();
    }

    /// Answer the latest attempt with an error status and body.
    pub fn reject(&self, status: u16, body: &str) {
        self.latest().reject(status, body);
    }
}

impl Transport for MockTransport {
    fn issue(
        &self,
        request: StreamRequest,
        sink: Arc<dyn ResponseSink>,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        let mut state = self.lock();
        if let Some(message) = &state.refusal {
            return Err(TransportError::connection(message.clone()));
        }
        let aborted = Arc::new(AtomicBool::new(false));
        state.attempts.push(Recorded {
            request,
            sink,
            aborted: Arc::clone(&aborted),
            body: String::new(),
        });
        Ok(Box::new(MockHandle(aborted)))
    }
}

/// One recorded attempt of a [`MockTransport`].
///
/// Callbacks are delivered even after the attempt was aborted, which is how
/// tests reproduce late callbacks racing a close.
pub struct MockAttempt {
    transport: MockTransport,
    index: usize,
}

impl MockAttempt {
    fn with<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut state = self.transport.lock();
        let Some(recorded) = state.attempts.get_mut(self.index) else {
            panic!("attempt {} was never issued", self.index);
        };
        f(recorded)
    }

    /// The request of this attempt.
    #[must_use]
    pub fn request(&self) -> StreamRequest {
        self.with(|a| a.request.clone())
    }

    /// Whether the client aborted this attempt.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.with(|a| a.aborted.load(Ordering::SeqCst))
    }

    /// Deliver response headers.
    pub fn respond(&self, status: u16) {
        let sink = self.with(|a| Arc::clone(&a.sink));
        sink.on_headers(status);
    }

    /// Append `chunk` to the body and report the cumulative text.
    pub fn send(&self, chunk: &str) {
        let (sink, body) = self.with(|a| {
            a.body.push_str(chunk);
            (Arc::clone(&a.sink), a.body.clone())
        });
        sink.on_progress(STATUS_OK, &body);
    }

    /// Complete with `status` and the body accumulated so far.
    pub fn complete(&self, status: u16) {
        let (sink, body) = self.with(|a| (Arc::clone(&a.sink), a.body.clone()));
        sink.on_complete(status, &body);
    }

    /// Complete with status 200.
    pub fn finish(&self) {
        self.complete(STATUS_OK);
    }

    /// Complete with status 0.
    pub fn fail(&self) {
        self.complete(STATUS_NETWORK_ERROR);
    }

    /// Deliver `status` headers, then complete with `body`.
    pub fn reject(&self, status: u16, body: &str) {
        let sink = self.with(|a| {
            a.body.push_str(body);
            Arc::clone(&a.sink)
        });
        sink.on_headers(status);
        self.complete(status);
    }
}
