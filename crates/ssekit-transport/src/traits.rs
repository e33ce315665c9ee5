//! The transport seam.

use std::sync::Arc;

use crate::error::TransportError;
use crate::request::StreamRequest;

/// Status reported for a successful stream.
pub const STATUS_OK: u16 = 200;

/// Status reported when the request failed at the network level.
pub const STATUS_NETWORK_ERROR: u16 = 0;

/// Receives the progress of one transport attempt.
///
/// A sink is bound to a single attempt. Calls made after the attempt was
/// aborted or superseded are ignored by the implementation, so transports
/// need not synchronise with `abort`.
pub trait ResponseSink: Send + Sync {
    /// Response headers arrived with `status`.
    fn on_headers(&self, status: u16);

    /// More body arrived. `text` is the whole body received so far.
    fn on_progress(&self, status: u16, text: &str);

    /// The attempt finished. `text` is the whole body received.
    ///
    /// A `status` of [`STATUS_NETWORK_ERROR`] means the connection failed or
    /// was reset, whatever the server said before.
    fn on_complete(&self, status: u16, text: &str);
}

/// Control over one in-flight request.
pub trait TransportHandle: Send {
    /// Stop the request. No further sink calls are required after this.
    fn abort(&mut self);
}

/// Issues streaming requests.
pub trait Transport: Send + Sync {
    /// Start `request`, reporting its progress to `sink`.
    ///
    /// Must not block. Implementations may call `sink` from any thread, but
    /// should not call it before returning.
    fn issue(
        &self,
        request: StreamRequest,
        sink: Arc<dyn ResponseSink>,
    ) -> Result<Box<dyn TransportHandle>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn issue(
        &self,
        request: StreamRequest,
        sink: Arc<dyn ResponseSink>,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        (**self).issue(request, sink)
    }
}
