//! Testing utilities for ssekit.
//!
//! Deterministic doubles for the collaborators of the client, so lifecycle
//! behavior can be tested without sockets, runtimes or wall-clock time:
//!
//! - [`MockTransport`]: records requests; the test delivers headers, body
//!   chunks and completion by hand
//! - [`ManualScheduler`]: a virtual clock for retry timers
//! - [`EventRecorder`]: a listener that keeps everything it receives
//! - [`fixtures`]: sample stream bodies and configurations
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ssekit_core::ClientConfig;
//! use ssekit_transport::{ResponseSink, StreamRequest, Transport};
//! use ssekit_testing::{MockTransport, fixtures};
//!
//! struct Ignore;
//! impl ResponseSink for Ignore {
//!     fn on_headers(&self, _: u16) {}
//!     fn on_progress(&self, _: u16, _: &str) {}
//!     fn on_complete(&self, _: u16, _: &str) {}
//! }
//!
//! let transport = MockTransport::new();
//! let request = StreamRequest::build(&fixtures::config(), Some("7")).unwrap();
//! let _handle = transport.issue(request, Arc::new(Ignore)).unwrap();
//!
//! let sent = transport.last_request().unwrap();
//! assert_eq!(sent.header("Last-Event-ID"), Some("7"));
//! transport.respond(200);
//! transport.send(fixtures::HELLO);
//! ```

#![deny(missing_docs)]

pub mod fixtures;
pub mod recorder;
pub mod scheduler;
pub mod transport;

// Re-export commonly used types
pub use recorder::EventRecorder;
pub use scheduler::ManualScheduler;
pub use transport::{MockAttempt, MockTransport};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures;
    pub use crate::recorder::EventRecorder;
    pub use crate::scheduler::ManualScheduler;
    pub use crate::transport::{MockAttempt, MockTransport};
}
