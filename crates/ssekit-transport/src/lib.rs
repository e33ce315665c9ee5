//! Transport abstractions for ssekit.
//!
//! The connection state machine never performs I/O itself. It talks to two
//! collaborators through the traits in this crate:
//!
//! - a [`Transport`] that issues one streaming request per attempt and reports
//!   status, cumulative response text and completion to a [`ResponseSink`];
//! - a [`Scheduler`] that runs the delayed retry callback.
//!
//! Both hand back handles ([`TransportHandle`], [`ScheduledTask`]) the state
//! machine uses to cancel work when the client closes.
//!
//! # Available Implementations
//!
//! | Type | Role | Feature Flag |
//! |------|------|--------------|
//! | [`runtime::TokioScheduler`] | Retry timer on a Tokio runtime | `tokio-runtime` (default) |
//! | [`http::HttpTransport`] | Streaming `GET` over `reqwest` | `http` |
//!
//! Deterministic doubles for tests live in the `ssekit-testing` crate.
//!
//! # Status Convention
//!
//! Transports report the HTTP status as a `u16`. `200` is success, `0`
//! means the request never completed at the network level, and anything
//! else is a server error whose body is reported on completion.

#![deny(missing_docs)]

pub mod body;
pub mod error;
pub mod request;
pub mod runtime;
pub mod traits;

#[cfg(feature = "http")]
pub mod http;

// Re-export commonly used types
pub use body::Utf8Body;
pub use error::TransportError;
pub use request::{ACCEPT_EVENT_STREAM, LAST_EVENT_ID_HEADER, REQUESTED_WITH_HEADER, StreamRequest};
pub use runtime::{ScheduledTask, Scheduler};
pub use traits::{ResponseSink, STATUS_NETWORK_ERROR, STATUS_OK, Transport, TransportHandle};

#[cfg(feature = "tokio-runtime")]
pub use runtime::TokioScheduler;

#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportConfig};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::TransportError;
    pub use crate::request::StreamRequest;
    pub use crate::runtime::{ScheduledTask, Scheduler};
    pub use crate::traits::{ResponseSink, Transport, TransportHandle};

    #[cfg(feature = "tokio-runtime")]
    pub use crate::runtime::TokioScheduler;

    #[cfg(feature = "http")]
    pub use crate::http::{HttpTransport, HttpTransportConfig};
}
