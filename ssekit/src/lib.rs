//! # ssekit - reconnecting server-sent events for Rust
//!
//! A client for `text/event-stream` endpoints that keeps one logical stream
//! alive across network failures, server errors and server-initiated closes.
//!
//! ## Features
//!
//! - **Incremental decoding** of the event stream wire format, tolerant of
//!   frames split at any byte
//! - **Jittered Fibonacci backoff** with a configurable attempt ceiling
//! - **Resumption** through `Last-Event-ID`
//! - **Pluggable collaborators**: transport, retry timer and listener bus are
//!   traits, with deterministic doubles in `ssekit-testing`
//! - **Runtime-agnostic core**, Tokio and `reqwest` behind feature flags
//!
//! ## Quick Start
//!
//! ```no_run
//! use ssekit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ClientError> {
//!     let source = EventSource::builder("https://example.com")
//!         .path("/events")
//!         .header("Authorization", "Bearer token")
//!         .build()?;
//!
//!     source.on("message", |event: &Event| {
//!         if let Some(message) = event.as_message() {
//!             println!("{}: {}", message.event_type, message.data);
//!         }
//!     });
//!     source.on("state", |event: &Event| println!("{event:?}"));
//!
//!     source.open();
//!     tokio::signal::ctrl_c().await.ok();
//!     source.destroy();
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`ssekit_core`] - decoder, backoff, configuration and event types (no
//!   async runtime)
//! - [`ssekit_transport`] - transport and timer seams, Tokio scheduler, HTTP
//!   transport
//! - [`ssekit_client`] - connection state machine and the [`EventSource`]
//!   handle

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

// Re-export all public items from core
pub use ssekit_core::*;

// Re-export client types
pub use ssekit_client::{
    ClientError, EventBus, EventSource, EventSourceBuilder, Handler, ListenerId, ListenerRegistry,
};

// Re-export transport types
pub use ssekit_transport::{ResponseSink, ScheduledTask, Scheduler, StreamRequest, Transport};

pub mod prelude;

/// Transport module re-exports
pub mod transport {
    //! Transport layer types.
    pub use ssekit_transport::*;
}

/// Client module re-exports
pub mod client {
    //! Client implementation types.
    pub use ssekit_client::*;
}
