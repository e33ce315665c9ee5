//! Reconnecting server-sent events client.
//!
//! [`EventSource`] keeps one logical stream alive: it issues a streaming
//! request through a [`Transport`](ssekit_transport::Transport), decodes the
//! response into frames, publishes them to listeners, and reconnects after
//! failures using a jittered backoff.
//!
//! # Lifecycle
//!
//! | Call / signal | Effect |
//! |---------------|--------|
//! | `open()` | `CONNECTING`, new request (no-op if connecting or open) |
//! | success status | `OPEN`, `"open"` event, retry counter reset |
//! | response data | one event per complete frame |
//! | server ends stream | `"timeout"` event, reconnect after the server's retry interval |
//! | network failure | `"error"` (first failure of a burst only), retry or close |
//! | server error | `"error"` with status and body, retry if allowed or close |
//! | `close()` | cancel retry, abort request, `CLOSED`, `"close"` event |
//! | `destroy()` | `close()` then drop every listener |
//!
//! Every state change is also published as a `"state"` event.
//!
//! # Example
//!
//! ```no_run
//! use ssekit_client::EventSource;
//! use ssekit_core::Event;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ssekit_client::ClientError> {
//!     // Uses the HTTP transport (feature `http`) and the Tokio scheduler.
//!     let source = EventSource::builder("https://example.com")
//!         .path("/events")
//!         .max_attempts(Some(10))
//!         .build()?;
//!
//!     source.on("message", |event: &Event| {
//!         println!("{event:?}");
//!     });
//!
//!     let handle = source.clone();
//!     source.on("error", move |_: &Event| {
//!         if handle.attempts() > 5 {
//!             handle.close();
//!         }
//!     });
//!
//!     source.open();
//!     tokio::signal::ctrl_c().await.ok();
//!     source.destroy();
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod client;
pub mod error;
pub mod listeners;

mod machine;

// Re-export commonly used types
pub use builder::EventSourceBuilder;
pub use client::EventSource;
pub use error::ClientError;
pub use listeners::{EventBus, Handler, ListenerId, ListenerRegistry};
