//! # ssekit-core
//!
//! Core types for the ssekit server-sent events client.
//!
//! This crate provides the runtime-agnostic building blocks:
//!
//! - **Stream framing**: [`FrameDecoder`], an incremental parser that consumes
//!   the cumulative response text of one transport attempt and yields complete
//!   frames
//! - **Backoff**: [`FibonacciBackoff`] and [`compute_retry_delay`], a jittered
//!   retry delay whose ceiling grows with the attempt count
//! - **Configuration**: immutable [`ClientConfig`] and [`RetryPolicyConfig`]
//!   values, replaced wholesale on every mutation
//! - **Events**: [`Event`] payloads published to listeners and the
//!   [`ConnectionState`] lifecycle enum
//! - **Errors**: [`StreamError`] for failures surfaced as `"error"` events and
//!   [`ConfigError`] for invalid configuration
//!
//! This crate does not depend on any async runtime.
//!
//! # Example
//!
//! ```rust
//! use ssekit_core::{FrameDecoder, decode_payload};
//!
//! let mut decoder = FrameDecoder::new();
//!
//! // Partial line: nothing is acted on yet.
//! assert!(decoder.decode("event: ping\ndata: {\"n\"").is_empty());
//!
//! // The rest of the frame arrives; the cumulative text is fed again.
//! let frames = decoder.decode("event: ping\ndata: {\"n\":1}\n\n");
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].event_type, "ping");
//! assert_eq!(decode_payload(&frames[0].data), serde_json::json!({"n": 1}));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod backoff;
pub mod config;
pub mod decoder;
pub mod error;
pub mod event;

// Re-export commonly used types at the crate root
pub use backoff::{FibonacciBackoff, compute_retry_delay, growth_ceiling, peer_close_delay};
pub use config::{ClientConfig, RetryPolicyConfig};
pub use decoder::{DEFAULT_EVENT_TYPE, FrameDecoder, RawFrame, decode_payload};
pub use error::{ConfigError, StreamError};
pub use event::{ConnectionState, Event, MessageEvent, RESERVED_EVENT_NAMES};
