//! Prelude module for convenient imports.
//!
//! ```rust
//! use ssekit::prelude::*;
//!
//! let policy = RetryPolicyConfig::new().with_max_attempts(Some(5));
//! let config = ClientConfig::new("https://example.com").with_retry(policy);
//! assert_eq!(config.retry.max_attempts, Some(5));
//! ```
//!
//! ## Included Types
//!
//! - Client handle and builder (`EventSource`, `EventSourceBuilder`)
//! - Events and states (`Event`, `MessageEvent`, `ConnectionState`)
//! - Configuration (`ClientConfig`, `RetryPolicyConfig`)
//! - Errors (`ClientError`, `ConfigError`, `StreamError`)
//! - Collaborator traits (`Transport`, `Scheduler`, `EventBus`)

// Core types
pub use ssekit_core::{
    ClientConfig, ConfigError, ConnectionState, Event, MessageEvent, RetryPolicyConfig,
    StreamError,
};

// Client types
pub use ssekit_client::{ClientError, EventBus, EventSource, EventSourceBuilder, ListenerId};

// Transport types
pub use ssekit_transport::{Scheduler, Transport};

#[cfg(feature = "tokio-runtime")]
pub use ssekit_transport::TokioScheduler;

#[cfg(feature = "http")]
pub use ssekit_transport::{HttpTransport, HttpTransportConfig};
