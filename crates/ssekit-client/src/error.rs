//! Errors raised while constructing or reconfiguring a client.
//!
//! Failures during streaming are never returned to the caller; they are
//! published as `"error"` events instead.

use ssekit_core::ConfigError;
use ssekit_transport::TransportError;
use thiserror::Error;

/// Error building or reconfiguring an [`EventSource`](crate::EventSource).
#[derive(Error, Debug)]
pub enum ClientError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A default collaborator could not be created.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No transport was supplied and none is available by default.
    #[error("No transport configured: supply one with `transport()` or enable the `http` feature")]
    MissingTransport,

    /// No scheduler was supplied and none is available by default.
    #[error("No scheduler configured: supply one with `scheduler()` or enable the `tokio-runtime` feature")]
    MissingScheduler,
}
