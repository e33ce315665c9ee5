//! Transport error types.

use ssekit_core::error::ConfigError;
use thiserror::Error;

/// Errors raised while issuing a request or scheduling a timer.
///
/// Failures *during* a request are not errors at this level: they are
/// reported to the [`ResponseSink`](crate::ResponseSink) as a status.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be built from the configuration.
    #[error("Invalid request: {0}")]
    Config(#[from] ConfigError),

    /// The transport could not be set up or refused the request.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// No async runtime is available to drive the request or timer.
    #[error("No async runtime available: {message}")]
    NoRuntime {
        /// Error message.
        message: String,
    },
}

impl TransportError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}
