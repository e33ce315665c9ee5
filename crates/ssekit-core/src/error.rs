//! Error types.
//!
//! [`StreamError`] describes a failed transport attempt and is what listeners
//! receive with an `"error"` event. It is plain data so it can be cloned into
//! every listener invocation. [`ConfigError`] is returned when a request
//! cannot be built from the current configuration.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::decoder::decode_payload;

/// A failed transport attempt, as published to `"error"` listeners.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// The request never reached the server or the connection was reset
    /// (transport status 0).
    #[error("Network error: connection failed or was reset")]
    Network,

    /// The server answered with a status other than 200.
    #[error("Server error: HTTP {status}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body, JSON-decoded when possible.
        body: Value,
    },

    /// The request could not be issued at all.
    #[error("Request error: {message}")]
    Request {
        /// Why the request could not be issued.
        message: String,
    },
}

impl StreamError {
    /// Build a server error, decoding the body as JSON when possible.
    #[must_use]
    pub fn server(status: u16, raw_body: &str) -> Self {
        Self::Server {
            status,
            body: decode_payload(raw_body),
        }
    }

    /// Create a request error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// HTTP status associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network => Some(0),
            Self::Server { status, .. } => Some(*status),
            Self::Request { .. } => None,
        }
    }

    /// Whether this is a network-level failure.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network)
    }
}

/// Invalid client configuration.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    /// The base URL and path do not form a valid URL.
    #[error("Invalid URL '{url}': {source}")]
    #[diagnostic(
        code(ssekit::config::invalid_url),
        help("The url must be absolute, e.g. https://example.com/events")
    )]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// A header name is not a valid HTTP token.
    #[error("Invalid header name '{name}'")]
    #[diagnostic(code(ssekit::config::invalid_header_name))]
    InvalidHeaderName {
        /// The offending name.
        name: String,
    },

    /// A header value contains characters HTTP does not allow.
    #[error("Invalid value for header '{name}'")]
    #[diagnostic(code(ssekit::config::invalid_header_value))]
    InvalidHeaderValue {
        /// Name of the header whose value was rejected.
        name: String,
    },

    /// The minimum retry interval exceeds the maximum.
    #[error("Retry bounds inverted: min {min_ms}ms > max {max_ms}ms")]
    #[diagnostic(
        code(ssekit::config::inverted_bounds),
        help("Set min_interval_ms to a value no larger than max_interval_ms")
    )]
    InvertedBounds {
        /// Configured minimum, in milliseconds.
        min_ms: u64,
        /// Configured maximum, in milliseconds.
        max_ms: u64,
    },
}
