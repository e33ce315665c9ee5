//! Sample stream bodies and configurations.

use std::time::Duration;

use ssekit_core::{ClientConfig, RetryPolicyConfig};

/// Base URL used by the fixtures.
pub const BASE_URL: &str = "https://stream.example.com";

/// One default-typed frame carrying `hello`.
pub const HELLO: &str = "data: hello\n\n";

/// A `ping` frame with a JSON payload.
pub const PING_JSON: &str = "event: ping\ndata: {\"n\":1}\n\n";

/// Two frames with ids, the second announcing a reconnect interval.
pub const WITH_IDS: &str = "id: 1\ndata: first\n\nid: 2\nretry: 2500\ndata: second\n\n";

/// A multi-line payload, a comment and an unknown field.
pub const MULTILINE: &str = ": keep-alive\nfoo: bar\ndata: line one\ndata: line two\n\n";

/// A frame whose event type collides with a lifecycle event name.
pub const RESERVED_NAME: &str = "event: error\ndata: not really an error\n\n";

/// Retry policy with small, round numbers for assertions on delays.
#[must_use]
pub fn fast_retry() -> RetryPolicyConfig {
    RetryPolicyConfig::new()
        .with_base_interval(Duration::from_millis(50))
        .with_min_interval(Duration::from_millis(100))
        .with_max_interval(Duration::from_millis(1_000))
}

/// Configuration for [`BASE_URL`] at `/events`.
#[must_use]
pub fn config() -> ClientConfig {
    ClientConfig::new(BASE_URL).with_path("/events")
}

/// JSON body a server might send with a 503.
#[must_use]
pub fn unavailable_body() -> String {
    serde_json::json!({ "error": "unavailable", "retry_after": 5 }).to_string()
}
