//! Client configuration values.
//!
//! Configuration is immutable: every mutation produces a new value, and the
//! client swaps it in wholesale. A transport attempt reads the configuration
//! once when it starts, so a mutation never reaches a request already sent.
//!
//! Both types deserialize from JSON (or any serde format) with defaults for
//! missing fields. A negative `max_attempts` means "unlimited".
//!
//! ```rust
//! use ssekit_core::ClientConfig;
//!
//! let config: ClientConfig = serde_json::from_str(r#"{
//!     "url": "https://example.com",
//!     "path": "/events",
//!     "params": { "topic": "orders" },
//!     "retry": { "max_attempts": -1, "retry_on_server_error": true }
//! }"#).unwrap();
//!
//! assert_eq!(config.retry.max_attempts, None);
//! assert_eq!(
//!     config.request_url().unwrap().as_str(),
//!     "https://example.com/events?topic=orders"
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::backoff::FibonacciBackoff;
use crate::error::ConfigError;

/// Default reconnect interval after the server ends the stream (1 s).
pub const DEFAULT_BASE_INTERVAL_MS: u64 = 1_000;
/// Default lower bound for retry delays (1 s).
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1_000;
/// Default point past which backoff stops growing (30 s).
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 30_000;
/// Statuses retried by default when server-error retries are enabled.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 3] = [502, 503, 504];

/// Retry and backoff tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicyConfig {
    /// Reconnect interval used after a peer close until the server sends
    /// `retry:`.
    pub base_interval_ms: u64,
    /// Lower bound of every retry delay.
    pub min_interval_ms: u64,
    /// Point past which backoff stops growing.
    pub max_interval_ms: u64,
    /// Retry ceiling per burst. `None` retries forever.
    #[serde(with = "attempt_limit")]
    pub max_attempts: Option<u32>,
    /// Retry when the request fails at the network level.
    pub retry_on_network_error: bool,
    /// Retry on the statuses listed in `retryable_server_statuses`.
    pub retry_on_server_error: bool,
    /// Server statuses eligible for retry.
    pub retryable_server_statuses: BTreeSet<u16>,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: DEFAULT_BASE_INTERVAL_MS,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            max_interval_ms: DEFAULT_MAX_INTERVAL_MS,
            max_attempts: None,
            retry_on_network_error: true,
            retry_on_server_error: false,
            retryable_server_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
        }
    }
}

impl RetryPolicyConfig {
    /// Create the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base reconnect interval.
    #[must_use]
    pub fn with_base_interval(mut self, interval: Duration) -> Self {
        self.base_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the minimum retry interval.
    #[must_use]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the maximum retry interval.
    #[must_use]
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the retry ceiling. `None` retries forever.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Enable or disable retries on network errors.
    #[must_use]
    pub fn with_retry_on_network_error(mut self, enabled: bool) -> Self {
        self.retry_on_network_error = enabled;
        self
    }

    /// Enable or disable retries on server errors.
    #[must_use]
    pub fn with_retry_on_server_error(mut self, enabled: bool) -> Self {
        self.retry_on_server_error = enabled;
        self
    }

    /// Replace the set of retryable server statuses.
    #[must_use]
    pub fn with_retryable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_server_statuses = statuses.into_iter().collect();
        self
    }

    /// Base reconnect interval.
    #[must_use]
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// Minimum retry interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Maximum retry interval.
    #[must_use]
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// Backoff curve for these bounds.
    #[must_use]
    pub fn backoff(&self) -> FibonacciBackoff {
        FibonacciBackoff::new(self.min_interval(), self.max_interval())
    }

    /// Whether `attempts` retries have used up the ceiling.
    #[must_use]
    pub fn ceiling_reached(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    /// Whether a server error with `status` may be retried.
    #[must_use]
    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_on_server_error && self.retryable_server_statuses.contains(&status)
    }

    /// Check the policy for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval_ms > self.max_interval_ms {
            return Err(ConfigError::InvertedBounds {
                min_ms: self.min_interval_ms,
                max_ms: self.max_interval_ms,
            });
        }
        Ok(())
    }
}

/// Everything needed to issue a stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL.
    pub url: String,
    /// Path appended verbatim to `url`.
    pub path: String,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Query parameters merged into the URL, overriding existing values.
    pub params: BTreeMap<String, String>,
    /// Retry and backoff tuning.
    pub retry: RetryPolicyConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: String::new(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            retry: RetryPolicyConfig::default(),
        }
    }

    /// Replace the base URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Replace the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Add or replace one header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merge headers into the existing set.
    #[must_use]
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add or replace one query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Merge query parameters into the existing set.
    #[must_use]
    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicyConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the request URL: `url + path` with `params` merged into the
    /// query string.
    pub fn request_url(&self) -> Result<Url, ConfigError> {
        let raw = format!("{}{}", self.url, self.path);
        let mut url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        if !self.params.is_empty() {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| !self.params.contains_key(k.as_ref()))
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .extend_pairs(&self.params);
        }

        Ok(url)
    }

    /// Check the configuration without issuing anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.request_url()?;
        self.retry.validate()
    }
}

/// Serde adapter: negative or null means unlimited.
mod attempt_limit {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(max) => serializer.serialize_i64(i64::from(*max)),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(match raw {
            Some(n) if n >= 0 => Some(u32::try_from(n).unwrap_or(u32::MAX)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let retry = RetryPolicyConfig::default();
        assert_eq!(retry.max_attempts, None);
        assert!(retry.retry_on_network_error);
        assert!(!retry.retry_on_server_error);
        assert!(!retry.retries_status(503));
        assert!(!retry.ceiling_reached(u32::MAX));
    }

    #[test]
    fn test_ceiling() {
        let retry = RetryPolicyConfig::new().with_max_attempts(Some(3));
        assert!(!retry.ceiling_reached(2));
        assert!(retry.ceiling_reached(3));
    }

    #[test]
    fn test_retryable_statuses() {
        let retry = RetryPolicyConfig::new()
            .with_retry_on_server_error(true)
            .with_retryable_statuses([500, 503]);
        assert!(retry.retries_status(503));
        assert!(!retry.retries_status(502));
    }

    #[test]
    fn test_request_url_concatenates_path() -> Result<(), ConfigError> {
        let config = ClientConfig::new("https://example.com/api").with_path("/stream");
        assert_eq!(config.request_url()?.as_str(), "https://example.com/api/stream");
        Ok(())
    }

    #[test]
    fn test_params_override_existing_query() -> Result<(), ConfigError> {
        let config = ClientConfig::new("https://example.com/s?a=1&b=2")
            .with_param("b", "3")
            .with_param("c", "4");
        assert_eq!(
            config.request_url()?.as_str(),
            "https://example.com/s?a=1&b=3&c=4"
        );
        Ok(())
    }

    #[test]
    fn test_header_merge_keeps_existing() {
        let config = ClientConfig::new("https://example.com")
            .with_header("x-a", "1")
            .with_headers([("x-b", "2"), ("x-a", "override")]);
        assert_eq!(config.headers.get("x-a").map(String::as_str), Some("override"));
        assert_eq!(config.headers.get("x-b").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_invalid_url() {
        let config = ClientConfig::new("not a url");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_inverted_bounds() {
        let retry = RetryPolicyConfig::new()
            .with_min_interval(Duration::from_secs(10))
            .with_max_interval(Duration::from_secs(1));
        assert!(matches!(
            retry.validate(),
            Err(ConfigError::InvertedBounds { min_ms: 10_000, max_ms: 1_000 })
        ));
    }

    #[test]
    fn test_deserialize_attempt_limit() -> Result<(), serde_json::Error> {
        let retry: RetryPolicyConfig = serde_json::from_str(r#"{"max_attempts": 3}"#)?;
        assert_eq!(retry.max_attempts, Some(3));
        assert_eq!(retry.min_interval_ms, DEFAULT_MIN_INTERVAL_MS);

        let retry: RetryPolicyConfig = serde_json::from_str(r#"{"max_attempts": -5}"#)?;
        assert_eq!(retry.max_attempts, None);

        let json = serde_json::to_value(RetryPolicyConfig::default())?;
        assert_eq!(json["max_attempts"], serde_json::json!(-1));
        Ok(())
    }
}
