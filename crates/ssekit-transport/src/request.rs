//! Request description handed to a [`Transport`](crate::Transport).

use http1::header::{HeaderName, HeaderValue};
use ssekit_core::config::ClientConfig;
use ssekit_core::error::ConfigError;
use url::Url;

/// `Accept` value sent with every stream request.
pub const ACCEPT_EVENT_STREAM: &str = "text/event-stream";

/// Header marking the request as script-initiated.
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";

/// Header carrying the resumption token.
pub const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";

/// A fully resolved stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// HTTP method. Always `GET` for event streams.
    pub method: &'static str,
    /// Request URL with query parameters merged in.
    pub url: Url,
    /// Request headers, in the order they should be sent.
    pub headers: Vec<(String, String)>,
}

impl StreamRequest {
    /// Resolve a request from the configuration snapshot of this attempt.
    ///
    /// Configured headers come first. `Accept` and `X-Requested-With` are
    /// always set and replace any configured header of the same name.
    /// `Last-Event-ID` is sent when `last_event_id` is non-empty.
    pub fn build(config: &ClientConfig, last_event_id: Option<&str>) -> Result<Self, ConfigError> {
        let url = config.request_url()?;

        let mut headers = Vec::with_capacity(config.headers.len() + 3);
        for (name, value) in &config.headers {
            validate_header(name, value)?;
            if name.eq_ignore_ascii_case("accept") || name.eq_ignore_ascii_case(REQUESTED_WITH_HEADER)
            {
                continue;
            }
            headers.push((name.clone(), value.clone()));
        }
        headers.push(("Accept".to_string(), ACCEPT_EVENT_STREAM.to_string()));
        headers.push((REQUESTED_WITH_HEADER.to_string(), "XMLHttpRequest".to_string()));

        if let Some(id) = last_event_id.filter(|id| !id.is_empty()) {
            validate_header(LAST_EVENT_ID_HEADER, id)?;
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case(LAST_EVENT_ID_HEADER));
            headers.push((LAST_EVENT_ID_HEADER.to_string(), id.to_string()));
        }

        Ok(Self {
            method: "GET",
            url,
            headers,
        })
    }

    /// Look up a header value, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Check a header against the rules of the `http` types the transport sends.
fn validate_header(name: &str, value: &str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeaderName {
        name: name.to_string(),
    })?;
    HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_headers_always_present() -> Result<(), ConfigError> {
        let config = ClientConfig::new("https://example.com/events")
            .with_header("Authorization", "Bearer t")
            .with_header("accept", "application/json");
        let request = StreamRequest::build(&config, None)?;

        assert_eq!(request.method, "GET");
        assert_eq!(request.header("authorization"), Some("Bearer t"));
        assert_eq!(request.header("Accept"), Some("text/event-stream"));
        assert_eq!(request.header("x-requested-with"), Some("XMLHttpRequest"));
        assert_eq!(request.header(LAST_EVENT_ID_HEADER), None);
        assert_eq!(request.headers.len(), 3);
        Ok(())
    }

    #[test]
    fn test_last_event_id_sent_when_present() -> Result<(), ConfigError> {
        let config = ClientConfig::new("https://example.com/events");
        let request = StreamRequest::build(&config, Some("41"))?;
        assert_eq!(request.header("last-event-id"), Some("41"));

        let request = StreamRequest::build(&config, Some(""))?;
        assert_eq!(request.header("last-event-id"), None);
        Ok(())
    }

    #[test]
    fn test_invalid_header_rejected() {
        let config = ClientConfig::new("https://example.com").with_header("bad name", "v");
        assert!(matches!(
            StreamRequest::build(&config, None),
            Err(ConfigError::InvalidHeaderName { .. })
        ));

        let config = ClientConfig::new("https://example.com").with_header("x-ok", "line\r\nbreak");
        assert!(matches!(
            StreamRequest::build(&config, None),
            Err(ConfigError::InvalidHeaderValue { .. })
        ));
    }

    #[test]
    fn test_header_rules_match_http_types() -> Result<(), ConfigError> {
        // Non-ASCII text, C1 controls included, is opaque to HTTP.
        let config = ClientConfig::new("https://example.com")
            .with_header("x-name", "a\u{85}b")
            .with_header("x-tab", "a\tb");
        let request = StreamRequest::build(&config, None)?;
        assert_eq!(request.header("x-name"), Some("a\u{85}b"));
        assert_eq!(request.header("x-tab"), Some("a\tb"));

        for value in ["nul\0", "del\u{7f}", "bell\u{7}"] {
            let config = ClientConfig::new("https://example.com").with_header("x-bad", value);
            assert!(matches!(
                StreamRequest::build(&config, None),
                Err(ConfigError::InvalidHeaderValue { name }) if name == "x-bad"
            ));
        }

        let config = ClientConfig::new("https://example.com").with_header("", "v");
        assert!(matches!(
            StreamRequest::build(&config, None),
            Err(ConfigError::InvalidHeaderName { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_last_event_id_rejected() {
        let config = ClientConfig::new("https://example.com");
        assert!(matches!(
            StreamRequest::build(&config, Some("1\n2")),
            Err(ConfigError::InvalidHeaderValue { name }) if name == LAST_EVENT_ID_HEADER
        ));
    }

    #[test]
    fn test_url_resolved_with_params() -> Result<(), ConfigError> {
        let config = ClientConfig::new("https://example.com")
            .with_path("/v1/stream")
            .with_param("since", "10");
        let request = StreamRequest::build(&config, None)?;
        assert_eq!(request.url.as_str(), "https://example.com/v1/stream?since=10");
        Ok(())
    }
}
