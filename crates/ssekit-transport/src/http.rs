//! Streaming HTTP transport over `reqwest`.
//!
//! Each attempt runs in its own Tokio task:
//!
//! ```text
//! issue() ─► spawn ─► send GET ──► on_headers(status)
//!                        │            │
//!                        │            ├─ 200: on_progress(200, text) per chunk
//!                        │            │
//!                        │            └─ on_complete(status, text) at end of body
//!                        │
//!                        └─ connect/read failure ─► on_complete(0, text)
//! ```
//!
//! Aborting the handle aborts the task, which drops the connection.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::body::Utf8Body;
use crate::error::TransportError;
use crate::request::StreamRequest;
use crate::traits::{ResponseSink, STATUS_NETWORK_ERROR, STATUS_OK, Transport, TransportHandle};

/// Default maximum body size per attempt (64 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum silence between body chunks before the attempt is treated as
    /// a network failure. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Body size past which the attempt is treated as a network failure.
    pub max_body_size: usize,
}

impl HttpTransportConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the maximum body size.
    #[must_use]
    pub const fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP transport for event streams.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    runtime: Handle,
}

impl HttpTransport {
    /// Create a transport on the current Tokio runtime.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::Connection {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Self::with_client(client, config)
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: Client, config: HttpTransportConfig) -> Result<Self, TransportError> {
        let runtime = Handle::try_current().map_err(|e| TransportError::NoRuntime {
            message: e.to_string(),
        })?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }
}

struct HttpHandle(AbortHandle);

impl TransportHandle for HttpHandle {
    fn abort(&mut self) {
        self.0.abort();
    }
}

impl Transport for HttpTransport {
    fn issue(
        &self,
        request: StreamRequest,
        sink: Arc<dyn ResponseSink>,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        let mut builder = self.client.get(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(url = %request.url, "issuing stream request");
        let task = self.runtime.spawn(run_attempt(
            builder,
            sink,
            self.config.read_timeout,
            self.config.max_body_size,
        ));
        Ok(Box::new(HttpHandle(task.abort_handle())))
    }
}

async fn run_attempt(
    builder: reqwest::RequestBuilder,
    sink: Arc<dyn ResponseSink>,
    read_timeout: Option<Duration>,
    max_body_size: usize,
) {
    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "stream request failed");
            sink.on_complete(STATUS_NETWORK_ERROR, "");
            return;
        }
    };

    let status = response.status().as_u16();
    sink.on_headers(status);

    let mut body = Utf8Body::new();
    let mut chunks = response.bytes_stream();

    loop {
        let next = match read_timeout {
            Some(limit) => match tokio::time::timeout(limit, chunks.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "stream read timed out");
                    sink.on_complete(STATUS_NETWORK_ERROR, body.text());
                    return;
                }
            },
            None => chunks.next().await,
        };

        match next {
            Some(Ok(chunk)) => {
                body.push(&chunk);
                if body.received() > max_body_size {
                    warn!(max = max_body_size, "stream body exceeded size limit");
                    sink.on_complete(STATUS_NETWORK_ERROR, body.text());
                    return;
                }
                if status == STATUS_OK {
                    sink.on_progress(status, body.text());
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "stream body read failed");
                sink.on_complete(STATUS_NETWORK_ERROR, body.text());
                return;
            }
            None => break,
        }
    }

    debug!(status, bytes = body.received(), "stream body finished");
    sink.on_complete(status, body.text());
}
