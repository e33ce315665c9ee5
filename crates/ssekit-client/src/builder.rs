//! Fluent construction of an [`EventSource`].

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use ssekit_core::{ClientConfig, RetryPolicyConfig};
use ssekit_transport::{Scheduler, Transport};

use crate::client::EventSource;
use crate::error::ClientError;
use crate::listeners::{EventBus, ListenerRegistry};
use crate::machine::Machine;

/// Builder for [`EventSource`].
///
/// The transport defaults to the `reqwest` HTTP transport when the `http`
/// feature is enabled, and the scheduler to a Tokio timer on the current
/// runtime when `tokio-runtime` is enabled (the default).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ssekit_client::EventSource;
/// use ssekit_testing::{ManualScheduler, MockTransport};
///
/// # fn main() -> Result<(), ssekit_client::ClientError> {
/// let source = EventSource::builder("https://example.com")
///     .path("/stream")
///     .header("Authorization", "Bearer token")
///     .param("since", "42")
///     .min_interval(Duration::from_millis(500))
///     .max_attempts(Some(5))
///     .transport(MockTransport::new())
///     .scheduler(ManualScheduler::new())
///     .rng_seed(7)
///     .build()?;
///
/// assert_eq!(source.config().retry.max_attempts, Some(5));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct EventSourceBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    bus: Option<Arc<dyn EventBus>>,
    rng_seed: Option<u64>,
}

impl EventSourceBuilder {
    /// Create a builder for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(url))
    }

    /// Create a builder from a complete configuration value.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            scheduler: None,
            bus: None,
            rng_seed: None,
        }
    }

    /// Set the path appended to the URL.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config = self.config.with_path(path);
        self
    }

    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.with_header(name, value);
        self
    }

    /// Add a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.with_param(name, value);
        self
    }

    /// Replace the whole retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicyConfig) -> Self {
        self.config = self.config.with_retry(policy);
        self
    }

    /// Interval before reconnecting after the server ends the stream, when
    /// the server has not announced one.
    pub fn base_interval(mut self, interval: Duration) -> Self {
        self.config.retry = self.config.retry.with_base_interval(interval);
        self
    }

    /// Lower bound of the retry delay.
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.config.retry = self.config.retry.with_min_interval(interval);
        self
    }

    /// Point past which the backoff stops growing.
    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.config.retry = self.config.retry.with_max_interval(interval);
        self
    }

    /// Retry ceiling per burst. `None` retries forever.
    pub fn max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.config.retry = self.config.retry.with_max_attempts(attempts);
        self
    }

    /// Whether network failures are retried.
    pub fn retry_on_network_error(mut self, enabled: bool) -> Self {
        self.config.retry = self.config.retry.with_retry_on_network_error(enabled);
        self
    }

    /// Whether server errors with a retryable status are retried.
    pub fn retry_on_server_error(mut self, enabled: bool) -> Self {
        self.config.retry = self.config.retry.with_retry_on_server_error(enabled);
        self
    }

    /// Statuses eligible for retry when server errors are retried.
    pub fn retryable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.config.retry = self.config.retry.with_retryable_statuses(statuses);
        self
    }

    /// Use `transport` to issue requests.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use `scheduler` for retry timers.
    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }

    /// Publish events through `bus` instead of a private registry.
    pub fn event_bus(mut self, bus: impl EventBus + 'static) -> Self {
        self.bus = Some(Arc::new(bus));
        self
    }

    /// Seed the jitter source for reproducible retry delays.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Build the client. Nothing is connected until `open()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse, the retry bounds are
    /// inverted, or a default collaborator is unavailable.
    pub fn build(self) -> Result<EventSource, ClientError> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let scheduler = match self.scheduler {
            Some(scheduler) => scheduler,
            None => default_scheduler()?,
        };
        let bus = self
            .bus
            .unwrap_or_else(|| Arc::new(ListenerRegistry::new()));
        let rng = self
            .rng_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(EventSource::from_machine(Machine::new(
            self.config,
            transport,
            scheduler,
            bus,
            rng,
        )))
    }
}

#[cfg(feature = "http")]
fn default_transport() -> Result<Arc<dyn Transport>, ClientError> {
    use ssekit_transport::{HttpTransport, HttpTransportConfig};
    Ok(Arc::new(HttpTransport::new(HttpTransportConfig::default())?))
}

#[cfg(not(feature = "http"))]
fn default_transport() -> Result<Arc<dyn Transport>, ClientError> {
    Err(ClientError::MissingTransport)
}

#[cfg(feature = "tokio-runtime")]
fn default_scheduler() -> Result<Arc<dyn Scheduler>, ClientError> {
    Ok(Arc::new(ssekit_transport::TokioScheduler::current()?))
}

#[cfg(not(feature = "tokio-runtime"))]
fn default_scheduler() -> Result<Arc<dyn Scheduler>, ClientError> {
    Err(ClientError::MissingScheduler)
}
