//! Client configuration and its builder.

use std::time::Duration;

use rally_protocol::{API_VERSION, Language};
use rally_transport::TransportConfig;

/// Port the game server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 7445;

/// How many times a logical call may hit the network, and how long to
/// wait between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first one. At least 1.
    pub max_retries: u32,
    /// Pause after a failed attempt before the next one.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Clamp any out-of-range values so the policy is safe to use.
    pub fn validated(mut self) -> Self {
        if self.max_retries == 0 {
            tracing::warn!("max_retries of 0 would never send anything, using 1");
            self.max_retries = 1;
        }
        self
    }
}

/// Everything a [`GameClient`](crate::GameClient) needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Sent as `apiVersion` in every request.
    pub api_version: String,
    /// Sent as `language` in every request.
    pub language: Language,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
    /// Overall bound on a liveness probe, independent of the retry policy.
    pub probe_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            api_version: API_VERSION.to_string(),
            language: Language::default(),
            transport: TransportConfig::default(),
            retry: RetryPolicy::default(),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    /// Clamp any out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        self.transport = self.transport.validated();
        self.retry = self.retry.validated();
        self.probe_timeout = self.probe_timeout.max(TransportConfig::MIN_TIMEOUT);
        self
    }

    /// The `host:port` string handed to the transport.
    ///
    /// Bare IPv6 literals get bracketed so the port stays unambiguous.
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`GameClient`](crate::GameClient).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use rally_client::{GameClient, Language};
///
/// let client = GameClient::builder()
///     .host("127.0.0.1")
///     .port(7445)
///     .language(Language::En)
///     .max_retries(5)
///     .retry_delay(Duration::from_millis(200))
///     .build();
/// assert_eq!(client.addr(), "127.0.0.1:7445");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Sets the bound on establishing each connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.transport.connect_timeout = timeout;
        self
    }

    /// Sets the bound on writing each request.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.transport.write_timeout = timeout;
        self
    }

    /// Sets the bound on each individual read.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.transport.read_timeout = timeout;
        self
    }

    /// Sets the total number of attempts per call (values below 1 become 1).
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.config.retry.max_retries = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry.retry_delay = delay;
        self
    }

    /// Sets the overall bound on [`GameClient::ping`](crate::GameClient::ping).
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Returns the configuration built so far, validated.
    pub fn into_config(self) -> ClientConfig {
        self.config.validated()
    }
}
