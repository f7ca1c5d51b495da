//! Transport settings.
//!
//! ```rust
//! use scoring_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("127.0.0.1:9000")
//!     .request_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.http_addr(), "127.0.0.1:9000");
//! ```

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default shutdown grace period.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default body limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Server configuration. Build with [`ServerConfig::builder`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    http_addr: String,
    request_timeout: Duration,
    shutdown_timeout: Duration,
    max_body_bytes: usize,
    metrics_enabled: bool,
}

impl ServerConfig {
    /// Returns a builder with default values.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Listen address as configured.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses the listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// Upper bound on reading the body plus dispatching it.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// How long shutdown waits for open connections.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Largest accepted body.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Whether `GET /metrics` is served.
    #[must_use]
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    http_addr: String,
    request_timeout: Duration,
    shutdown_timeout: Duration,
    max_body_bytes: usize,
    metrics_enabled: bool,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            metrics_enabled: true,
        }
    }
}

impl ServerConfigBuilder {
    /// Sets the listen address, e.g. `0.0.0.0:8080`.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the shutdown grace period.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the body limit in bytes.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Enables or disables `GET /metrics`.
    #[must_use]
    pub fn metrics_enabled(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr,
            request_timeout: self.request_timeout,
            shutdown_timeout: self.shutdown_timeout,
            max_body_bytes: self.max_body_bytes,
            metrics_enabled: self.metrics_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr(), "127.0.0.1:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_body_bytes(), 1_048_576);
        assert!(config.metrics_enabled());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::builder()
            .http_addr("0.0.0.0:9000")
            .shutdown_timeout(Duration::from_secs(5))
            .max_body_bytes(64)
            .metrics_enabled(false)
            .build();

        assert_eq!(config.socket_addr().unwrap().port(), 9000);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_body_bytes(), 64);
        assert!(!config.metrics_enabled());
    }

    #[test]
    fn test_bad_addr() {
        let config = ServerConfig::builder().http_addr("nowhere").build();
        assert!(config.socket_addr().is_err());
    }
}
