//! Configuration types.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use scoring_core::{AuthSettings, DEFAULT_ADMIN_LOGIN, DEFAULT_ADMIN_SALT, DEFAULT_SALT};
use scoring_telemetry::{LogConfig, LogFormat};

use crate::ConfigError;

/// Default listen address.
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";
/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
/// Default maximum request body size (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Complete service configuration.
///
/// # Example
///
/// ```
/// use scoring_config::ScoringConfig;
///
/// let config = ScoringConfig::default();
/// assert_eq!(config.server.http_addr, "127.0.0.1:8080");
/// assert_eq!(config.auth.salt, "Otus");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Token secrets.
    #[serde(default)]
    pub auth: AuthSection,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Prometheus metrics.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl ScoringConfig {
    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        for (field, value) in [
            ("auth.salt", &self.auth.salt),
            ("auth.admin_login", &self.auth.admin_login),
            ("auth.admin_salt", &self.auth.admin_salt),
        ] {
            if value.is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Local development preset: debug, pretty logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }

    /// Production preset: listen on all interfaces, JSON logs.
    #[must_use]
    pub fn production() -> Self {
        Self {
            server: ServerSection {
                http_addr: "0.0.0.0:8080".to_string(),
                ..ServerSection::default()
            },
            logging: LoggingSection {
                format: LogFormat::Json,
                ansi: false,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Listen address, `host:port`.
    pub http_addr: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Grace period for in-flight connections on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerSection {
    /// Parses `http_addr`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.http_addr),
            )
        })
    }

    /// Replaces the port of `http_addr`.
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        let mut addr = self.socket_addr()?;
        addr.set_port(port);
        self.http_addr = addr.to_string();
        Ok(())
    }

    /// Replaces the host of `http_addr`. `host` must be an IP address.
    pub fn set_host(&mut self, host: &str) -> Result<(), ConfigError> {
        let ip: IpAddr = host.parse().map_err(|_| {
            ConfigError::invalid_value("server.http_addr", format!("invalid host: {host}"))
        })?;
        let mut addr = self.socket_addr()?;
        addr.set_ip(ip);
        self.http_addr = addr.to_string();
        Ok(())
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Shutdown timeout as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// `[auth]` section.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    /// Salt for regular callers.
    pub salt: String,
    /// Login that takes the admin path.
    pub admin_login: String,
    /// Salt for the hourly admin token.
    pub admin_salt: String,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            salt: DEFAULT_SALT.to_string(),
            admin_login: DEFAULT_ADMIN_LOGIN.to_string(),
            admin_salt: DEFAULT_ADMIN_SALT.to_string(),
        }
    }
}

impl std::fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSection")
            .field("salt", &"[REDACTED]")
            .field("admin_login", &self.admin_login)
            .field("admin_salt", &"[REDACTED]")
            .finish()
    }
}

impl AuthSection {
    /// Converts to the settings the auth guard consumes.
    #[must_use]
    pub fn to_auth_settings(&self) -> AuthSettings {
        AuthSettings {
            salt: self.salt.clone(),
            admin_login: self.admin_login.clone(),
            admin_salt: self.admin_salt.clone(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directive.
    pub level: String,
    /// Line format: `json`, `pretty` or `compact`.
    pub format: LogFormat,
    /// Append to this file instead of stdout.
    pub file: Option<PathBuf>,
    /// Colour output on a terminal.
    pub ansi: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            file: None,
            ansi: true,
        }
    }
}

impl LoggingSection {
    /// Converts to the telemetry crate's logging configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level.clone(),
            format: self.format,
            file: self.file.clone(),
            ansi: self.ansi,
            ..LogConfig::default()
        }
    }
}

/// `[metrics]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSection {
    /// Record metrics and serve `GET /metrics`.
    pub enabled: bool,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.server.max_body_bytes, 1_048_576);
        assert!(config.metrics.enabled);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ScoringConfig::development().logging.level, "debug");
        let production = ScoringConfig::production();
        assert_eq!(production.server.http_addr, "0.0.0.0:8080");
        assert_eq!(production.logging.format, LogFormat::Json);
        assert!(production.validate().is_ok());
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = ScoringConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ScoringConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_salt_rejected() {
        let mut config = ScoringConfig::default();
        config.auth.admin_salt = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.admin_salt"));
    }

    #[test]
    fn test_set_port_and_host() {
        let mut server = ServerSection::default();
        server.set_port(9000).unwrap();
        assert_eq!(server.http_addr, "127.0.0.1:9000");
        server.set_host("0.0.0.0").unwrap();
        assert_eq!(server.http_addr, "0.0.0.0:9000");
        assert!(server.set_host("example.com").is_err());
    }

    #[test]
    fn test_auth_conversion_and_redaction() {
        let auth = AuthSection::default();
        let settings = auth.to_auth_settings();
        assert_eq!(settings.salt, "Otus");
        assert_eq!(settings.admin_login, "admin");
        assert!(!format!("{auth:?}").contains("Otus"));
    }

    #[test]
    fn test_log_config_conversion() {
        let section = LoggingSection {
            level: "warn".to_string(),
            format: LogFormat::Json,
            file: Some(PathBuf::from("/var/log/scoring.log")),
            ansi: false,
        };
        let log = section.to_log_config();
        assert_eq!(log.level, "warn");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.file, Some(PathBuf::from("/var/log/scoring.log")));
    }
}
