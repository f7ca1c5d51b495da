//! Layered configuration loading: defaults, then a file, then environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, ScoringConfig};

/// Environment prefix used by the service binary.
pub const DEFAULT_ENV_PREFIX: &str = "SCORING";

/// Builds a [`ScoringConfig`] from layered sources.
///
/// Later layers override earlier ones:
/// 1. Built-in defaults or a preset
/// 2. A TOML or JSON file
/// 3. `PREFIX__SECTION__KEY` environment variables
///
/// # Example
///
/// ```no_run
/// use scoring_config::ConfigLoader;
///
/// # fn main() -> Result<(), scoring_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("scoring.toml")?
///     .with_env_prefix("SCORING")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ScoringConfig,
    env_prefix: Option<String>,
    source: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from [`ScoringConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ScoringConfig::default(),
            env_prefix: None,
            source: None,
        }
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ScoringConfig::development();
        self
    }

    /// Starts from the production preset.
    ///
    /// ```
    /// use scoring_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_production().load().unwrap();
    /// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    /// ```
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ScoringConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file, replacing the current layer.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, has an unknown extension,
    /// or contains unknown keys.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;
        self.source = Some(path.to_path_buf());

        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is not an error.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Parses `content` in `format` (`toml` or `json`).
    ///
    /// ```
    /// use scoring_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[auth]\nsalt = \"pepper\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.auth.salt, "pepper");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// With prefix `SCORING`, `SCORING__AUTH__SALT=pepper` sets `auth.salt`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the working directory if present.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        // Missing .env is fine.
        let _ = dotenvy::dotenv();
        self
    }

    /// File the current layer came from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable environment value or an invalid result.
    pub fn load(mut self) -> Result<ScoringConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the current layer without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ScoringConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<ScoringConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // SCORINGFOO and friends belong to someone else.
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => {
                self.config.server.http_addr = value.to_string();
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                self.config.server.request_timeout_ms = parse_int(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = parse_int(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                self.config.server.max_body_bytes = parse_int(key, value)?;
            }

            ["AUTH", "SALT"] => {
                self.config.auth.salt = value.to_string();
            }
            ["AUTH", "ADMIN_LOGIN"] => {
                self.config.auth.admin_login = value.to_string();
            }
            ["AUTH", "ADMIN_SALT"] => {
                self.config.auth.admin_salt = value.to_string();
            }

            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value.parse().map_err(|_| {
                    ConfigError::env_parse_error(key, "expected 'json', 'pretty' or 'compact'")
                })?;
            }
            ["LOGGING", "FILE"] => {
                self.config.logging.file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            ["LOGGING", "ANSI"] => {
                self.config.logging.ansi = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => {
                return Err(ConfigError::env_parse_error(key, "unknown configuration key"));
            }
        }

        Ok(())
    }
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
