//! Structured logging.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and one fmt
//! layer in the configured [`LogFormat`]. Output goes to stdout, or to an
//! append-only file when [`LogConfig::file`] is set.
//!
//! # Example
//!
//! ```rust,ignore
//! use scoring_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! tracing::info!(request_id = %id, method = "online_score", "request handled");
//! ```

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Timestamp format used in every log line.
pub const LOG_TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line, human-oriented.
    Pretty,
    /// Single line per event.
    #[default]
    Compact,
}

impl LogFormat {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `scoring_core=debug,info`.
    pub level: String,

    /// Line format.
    pub format: LogFormat,

    /// Append to this file instead of writing to stdout.
    pub file: Option<PathBuf>,

    /// Whether to include the module path of each event.
    pub include_target: bool,

    /// Whether to colour output. Ignored for file output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            file: None,
            include_target: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Human-readable debug output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
            ..Self::default()
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            ansi: false,
            ..Self::default()
        }
    }
}

/// Parses a filter directive.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level '{filter}': {e}")))
}

/// Opens `path` for appending, creating it if needed.
fn file_writer(path: &Path) -> TelemetryResult<BoxMakeWriter> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

fn build_layer(config: &LogConfig) -> TelemetryResult<Box<dyn Layer<Registry> + Send + Sync>> {
    let filter = create_env_filter(&config.level)?;

    let (writer, ansi) = match &config.file {
        Some(path) => (file_writer(path)?, false),
        None => (BoxMakeWriter::new(std::io::stdout), config.ansi),
    };

    let base = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
        .with_target(config.include_target)
        .with_ansi(ansi);

    let layer = match config.format {
        LogFormat::Json => base.json().with_filter(filter).boxed(),
        LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
    };
    Ok(layer)
}

/// Installs the global subscriber.
///
/// Fails if the filter is invalid, the log file cannot be opened, or a
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    let layer = build_layer(config)?;

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        level = %config.level,
        format = %config.format,
        file = ?config.file,
        "logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_presets() {
        assert_eq!(LogConfig::development().format, LogFormat::Pretty);
        assert_eq!(LogConfig::development().level, "debug");
        assert_eq!(LogConfig::production().format, LogFormat::Json);
        assert!(!LogConfig::production().ansi);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_format_serde() {
        let format: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
    }

    #[test]
    fn test_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("scoring_core=debug,warn").is_ok());
        assert!(create_env_filter("scoring=notalevel").is_err());
    }

    #[test]
    fn test_file_writer_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoring.log");
        std::fs::write(&path, "first\n").unwrap();

        let writer = file_writer(&path).unwrap();
        writer.make_writer().write_all(b"second\n").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_bad_log_path_is_reported() {
        let config = LogConfig {
            file: Some(PathBuf::from("/nonexistent-dir/for/sure/scoring.log")),
            ..LogConfig::default()
        };
        assert!(matches!(build_layer(&config), Err(TelemetryError::Io(_))));
    }

    #[test]
    fn test_bad_level_is_reported() {
        let config = LogConfig {
            level: "scoring=notalevel".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            build_layer(&config),
            Err(TelemetryError::LoggingInit(_))
        ));
    }
}
