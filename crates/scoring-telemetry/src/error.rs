//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Unknown log format name.
    #[error("Unknown log format '{0}' (expected json, pretty or compact)")]
    UnknownFormat(String),

    /// Log file could not be opened.
    #[error("Cannot open log file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::MetricsInit("recorder already set".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to initialize metrics: recorder already set"
        );

        let err = TelemetryError::UnknownFormat("xml".to_string());
        assert!(err.to_string().contains("'xml'"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TelemetryError = io.into();
        assert!(matches!(err, TelemetryError::Io(_)));
    }
}
