//! Observability for the scoring API.
//!
//! - **Logging**: `tracing-subscriber` with json, pretty or compact output,
//!   to stdout or an append-only file
//! - **Metrics**: Prometheus text rendering via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use scoring_telemetry::{init_telemetry, LogConfig};
//!
//! init_telemetry(&LogConfig::default(), true)?;
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, render_metrics, InFlightGuard};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and, when `metrics_enabled`, the metrics recorder.
pub fn init_telemetry(log: &LogConfig, metrics_enabled: bool) -> TelemetryResult<()> {
    init_logging(log)?;
    if metrics_enabled {
        init_metrics()?;
        tracing::debug!("metrics recorder installed");
    }
    Ok(())
}
