//! Prometheus metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `scoring_requests_total` | Counter | `method`, `code` |
//! | `scoring_request_duration_seconds` | Histogram | `method` |
//! | `scoring_auth_failures_total` | Counter | - |
//! | `scoring_validation_failures_total` | Counter | `stage` |
//! | `scoring_in_flight_requests` | Gauge | - |
//!
//! Recording goes through the `metrics` facade and is a no-op until
//! [`init_metrics`] installs the Prometheus recorder.

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Total requests by method and response code.
pub const REQUESTS_TOTAL: &str = "scoring_requests_total";
/// Request latency by method.
pub const REQUEST_DURATION: &str = "scoring_request_duration_seconds";
/// Rejected tokens.
pub const AUTH_FAILURES_TOTAL: &str = "scoring_auth_failures_total";
/// Validation failures by stage (`envelope` or `arguments`).
pub const VALIDATION_FAILURES_TOTAL: &str = "scoring_validation_failures_total";
/// Requests currently being processed.
pub const IN_FLIGHT: &str = "scoring_in_flight_requests";

/// Latency buckets in seconds: 1ms .. 10s.
pub const DURATION_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Installs the Prometheus recorder and returns its handle.
///
/// Calling this again returns the handle installed the first time.
pub fn init_metrics() -> TelemetryResult<&'static PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle);
    }

    let _guard = INIT_LOCK
        .lock()
        .map_err(|_| TelemetryError::MetricsInit("init lock poisoned".to_string()))?;
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &DURATION_BUCKETS)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();
    Ok(METRICS_HANDLE.get_or_init(|| handle))
}

/// Returns the handle if metrics were initialized.
#[must_use]
pub fn metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders all metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of API requests by method and code");
    describe_histogram!(REQUEST_DURATION, "API request duration in seconds");
    describe_counter!(AUTH_FAILURES_TOTAL, "Total number of rejected tokens");
    describe_counter!(
        VALIDATION_FAILURES_TOTAL,
        "Total validation failures by stage"
    );
    describe_gauge!(IN_FLIGHT, "Number of API requests currently being processed");
}

/// Records a completed request.
///
/// `method` is `-` when the envelope could not be read.
pub fn record_request(method: &str, code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "code" => code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION, "method" => method.to_string()).record(duration.as_secs_f64());
}

/// Records a rejected token.
pub fn record_auth_failure() {
    counter!(AUTH_FAILURES_TOTAL).increment(1);
}

/// Records a validation failure at `stage` (`envelope` or `arguments`).
pub fn record_validation_failure(stage: &'static str) {
    counter!(VALIDATION_FAILURES_TOTAL, "stage" => stage).increment(1);
}

/// Keeps the in-flight gauge raised while alive.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_does_not_panic() {
        record_request("online_score", 200, Duration::from_millis(3));
        record_auth_failure();
        record_validation_failure("arguments");
        drop(InFlightGuard::new());
    }

    #[test]
    fn test_init_is_idempotent_and_renders() {
        let first = init_metrics().unwrap();
        let second = init_metrics().unwrap();
        assert!(std::ptr::eq(first, second));

        record_request("clients_interests", 422, Duration::from_millis(5));
        record_validation_failure("envelope");
        record_auth_failure();
        {
            let _guard = InFlightGuard::new();
        }

        let rendered = render_metrics().unwrap();
        assert!(rendered.contains(REQUESTS_TOTAL));
        assert!(rendered.contains("method=\"clients_interests\""));
        assert!(rendered.contains("code=\"422\""));
        assert!(rendered.contains(VALIDATION_FAILURES_TOTAL));
        assert!(rendered.contains(AUTH_FAILURES_TOTAL));
        assert!(rendered.contains("scoring_request_duration_seconds_bucket"));
        assert!(metrics_handle().is_some());
    }
}
