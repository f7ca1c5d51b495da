//! Configuration for the scoring API.
//!
//! Values come from defaults, an optional TOML or JSON file and
//! `SCORING__SECTION__KEY` environment variables, in that order. Unknown
//! keys in files are rejected.
//!
//! ```toml
//! [server]
//! http_addr = "127.0.0.1:8080"
//! request_timeout_ms = 30000
//!
//! [auth]
//! salt = "Otus"
//! admin_login = "admin"
//! admin_salt = "42"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [metrics]
//! enabled = true
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{
    AuthSection, LoggingSection, MetricsSection, ScoringConfig, ServerSection, DEFAULT_HTTP_ADDR,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
