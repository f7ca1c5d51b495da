//! # Scoring
//!
//! Wiring for the scoring API binary: command line, the default in-process
//! store, and assembly of the dispatcher and server from configuration.

#![forbid(unsafe_code)]

pub mod cli;
pub mod store;

use std::sync::Arc;

use scoring_config::ScoringConfig;
use scoring_core::{AuthGuard, Clock, Dispatcher, MethodRegistry, SchemaError, Store, SystemClock};
use scoring_server::{Server, ServerConfig};

pub use cli::Cli;
pub use store::LocalStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds the dispatcher with the standard methods.
pub fn build_dispatcher(
    config: &ScoringConfig,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
) -> Result<Dispatcher, SchemaError> {
    let registry = MethodRegistry::standard()?;
    let guard = AuthGuard::new(config.auth.to_auth_settings(), Arc::clone(&clock));
    Dispatcher::new(registry, guard, store, clock)
}

/// Translates the `[server]` and `[metrics]` sections.
#[must_use]
pub fn server_config(config: &ScoringConfig) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .request_timeout(config.server.request_timeout())
        .shutdown_timeout(config.server.shutdown_timeout())
        .max_body_bytes(config.server.max_body_bytes)
        .metrics_enabled(config.metrics.enabled)
        .build()
}

/// Builds a server backed by [`LocalStore`] and the system clock.
pub fn build_server(config: &ScoringConfig) -> Result<Server, SchemaError> {
    let dispatcher = build_dispatcher(
        config,
        Arc::new(LocalStore::new()),
        Arc::new(SystemClock),
    )?;
    Ok(Server::new(server_config(config), Arc::new(dispatcher)))
}
