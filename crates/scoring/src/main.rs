//! Scoring API server entry point.

use anyhow::Context;
use clap::Parser;

use scoring::{build_server, Cli, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("failed to load configuration")?;

    scoring_telemetry::init_telemetry(&config.logging.to_log_config(), config.metrics.enabled)
        .context("failed to initialize telemetry")?;

    tracing::info!(
        version = VERSION,
        addr = %config.server.http_addr,
        metrics = config.metrics.enabled,
        "starting scoring server"
    );

    let server = build_server(&config).context("failed to build method registry")?;
    server.run().await.context("server error")?;
    Ok(())
}
