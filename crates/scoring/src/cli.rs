//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use scoring_config::{ConfigError, ConfigLoader, ScoringConfig, DEFAULT_ENV_PREFIX};

/// Scoring API server.
#[derive(Parser, Debug, Default)]
#[command(name = "scoring", version, about = "Scoring API server")]
pub struct Cli {
    /// Port to listen on; replaces the port of `server.http_addr`.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// IP address to listen on; replaces the host of `server.http_addr`.
    #[arg(long)]
    pub host: Option<String>,

    /// Append logs to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Configuration file (TOML or JSON).
    #[arg(short, long, value_name = "PATH", env = "SCORING_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Loads configuration: file, then `SCORING__*` variables, then flags.
    pub fn load_config(&self) -> Result<ScoringConfig, ConfigError> {
        let mut loader = ConfigLoader::new().with_dotenv();
        if let Some(path) = &self.config {
            loader = loader.with_file(path)?;
        }

        let mut config = loader.with_env_prefix(DEFAULT_ENV_PREFIX).load()?;
        self.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies flag overrides.
    pub fn apply(&self, config: &mut ScoringConfig) -> Result<(), ConfigError> {
        if let Some(host) = &self.host {
            config.server.set_host(host)?;
        }
        if let Some(port) = self.port {
            config.server.set_port(port)?;
        }
        if let Some(log) = &self.log {
            config.logging.file = Some(log.clone());
        }
        Ok(())
    }
}
