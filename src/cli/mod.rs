//! Command-line interface for modgraph.
//!
//! # Commands
//!
//! - `build` - scan the configured locations and refresh the dependency snapshot
//! - `show` - print the aliased module tree, or one module's dependencies
//! - `config` - print the resolved configuration and its signature
//!
//! # Global Options
//!
//! - `--config <PATH>` - configuration file (default `modgraph.toml`, or
//!   `MODGRAPH_CONFIG`)
//! - `--verbose` - debug logging
//! - `--quiet` - errors only
//!
//! Without either flag, `RUST_LOG` controls logging and defaults to warnings.
//!
//! ```bash
//! modgraph build --clean
//! modgraph show p1Alias/a --json
//! modgraph -v config
//! ```

mod build;
mod config;
mod show;

use crate::config::{AggregatorConfig, DEFAULT_CONFIG_FILE};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use build::BuildCommand;
pub use config::ConfigCommand;
pub use show::ShowCommand;

/// Settings resolved from global flags before a command runs.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit log filter; `None` defers to `RUST_LOG`.
    pub log_level: Option<String>,

    /// Configuration file to load.
    pub config_path: PathBuf,
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Later calls are no-ops.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the configuration file.
    pub fn load(&self) -> Result<AggregatorConfig> {
        if !self.config_path.exists() {
            return Err(crate::core::ModgraphError::Configuration {
                message: format!("Configuration file not found: {}", self.config_path.display()),
            }
            .into());
        }
        AggregatorConfig::load(&self.config_path).with_context(|| {
            format!("Failed to load configuration from {}", self.config_path.display())
        })
    }
}

/// Inspect and maintain module dependency data.
#[derive(Parser, Debug)]
#[command(name = "modgraph", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "MODGRAPH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan locations and refresh the dependency snapshot
    Build(BuildCommand),

    /// Show the aliased module tree or a single module
    Show(ShowCommand),

    /// Print the resolved configuration
    Config(ConfigCommand),
}

impl Cli {
    /// Resolve global flags, set up logging and run the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Global flags as a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    /// Run the selected command with already-resolved settings.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let aggregator = config.load()?;
        match self.command {
            Commands::Build(cmd) => cmd.execute(&aggregator).await,
            Commands::Show(cmd) => cmd.execute(&aggregator).await,
            Commands::Config(cmd) => cmd.execute(&config, &aggregator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_flags() {
        let cli = Cli::parse_from(["modgraph", "-v", "build"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

        let cli = Cli::parse_from(["modgraph", "build", "--quiet"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("error"));

        let cli = Cli::parse_from(["modgraph", "config"]);
        assert_eq!(cli.build_config().log_level, None);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["modgraph", "-v", "-q", "build"]).is_err());
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["modgraph", "--config", "other.toml", "show"]);
        assert_eq!(cli.build_config().config_path, PathBuf::from("other.toml"));
    }

    #[test]
    fn test_missing_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = CliConfig {
            log_level: None,
            config_path: temp.path().join(DEFAULT_CONFIG_FILE),
        };
        let err = config.load().unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }
}
