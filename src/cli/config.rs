//! `modgraph config`: print the resolved configuration.

use crate::cli::CliConfig;
use crate::config::AggregatorConfig;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Read-only dump of the active configuration.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Output JSON instead of text
    #[arg(long)]
    json: bool,
}

impl ConfigCommand {
    /// Print `config` as loaded from `cli.config_path`.
    pub fn execute(self, cli: &CliConfig, config: &AggregatorConfig) -> Result<()> {
        let aliases = config.aliases();
        let snapshot = config.snapshot_path()?;

        if self.json {
            let paths: serde_json::Map<String, serde_json::Value> = aliases
                .iter()
                .map(|(alias, location)| {
                    (
                        alias.clone(),
                        serde_json::json!({
                            "location": location,
                            "exists": location.is_dir(),
                        }),
                    )
                })
                .collect();
            let json = serde_json::json!({
                "file": cli.config_path,
                "baseDir": config.base_dir(),
                "snapshot": snapshot,
                "extensions": config.extensions,
                "signature": config.signature(),
                "paths": paths,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(());
        }

        println!("{:<11} {}", "file:".bold(), cli.config_path.display());
        println!("{:<11} {}", "base dir:".bold(), config.base_dir().display());
        println!("{:<11} {}", "snapshot:".bold(), snapshot.display());
        println!("{:<11} {}", "extensions:".bold(), config.extensions.join(", "));
        println!("{:<11} {}", "signature:".bold(), config.signature().bright_black());

        if aliases.is_empty() {
            println!("{}", "No paths configured.".yellow());
            return Ok(());
        }
        println!("{}", "paths:".bold());
        for (alias, location) in &aliases {
            let marker = if location.is_dir() { "".normal() } else { " (missing)".yellow() };
            println!("  {} -> {}{}", alias.cyan(), location.display(), marker);
        }
        Ok(())
    }
}
