//! `modgraph build`: refresh the dependency snapshot.

use crate::config::AggregatorConfig;
use crate::deps::{AmdParser, BuildOptions, BuildReport, DependencyTree, LocationAction};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

/// Scan the configured locations and persist the result.
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Ignore the snapshot and re-parse every file
    #[arg(long)]
    clean: bool,

    /// Trust the snapshot for locations it already covers
    #[arg(long, conflicts_with = "clean")]
    no_validate: bool,
}

impl BuildCommand {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            clean: self.clean,
            validate_deps: !self.no_validate,
        }
    }

    /// Run the build for `config`.
    pub async fn execute(self, config: &AggregatorConfig) -> Result<()> {
        let options = self.options();
        let tree = DependencyTree::new(config.tree_settings()?, Arc::new(AmdParser::new()?));
        if !options.clean && !tree.load_snapshot().await? {
            tracing::info!("No usable dependency snapshot; building from source");
        }

        let report = tree.build(options).await?;
        print_report(&report, &tree);
        Ok(())
    }
}

fn print_report(report: &BuildReport, tree: &DependencyTree) {
    for (location, result) in &report.locations {
        let action = match result.action {
            LocationAction::Scanned => "scanned".green(),
            LocationAction::Validated => "validated".cyan(),
            LocationAction::Kept => "kept".bright_black(),
        };
        let modules = tree.location(location).map_or(0, |t| t.file_count());
        println!("{:>10} {} ({} modules)", action, location.display(), modules);

        let stats = result.stats;
        if result.action != LocationAction::Kept {
            let mut detail = format!("{} parsed, {} reused", stats.parsed, stats.reused);
            if stats.failed > 0 {
                detail.push_str(&format!(", {} unreadable", stats.failed));
            }
            println!("{:>10} {}", "", detail.bright_black());
        }
    }

    if report.persisted {
        println!("{} snapshot written", "✓".green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        let cmd = BuildCommand {
            clean: false,
            no_validate: false,
        };
        assert_eq!(cmd.options(), BuildOptions::validate());

        let cmd = BuildCommand {
            clean: true,
            no_validate: false,
        };
        assert!(cmd.options().clean);

        let cmd = BuildCommand {
            clean: false,
            no_validate: true,
        };
        assert_eq!(cmd.options(), BuildOptions::default());
    }
}
