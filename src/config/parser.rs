//! TOML file parsing with file-path context.

use crate::core::ModgraphError;
use anyhow::{Context, Result};
use std::path::Path;

/// Read and deserialize a TOML configuration file.
///
/// Read failures keep the I/O error as their cause. Syntax and shape errors are
/// reported as [`ModgraphError::ConfigParseError`] so the CLI can point at the file.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content).map_err(|e| ModgraphError::ConfigParseError {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(config)
}
