//! The `modgraph.toml` path configuration.
//!
//! ```toml
//! base_dir = "web"          # optional, relative to this file
//! cache_dir = ".modgraph"   # optional, relative to base_dir
//! extensions = ["js"]
//!
//! [paths]
//! p1 = "p1"
//! "dojo/nls" = "vendor/dojo/nls"
//! ```
//!
//! Every `[paths]` entry is both a location to scan and an alias under which the
//! location's modules are visible.

use crate::config::parser::parse_config;
use crate::core::ModgraphError;
use crate::deps::{SNAPSHOT_FILE, TreeSettings};
use crate::utils::fs::normalize_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "modgraph.toml";

fn default_extensions() -> Vec<String> {
    vec!["js".to_string()]
}

/// Path and alias configuration for a dependency tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Directory the `[paths]` entries are relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    /// Where the dependency snapshot is kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Source file extensions, with or without the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Alias name to location.
    #[serde(default)]
    pub paths: BTreeMap<String, PathBuf>,

    /// Directory containing the file this was loaded from.
    #[serde(skip)]
    origin: Option<PathBuf>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            cache_dir: None,
            extensions: default_extensions(),
            paths: BTreeMap::new(),
            origin: None,
        }
    }
}

/// Canonical form hashed into the signature.
#[derive(Serialize)]
struct SignatureInput<'a> {
    paths: &'a BTreeMap<String, PathBuf>,
    extensions: &'a [String],
}

impl AggregatorConfig {
    /// Load and validate `path`.
    ///
    /// Relative directories in the file are resolved against the file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: Self = parse_config(path)?;
        let absolute = std::path::absolute(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        config.origin = absolute.parent().map(Path::to_path_buf);
        config.validate()?;
        tracing::debug!(
            "Loaded {} with {} paths from {}",
            DEFAULT_CONFIG_FILE,
            config.paths.len(),
            path.display()
        );
        Ok(config)
    }

    /// Configuration rooted at `dir` without a backing file.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            origin: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Add or replace an alias.
    #[must_use]
    pub fn with_path(mut self, alias: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        self.paths.insert(alias.into(), location.into());
        self
    }

    /// Check aliases and extensions, normalizing extensions to have no leading dot.
    pub fn validate(&mut self) -> Result<(), ModgraphError> {
        for (alias, location) in &self.paths {
            if alias.split('/').all(|segment| segment.is_empty() || segment == ".") {
                return Err(ModgraphError::Configuration {
                    message: format!("Alias '{alias}' has no name segments"),
                });
            }
            if location.as_os_str().is_empty() {
                return Err(ModgraphError::Configuration {
                    message: format!("Alias '{alias}' has an empty location"),
                });
            }
        }

        let mut extensions = Vec::with_capacity(self.extensions.len());
        for ext in &self.extensions {
            let ext = ext.trim_start_matches('.');
            if ext.is_empty() {
                return Err(ModgraphError::Configuration {
                    message: "Empty entry in extensions".to_string(),
                });
            }
            if !extensions.iter().any(|e| e == ext) {
                extensions.push(ext.to_string());
            }
        }
        if extensions.is_empty() {
            return Err(ModgraphError::Configuration {
                message: "At least one source extension is required".to_string(),
            });
        }
        self.extensions = extensions;
        Ok(())
    }

    /// Directory `[paths]` are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        let origin = self.origin.clone().unwrap_or_else(|| PathBuf::from("."));
        match &self.base_dir {
            Some(base) => normalize_path(&origin.join(base)),
            None => normalize_path(&origin),
        }
    }

    /// Alias name to resolved location.
    pub fn aliases(&self) -> BTreeMap<String, PathBuf> {
        let base = self.base_dir();
        self.paths
            .iter()
            .map(|(alias, location)| (alias.clone(), normalize_path(&base.join(location))))
            .collect()
    }

    /// Distinct resolved locations.
    pub fn locations(&self) -> BTreeSet<PathBuf> {
        self.aliases().into_values().collect()
    }

    /// Stable digest of the resolved path configuration.
    ///
    /// Key order does not matter. Adding, removing or re-pointing an alias, or changing
    /// the extensions, changes the signature.
    pub fn signature(&self) -> String {
        use sha2::{Digest, Sha256};

        let aliases = self.aliases();
        let mut extensions = self.extensions.clone();
        extensions.sort();
        let input = SignatureInput {
            paths: &aliases,
            extensions: &extensions,
        };

        let mut hasher = Sha256::new();
        match serde_json::to_value(&input).and_then(|v| serde_json::to_string(&v)) {
            Ok(json) => hasher.update(json.as_bytes()),
            Err(e) => {
                tracing::warn!("Failed to serialize path configuration for hashing: {}", e);
                for (alias, location) in &aliases {
                    hasher.update(alias.as_bytes());
                    hasher.update(b"=");
                    hasher.update(location.to_string_lossy().as_bytes());
                    hasher.update(b"\n");
                }
                hasher.update(extensions.join(",").as_bytes());
            }
        }
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    /// Directory holding the dependency snapshot.
    ///
    /// Without `cache_dir`, a per-project directory under the user cache directory is
    /// used so unrelated projects never share a snapshot.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(normalize_path(&self.base_dir().join(dir)));
        }

        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(self.base_dir().to_string_lossy().as_bytes());
        let project = hex::encode(&digest[..8]);
        let dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine user cache directory"))?
            .join("modgraph")
            .join(project);
        Ok(dir)
    }

    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(SNAPSHOT_FILE))
    }

    /// Dependency tree settings derived from this configuration.
    pub fn tree_settings(&self) -> Result<TreeSettings> {
        Ok(TreeSettings::new(self.locations(), self.signature())
            .with_snapshot(self.snapshot_path()?)
            .with_extensions(self.extensions.iter().cloned()))
    }
}
