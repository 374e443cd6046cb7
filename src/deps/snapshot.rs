//! Persisted dependency map.
//!
//! The snapshot is one versioned JSON record holding the configuration signature it was
//! built under and every location's node tree. Invalidation is a single comparison: if
//! the version or signature differs from the caller's, the whole record is discarded.
//!
//! A snapshot that is missing, unreadable, corrupt or from another format version is
//! reported as absent so the caller falls back to a cold build. Only failure to take
//! the file lock is an error.

use crate::core::ModgraphError;
use crate::deps::node::NodeTree;
use crate::utils::fs::{FileLock, atomic_write};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Snapshot format version. Bump when [`Snapshot`] or [`NodeTree`] change shape.
pub const SNAPSHOT_VERSION: u32 = 1;

/// File name of the snapshot inside the cache directory.
pub const SNAPSHOT_FILE: &str = "depmap.json";

/// Serialized form of a dependency tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version, compared against [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// Configuration signature active when the snapshot was written.
    pub config_signature: String,
    /// Node tree per location.
    pub locations: BTreeMap<PathBuf, NodeTree>,
}

impl Snapshot {
    /// Build a current-version snapshot.
    pub fn new(config_signature: impl Into<String>, locations: BTreeMap<PathBuf, NodeTree>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            config_signature: config_signature.into(),
            locations,
        }
    }

    /// True if this snapshot may be reused under `signature`.
    pub fn is_valid_for(&self, signature: &str) -> bool {
        self.version == SNAPSHOT_VERSION && self.config_signature == signature
    }

    /// Read a snapshot from `path`.
    ///
    /// Returns `Ok(None)` when there is nothing usable on disk.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let _lock = FileLock::acquire(path)?;

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to read dependency snapshot {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        let snapshot: Self = match serde_json::from_slice(&data) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Discarding corrupt dependency snapshot {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        if snapshot.version != SNAPSHOT_VERSION {
            tracing::info!(
                "Discarding dependency snapshot {} with format version {} (expected {})",
                path.display(),
                snapshot.version,
                SNAPSHOT_VERSION
            );
            return Ok(None);
        }

        for (location, tree) in &snapshot.locations {
            if let Err(e) = tree.check_integrity() {
                tracing::warn!(
                    "Discarding dependency snapshot {}: {} ({})",
                    path.display(),
                    e,
                    location.display()
                );
                return Ok(None);
            }
        }

        Ok(Some(snapshot))
    }

    /// Write the snapshot to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec(self).map_err(|e| ModgraphError::SnapshotError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let _lock = FileLock::acquire(path)?;
        atomic_write(path, &data)
            .with_context(|| format!("Failed to write dependency snapshot {}", path.display()))?;

        tracing::debug!(
            "Wrote dependency snapshot {} ({} locations, {} bytes)",
            path.display(),
            self.locations.len(),
            data.len()
        );
        Ok(())
    }
}
