//! File modification times.
//!
//! The dependency tree records timestamps as milliseconds since the Unix epoch so they
//! serialize compactly and compare exactly after a snapshot round trip.

use anyhow::{Context, Result};
use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Convert a [`SystemTime`] to epoch milliseconds. Times before the epoch are negative.
pub fn system_time_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}

/// Modification time from already-fetched metadata, in epoch milliseconds.
pub fn modified_millis(metadata: &Metadata) -> Result<i64> {
    let modified = metadata.modified().context("Failed to get modification time")?;
    Ok(system_time_millis(modified))
}

/// Modification time of `path`, in epoch milliseconds.
///
/// # Errors
/// Returns an error if the file metadata cannot be read
pub fn file_modified_millis(path: &Path) -> Result<i64> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;
    modified_millis(&metadata)
        .with_context(|| format!("Failed to get modification time for: {}", path.display()))
}
