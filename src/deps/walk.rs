//! Filesystem discovery for one location.
//!
//! [`scan_location`] mirrors a location's directory structure into a fresh
//! [`NodeTree`]. When a previous tree for the same location is supplied, files whose
//! modification time still matches the recorded `last_modified` reuse the recorded
//! dependency data instead of being re-parsed. Nodes that no longer exist on disk are
//! simply not carried over, and new files are picked up by the walk itself.
//!
//! A cold build and a validation pass are the same walk; the only difference is
//! whether a previous tree is available to reuse from.

use crate::deps::node::{NodeId, NodeTree, SEPARATOR};
use crate::deps::parser::DependencyParser;
use crate::utils::fs::modified_millis;
use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Counters reported by a location scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Source files found on disk.
    pub files: usize,
    /// Files whose dependencies were (re)derived by the parser.
    pub parsed: usize,
    /// Files whose cached dependency data was reused.
    pub reused: usize,
    /// Directories found on disk, the location itself excluded.
    pub directories: usize,
    /// Files that could not be read or parsed; recorded with no dependencies.
    pub failed: usize,
}

/// Module name for `file_name` if its extension is one of `extensions`.
///
/// Extensions are given without the leading dot. Stems that cannot be addressed as a
/// path segment (`""`, `.` and `..`) are not modules.
pub fn module_name<'a>(file_name: &'a str, extensions: &[String]) -> Option<&'a str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if matches!(stem, "" | "." | "..") || !extensions.iter().any(|e| e == ext) {
        return None;
    }
    Some(stem)
}

/// Name used for a location's root node.
pub fn location_root_name(location: &Path) -> String {
    location
        .file_name()
        .map_or_else(|| location.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Walk `location` and build its node tree.
///
/// `previous` is the tree recorded for this location earlier, if any; pass `None` to
/// re-derive every file from source. A missing location directory yields a tree with
/// only its root node.
pub fn scan_location(
    location: &Path,
    previous: Option<&NodeTree>,
    parser: &dyn DependencyParser,
    extensions: &[String],
) -> Result<(NodeTree, ScanStats)> {
    let mut tree = NodeTree::new(location_root_name(location));
    let mut stats = ScanStats::default();

    if !location.is_dir() {
        tracing::warn!("Location does not exist or is not a directory: {}", location.display());
        return Ok((tree, stats));
    }

    let walker = WalkDir::new(location).min_depth(1).follow_links(true).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", location.display(), e);
                continue;
            }
        };

        let relative = entry
            .path()
            .strip_prefix(location)
            .with_context(|| format!("Walked outside of {}", location.display()))?;
        let mut segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        if entry.file_type().is_dir() {
            tree.ensure_path(NodeId::ROOT, segments.iter().map(String::as_str))?;
            stats.directories += 1;
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = segments.pop() else {
            continue;
        };
        let Some(name) = module_name(&file_name, extensions) else {
            continue;
        };
        segments.push(name.to_string());
        stats.files += 1;

        let id = tree.ensure_path(NodeId::ROOT, segments.iter().map(String::as_str))?;
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to read metadata for {}", entry.path().display()))?;
        let mtime = modified_millis(&metadata)
            .with_context(|| format!("Failed to read modification time of {}", entry.path().display()))?;

        let module_path = segments.join(&SEPARATOR.to_string());
        let cached = previous.and_then(|prev| prev.root().get(&module_path)).filter(|n| n.is_file());

        if let Some(node) = cached
            && node.last_modified() == Some(mtime)
        {
            let dep_time = node.last_modified_dep().unwrap_or(mtime);
            tree.set_dependencies(id, node.deps().clone(), mtime, dep_time)?;
            stats.reused += 1;
            continue;
        }

        let deps = match std::fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))
            .and_then(|content| parser.parse(entry.path(), &content))
        {
            Ok(deps) => deps,
            Err(e) => {
                tracing::warn!("Recording {} without dependencies: {:#}", entry.path().display(), e);
                stats.failed += 1;
                Default::default()
            }
        };

        // Unchanged dependency lists keep the time they were last derived differently
        let dep_time = match cached {
            Some(node) if node.deps() == &deps => node.last_modified_dep().unwrap_or(mtime),
            _ => mtime,
        };
        tracing::debug!("Parsed {} ({} define deps)", module_path, deps.define.len());
        tree.set_dependencies(id, deps, mtime, dep_time)?;
        stats.parsed += 1;
    }

    Ok((tree, stats))
}
