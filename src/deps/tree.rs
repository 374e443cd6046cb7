//! The incremental dependency tree.
//!
//! [`DependencyTree`] owns one [`NodeTree`] per configured location. Trees are
//! published into a [`DashMap`] as whole `Arc` values, so a reader holding a location's
//! tree keeps seeing that exact version while a rebuild prepares the next one off to the
//! side. Replacing the map entry is the only mutation readers can observe.
//!
//! # Build algorithm
//!
//! 1. [`DependencyTree::open`] loads the persisted [`Snapshot`] unless `clean` is set.
//! 2. A snapshot whose configuration signature differs from the current one is
//!    discarded as a whole.
//! 3. Locations without a tree (or every location, when `clean`) are walked and parsed.
//! 4. With `validate_deps`, locations that do have a tree are re-walked; files whose
//!    timestamp is unchanged keep their cached dependency data.
//! 5. The resulting map is written back as the new snapshot.
//!
//! Rebuilds on one instance are serialized. Within a rebuild, locations are scanned in
//! parallel on the blocking thread pool.

use crate::core::ModgraphError;
use crate::deps::node::NodeTree;
use crate::deps::parser::DependencyParser;
use crate::deps::root::TreeRoot;
use crate::deps::snapshot::Snapshot;
use crate::deps::walk::{ScanStats, scan_location};
use crate::utils::fs::normalize_path;
use anyhow::{Context, Result};
use dashmap::DashMap;
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Flags controlling a (re)build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Ignore the snapshot and re-derive every location from source.
    pub clean: bool,
    /// Re-walk locations that already have a tree and refresh changed files.
    pub validate_deps: bool,
}

impl BuildOptions {
    /// Reuse what is cached and only validate it.
    pub const fn validate() -> Self {
        Self {
            clean: false,
            validate_deps: true,
        }
    }

    /// Re-derive everything.
    pub const fn clean() -> Self {
        Self {
            clean: true,
            validate_deps: false,
        }
    }
}

/// Static inputs of a dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSettings {
    /// Top-level locations to scan.
    pub locations: BTreeSet<PathBuf>,
    /// Signature of the path configuration; a snapshot built under another one is
    /// discarded.
    pub config_signature: String,
    /// Where the snapshot lives. `None` keeps the tree in memory only.
    pub snapshot_path: Option<PathBuf>,
    /// Source file extensions, without the leading dot.
    pub extensions: Vec<String>,
}

impl TreeSettings {
    /// Settings for `locations` with the default `js` extension and no snapshot.
    pub fn new<I, P>(locations: I, config_signature: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            locations: locations.into_iter().map(|p| normalize_path(p.as_ref())).collect(),
            config_signature: config_signature.into(),
            snapshot_path: None,
            extensions: vec!["js".to_string()],
        }
    }

    /// Persist to `path`.
    #[must_use]
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Replace the source extensions.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// What a rebuild did with one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationAction {
    /// Walked and parsed from scratch.
    Scanned,
    /// Re-walked, reusing cached data for unchanged files.
    Validated,
    /// Cached tree kept as is.
    Kept,
}

/// Per-location outcome of a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationReport {
    /// What happened.
    pub action: LocationAction,
    /// Walk counters; all zero for [`LocationAction::Kept`].
    pub stats: ScanStats,
}

/// Outcome of [`DependencyTree::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Per-location results.
    pub locations: BTreeMap<PathBuf, LocationReport>,
    /// True if the snapshot was written.
    pub persisted: bool,
}

impl BuildReport {
    /// Total files (re)parsed across all locations.
    pub fn parsed(&self) -> usize {
        self.locations.values().map(|r| r.stats.parsed).sum()
    }

    /// Total files whose cached data was reused.
    pub fn reused(&self) -> usize {
        self.locations.values().map(|r| r.stats.reused).sum()
    }
}

/// Dependency data for every configured location.
pub struct DependencyTree {
    settings: TreeSettings,
    parser: Arc<dyn DependencyParser>,
    dep_map: Arc<DashMap<PathBuf, Arc<NodeTree>>>,
    rebuild_lock: Mutex<()>,
}

impl std::fmt::Debug for DependencyTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyTree")
            .field("settings", &self.settings)
            .field("locations", &self.locations())
            .finish_non_exhaustive()
    }
}

impl DependencyTree {
    /// An empty tree. Nothing is read until [`load_snapshot`](Self::load_snapshot) or
    /// [`build`](Self::build) is called.
    pub fn new(settings: TreeSettings, parser: Arc<dyn DependencyParser>) -> Self {
        Self {
            settings,
            parser,
            dep_map: Arc::new(DashMap::new()),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Construct a tree from its snapshot (unless `options.clean`) and run one build.
    pub async fn open(
        settings: TreeSettings,
        parser: Arc<dyn DependencyParser>,
        options: BuildOptions,
    ) -> Result<Self> {
        let tree = Self::new(settings, parser);
        if !options.clean {
            tree.load_snapshot().await?;
        }
        let report = tree.build(options).await?;
        tracing::info!(
            "Dependency tree ready: {} locations, {} files parsed, {} reused",
            report.locations.len(),
            report.parsed(),
            report.reused()
        );
        Ok(tree)
    }

    /// The settings this tree was created with.
    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    /// Replace the in-memory map with the persisted snapshot if it is still valid.
    ///
    /// Returns true if a snapshot was adopted. A snapshot built under another
    /// configuration signature is ignored entirely.
    pub async fn load_snapshot(&self) -> Result<bool> {
        let Some(path) = self.settings.snapshot_path.clone() else {
            return Ok(false);
        };
        let _guard = self.rebuild_lock.lock().await;

        let loaded = tokio::task::spawn_blocking(move || Snapshot::load(&path))
            .await
            .context("Failed to join snapshot load task")??;

        let Some(snapshot) = loaded else {
            return Ok(false);
        };
        if !snapshot.is_valid_for(&self.settings.config_signature) {
            tracing::info!("Configuration changed since the dependency snapshot was written; rebuilding");
            return Ok(false);
        }

        self.dep_map.clear();
        for (location, tree) in snapshot.locations {
            self.dep_map.insert(location, Arc::new(tree));
        }
        tracing::debug!("Loaded dependency snapshot with {} locations", self.dep_map.len());
        Ok(true)
    }

    /// Bring every location up to date and persist the result.
    ///
    /// Locations already in the map but not configured (restored from a snapshot or
    /// published directly) are handled like configured ones.
    pub async fn build(&self, options: BuildOptions) -> Result<BuildReport> {
        let _guard = self.rebuild_lock.lock().await;

        let mut targets = self.settings.locations.clone();
        targets.extend(self.dep_map.iter().map(|entry| entry.key().clone()));

        let mut report = BuildReport::default();
        let mut tasks = Vec::new();

        for location in targets {
            let previous = self.location(&location);
            let (action, previous) = match (options.clean, previous) {
                (true, _) | (false, None) => (LocationAction::Scanned, None),
                (false, Some(prev)) if options.validate_deps => (LocationAction::Validated, Some(prev)),
                (false, Some(_)) => {
                    report.locations.insert(
                        location,
                        LocationReport {
                            action: LocationAction::Kept,
                            stats: ScanStats::default(),
                        },
                    );
                    continue;
                }
            };

            let parser = Arc::clone(&self.parser);
            let dep_map = Arc::clone(&self.dep_map);
            let extensions = self.settings.extensions.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                let (tree, stats) =
                    scan_location(&location, previous.as_deref(), parser.as_ref(), &extensions)
                        .with_context(|| format!("Failed to scan location {}", location.display()))?;
                // Publish as soon as this location is done
                dep_map.insert(location.clone(), Arc::new(tree));
                Ok::<_, anyhow::Error>((location, action, stats))
            }));
        }

        let results = try_join_all(tasks).await.context("Failed to join location scan tasks")?;

        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok((location, action, stats)) => {
                    tracing::debug!(
                        "{:?} {}: {} files, {} parsed, {} reused",
                        action,
                        location.display(),
                        stats.files,
                        stats.parsed,
                        stats.reused
                    );
                    report.locations.insert(
                        location,
                        LocationReport {
                            action,
                            stats,
                        },
                    );
                }
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            let error_msgs: Vec<String> =
                errors.into_iter().map(|error| format!("  {error:#}")).collect();
            return Err(anyhow::anyhow!(
                "Failed to build {} locations:\n{}",
                error_msgs.len(),
                error_msgs.join("\n")
            ));
        }

        report.persisted = self.persist_locked().await?;
        Ok(report)
    }

    /// Write the current map to the snapshot file.
    ///
    /// Returns false if the tree has no snapshot path.
    pub async fn persist(&self) -> Result<bool> {
        let _guard = self.rebuild_lock.lock().await;
        self.persist_locked().await
    }

    async fn persist_locked(&self) -> Result<bool> {
        let Some(path) = self.settings.snapshot_path.clone() else {
            return Ok(false);
        };
        let snapshot = self.snapshot();
        tokio::task::spawn_blocking(move || snapshot.save(&path))
            .await
            .context("Failed to join snapshot save task")??;
        Ok(true)
    }

    /// Copy of the current map as a snapshot record.
    pub fn snapshot(&self) -> Snapshot {
        let locations = self
            .dep_map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().as_ref().clone()))
            .collect();
        Snapshot::new(self.settings.config_signature.clone(), locations)
    }

    /// The published tree for `location`.
    pub fn location(&self, location: &Path) -> Option<Arc<NodeTree>> {
        self.dep_map.get(&normalize_path(location)).map(|entry| Arc::clone(entry.value()))
    }

    /// Locations currently in the map, sorted.
    pub fn locations(&self) -> Vec<PathBuf> {
        let mut locations: Vec<PathBuf> = self.dep_map.iter().map(|e| e.key().clone()).collect();
        locations.sort();
        locations
    }

    /// Replace the tree for `location` in one step.
    pub fn publish(&self, location: &Path, tree: NodeTree) -> Option<Arc<NodeTree>> {
        self.dep_map.insert(normalize_path(location), Arc::new(tree))
    }

    /// Copy-on-write edit of one location's tree.
    ///
    /// The closure edits a private copy which is then published, so concurrent readers
    /// never see the edit half applied. Returns `None` if the location is unknown.
    pub fn update_location<R>(
        &self,
        location: &Path,
        edit: impl FnOnce(&mut NodeTree) -> R,
    ) -> Option<R> {
        let key = normalize_path(location);
        let current = self.location(&key)?;
        let mut copy = NodeTree::clone(&current);
        let result = edit(&mut copy);
        self.dep_map.insert(key, Arc::new(copy));
        Some(result)
    }

    /// Attach the tree of every alias target under `target`.
    ///
    /// Trees are shared, not copied. An alias whose location has no tree fails the call
    /// with [`ModgraphError::MissingAlias`] when `fail_on_missing` is set; aliases
    /// processed before it stay attached. Otherwise the alias is skipped and `target`
    /// simply has no child of that name.
    pub fn map_dependencies(
        &self,
        target: &mut TreeRoot,
        aliases: &BTreeMap<String, PathBuf>,
        fail_on_missing: bool,
    ) -> Result<(), ModgraphError> {
        for (alias, location) in aliases {
            match self.location(location) {
                Some(tree) => target.attach(alias, tree)?,
                None if fail_on_missing => {
                    return Err(ModgraphError::MissingAlias {
                        alias: alias.clone(),
                        location: location.display().to_string(),
                    });
                }
                None => {
                    tracing::debug!(
                        "Skipping alias '{}': no dependency data for {}",
                        alias,
                        location.display()
                    );
                }
            }
        }
        Ok(())
    }
}
