//! Module dependency data.
//!
//! This module maintains, per source location, a tree of [`DependencyNode`]s mirroring
//! the directory structure, where each file-backed node records the dependencies its
//! module declares. The data is built incrementally: a persisted [`Snapshot`] is reused
//! as long as the path configuration is unchanged, and validation only re-parses files
//! whose modification time moved.
//!
//! # Layout
//!
//! - [`node`]: the arena-backed [`NodeTree`] and its read-only [`NodeRef`] views
//! - [`parser`]: the [`DependencyParser`] trait and the bundled [`AmdParser`]
//! - [`walk`]: filesystem discovery for one location
//! - [`snapshot`]: on-disk persistence
//! - [`tree`]: the [`DependencyTree`] coordinating builds across locations
//! - [`root`]: [`TreeRoot`], which mounts location trees under module-id aliases
//!
//! # Example
//!
//! ```rust,no_run
//! use modgraph::deps::{AmdParser, BuildOptions, DependencyTree, TreeRoot, TreeSettings};
//! use std::collections::BTreeMap;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = TreeSettings::new(["/srv/web/p1"], "sha256:0");
//! let tree = DependencyTree::open(settings, Arc::new(AmdParser::new()?), BuildOptions::validate()).await?;
//!
//! let mut root = TreeRoot::new();
//! let aliases = BTreeMap::from([("p1".to_string(), PathBuf::from("/srv/web/p1"))]);
//! tree.map_dependencies(&mut root, &aliases, true)?;
//!
//! let a = root.resolve("p1/a").expect("module exists");
//! println!("{:?}", a.define_deps());
//! # Ok(())
//! # }
//! ```
//!
//! Specifiers are resolved against the module that declares them:
//!
//! ```rust
//! use modgraph::deps::resolve_specifier;
//!
//! assert_eq!(resolve_specifier("p1/a", "./b"), "p1/b");
//! assert_eq!(resolve_specifier("p2/p1/a", "../b"), "p2/b");
//! assert_eq!(resolve_specifier("p1/a", "p2/c"), "p2/c");
//! ```

pub mod node;
pub mod parser;
pub mod root;
pub mod snapshot;
pub mod tree;
pub mod walk;

pub use node::{DependencyNode, ModuleDeps, NodeId, NodeRef, NodeTree, SEPARATOR};
pub use parser::{AmdParser, DependencyParser};
pub use root::{Dangling, Expansion, TreeRoot, ViewNode, resolve_specifier};
pub use snapshot::{SNAPSHOT_FILE, SNAPSHOT_VERSION, Snapshot};
pub use tree::{
    BuildOptions, BuildReport, DependencyTree, LocationAction, LocationReport, TreeSettings,
};
pub use walk::{ScanStats, scan_location};
