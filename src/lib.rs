//! modgraph - incremental module dependency tracking
//!
//! modgraph keeps an up-to-date picture of which source modules exist under a set of
//! locations and what each one declares as dependencies, and derives the cache keys
//! under which built bundles of those modules can be reused.
//!
//! # Architecture Overview
//!
//! - A TOML file lists the source locations and the alias each is visible under
//! - Each location is walked once and mirrored into a node tree; every source file's
//!   `define`/`require` dependencies are recorded with its modification time
//! - The trees are persisted as a single snapshot, tagged with a signature of the path
//!   configuration. Later runs only re-parse files whose timestamp moved, and discard
//!   the snapshot outright when the configuration changed
//! - Request-scoped views mount the location trees under their aliases without copying
//! - Cache key generators from independent build dimensions combine into one minimal
//!   key per artifact
//!
//! # Core Modules
//!
//! - [`deps`] - node trees, discovery, snapshots, and alias views
//! - [`cachekey`] - cache key generators and their combination rules
//! - [`config`] - `modgraph.toml` loading and signatures
//! - [`core`] - error types and user-facing error rendering
//! - [`cli`] - the `modgraph` command
//! - [`utils`] - atomic writes, file locks, and path helpers
//!
//! # Configuration (modgraph.toml)
//!
//! ```toml
//! extensions = ["js"]
//!
//! [paths]
//! p1Alias = "p1"
//! p2Alias = "p2"
//! ```
//!
//! # Logging
//!
//! Library code logs through `tracing`. The binary installs a subscriber controlled by
//! `--verbose`, `--quiet` or `RUST_LOG`.

pub mod cachekey;
pub mod cli;
pub mod config;
pub mod core;
pub mod deps;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
