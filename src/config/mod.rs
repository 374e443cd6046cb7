//! Configuration loading.
//!
//! A project is described by one TOML file, [`DEFAULT_CONFIG_FILE`] by default, which
//! lists the source locations and the alias each one is visible under. The resolved
//! configuration yields everything a [`DependencyTree`](crate::deps::DependencyTree)
//! needs: the locations to scan, the alias map used for views, and a signature that
//! invalidates the persisted snapshot whenever the path layout changes.

pub mod aggregator;
pub mod parser;

pub use aggregator::{AggregatorConfig, DEFAULT_CONFIG_FILE};
pub use parser::parse_config;
