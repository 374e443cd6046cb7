//! Core types for modgraph
//!
//! Currently this is the error layer shared by the dependency tree, the path mapper and
//! the cache key algebra:
//! - [`ModgraphError`] - Enumerated error types
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any [`anyhow::Error`] to an [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, ModgraphError, user_friendly_error};
