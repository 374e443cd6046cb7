//! Error handling for modgraph
//!
//! This module provides the strongly-typed error enum used throughout the crate and a
//! small user-facing wrapper that pairs an error with an actionable suggestion.
//!
//! # Architecture
//!
//! - [`ModgraphError`] - Enumerated error types for every failure the library reports
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! Library code generally returns [`anyhow::Result`] at I/O boundaries and attaches
//! context with `.with_context(...)`. Failures a caller is expected to match on (a missing
//! alias target, a duplicate child name, a provisional-state conflict) are raised as
//! [`ModgraphError`] so they can be recovered with `downcast_ref`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use modgraph::core::{ModgraphError, user_friendly_error};
//!
//! let err = anyhow::Error::from(ModgraphError::MissingAlias {
//!     alias: "dojo".to_string(),
//!     location: "/srv/js/dojo".to_string(),
//! });
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for modgraph operations
///
/// # Error Categories
///
/// ## Configuration
/// - [`Configuration`] - Invalid or inconsistent configuration
/// - [`MissingAlias`] - An alias points at a location with no discovered subtree
/// - [`ConfigParseError`] - The configuration file is not valid TOML
///
/// ## Dependency tree
/// - [`DuplicateName`] - A sibling with the same name already exists
/// - [`NodeNotFound`] - A node id or path does not exist in a tree
/// - [`ParseError`] - The source parser rejected a file
/// - [`SnapshotError`] - The persisted snapshot could not be read or written
///
/// ## Cache keys
/// - [`ProvisionalConflict`] - Two provisional generators were combined
/// - [`KindMismatch`] - Generators of different kinds were combined
///
/// [`Configuration`]: ModgraphError::Configuration
/// [`MissingAlias`]: ModgraphError::MissingAlias
/// [`ConfigParseError`]: ModgraphError::ConfigParseError
/// [`DuplicateName`]: ModgraphError::DuplicateName
/// [`NodeNotFound`]: ModgraphError::NodeNotFound
/// [`ParseError`]: ModgraphError::ParseError
/// [`SnapshotError`]: ModgraphError::SnapshotError
/// [`ProvisionalConflict`]: ModgraphError::ProvisionalConflict
/// [`KindMismatch`]: ModgraphError::KindMismatch
#[derive(Error, Debug)]
pub enum ModgraphError {
    /// General configuration problem
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the problem
        message: String,
    },

    /// An alias maps to a location that has no entry in the dependency map
    #[error("Alias '{alias}' refers to unknown location: {location}")]
    MissingAlias {
        /// The alias name from the path configuration
        alias: String,
        /// The location the alias points at
        location: String,
    },

    /// The configuration file could not be parsed
    #[error("Invalid configuration syntax in {file}")]
    ConfigParseError {
        /// Path to the configuration file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A child with the same name is already attached to the parent
    #[error("Node '{parent}' already has a child named '{name}'")]
    DuplicateName {
        /// Name of the parent node
        parent: String,
        /// The conflicting child name
        name: String,
    },

    /// A node lookup failed where the caller required the node to exist
    #[error("Node not found: {path}")]
    NodeNotFound {
        /// The requested path or id
        path: String,
    },

    /// The source parser could not extract dependencies
    #[error("Failed to parse dependencies in {path}: {reason}")]
    ParseError {
        /// The file that failed to parse
        path: String,
        /// Parser message
        reason: String,
    },

    /// The dependency snapshot could not be read or written
    #[error("Dependency snapshot error in {path}: {reason}")]
    SnapshotError {
        /// Snapshot file path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Two provisional cache key generators were combined
    #[error("Cannot combine two provisional '{kind}' cache key generators")]
    ProvisionalConflict {
        /// Kind of the offending generators
        kind: String,
    },

    /// Two cache key generators of different kinds were combined
    #[error("Cannot combine cache key generator '{left}' with '{right}'")]
    KindMismatch {
        /// Kind of the left-hand generator
        left: String,
        /// Kind of the right-hand generator
        right: String,
    },

    /// IO error from the standard library
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for ModgraphError {
    fn clone(&self) -> Self {
        match self {
            Self::Configuration {
                message,
            } => Self::Configuration {
                message: message.clone(),
            },
            Self::MissingAlias {
                alias,
                location,
            } => Self::MissingAlias {
                alias: alias.clone(),
                location: location.clone(),
            },
            Self::ConfigParseError {
                file,
                reason,
            } => Self::ConfigParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::DuplicateName {
                parent,
                name,
            } => Self::DuplicateName {
                parent: parent.clone(),
                name: name.clone(),
            },
            Self::NodeNotFound {
                path,
            } => Self::NodeNotFound {
                path: path.clone(),
            },
            Self::ParseError {
                path,
                reason,
            } => Self::ParseError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::SnapshotError {
                path,
                reason,
            } => Self::SnapshotError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ProvisionalConflict {
                kind,
            } => Self::ProvisionalConflict {
                kind: kind.clone(),
            },
            Self::KindMismatch {
                left,
                right,
            } => Self::KindMismatch {
                left: left.clone(),
                right: right.clone(),
            },
            // io::Error is not Clone; keep the kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper carrying a suggestion and details for CLI display
///
/// # Examples
///
/// ```rust,no_run
/// use modgraph::core::{ErrorContext, ModgraphError};
///
/// let context = ErrorContext::new(ModgraphError::Configuration {
///     message: "no paths configured".to_string(),
/// })
/// .with_suggestion("Add a [paths] table to modgraph.toml");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ModgraphError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details
    #[must_use]
    pub const fn new(error: ModgraphError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion for resolving the error
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional details
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`]
///
/// Known [`ModgraphError`] variants get tailored suggestions. Other errors keep
/// their full `anyhow` context chain as the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(mg_error) = error.downcast_ref::<ModgraphError>() {
        return create_error_context(mg_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ModgraphError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check ownership and permissions of the source and cache directories");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ModgraphError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    ErrorContext::new(ModgraphError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: ModgraphError) -> ErrorContext {
    match &error {
        ModgraphError::MissingAlias {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the [paths] table; every alias must point at a scanned location")
            .with_details("Run 'modgraph build' after adding a location so it is discovered"),
        ModgraphError::ConfigParseError {
            reason,
            ..
        } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_details(reason)
                .with_suggestion("Fix the TOML syntax in the configuration file")
        }
        ModgraphError::SnapshotError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'modgraph build --clean' to regenerate the snapshot"),
        ModgraphError::ProvisionalConflict {
            ..
        } => ErrorContext::new(error)
            .with_details("A provisional generator must be finalized before it meets another one"),
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ModgraphError::MissingAlias {
            alias: "p3Alias".to_string(),
            location: "/tmp/p3".to_string(),
        };
        assert_eq!(error.to_string(), "Alias 'p3Alias' refers to unknown location: /tmp/p3");

        let error = ModgraphError::DuplicateName {
            parent: "p1".to_string(),
            name: "a".to_string(),
        };
        assert_eq!(error.to_string(), "Node 'p1' already has a child named 'a'");
    }

    #[test]
    fn test_clone_preserves_io_kind() {
        let error = ModgraphError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        match error.clone() {
            ModgraphError::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected clone: {other:?}"),
        }
    }

    #[test]
    fn test_user_friendly_error_downcasts() {
        let err = anyhow::Error::from(ModgraphError::MissingAlias {
            alias: "x".to_string(),
            location: "/y".to_string(),
        });
        let ctx = user_friendly_error(err);
        assert!(matches!(ctx.error, ModgraphError::MissingAlias { .. }));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_keeps_context_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        let ctx = user_friendly_error(err);
        assert_eq!(ctx.to_string(), "outer: inner");
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(ModgraphError::Other {
            message: "boom".to_string(),
        })
        .with_details("d")
        .with_suggestion("s");
        assert_eq!(ctx.to_string(), "boom\nDetails: d\nSuggestion: s");
    }
}
