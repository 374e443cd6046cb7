//! Filesystem helpers used by discovery and snapshot persistence.
//!
//! - [`atomic`] - temp-file-and-rename writes so a snapshot is never half written
//! - [`dirs`] - directory creation
//! - [`lock`] - exclusive advisory file locks shared between processes
//! - [`metadata`] - modification times as epoch milliseconds
//! - [`paths`] - lexical path normalization

pub mod atomic;
pub mod dirs;
pub mod lock;
pub mod metadata;
pub mod paths;

pub use atomic::atomic_write;
pub use dirs::{ensure_dir, ensure_parent_dir};
pub use lock::FileLock;
pub use metadata::{file_modified_millis, modified_millis};
pub use paths::normalize_path;
