//! Cross-cutting utilities.
//!
//! Currently only filesystem helpers; see [`fs`].

pub mod fs;

pub use fs::{atomic_write, ensure_dir, normalize_path};
