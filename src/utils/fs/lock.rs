//! Exclusive file locks shared between processes.
//!
//! Several server processes may point at the same cache directory. A snapshot is only
//! read or rewritten while holding an exclusive lock on a sibling `.lock` file, so one
//! process never observes another's half-finished rename sequence. The lock is released
//! when the [`FileLock`] is dropped.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// An exclusive advisory lock held on a file.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Lock file used to guard `target` (`<target>.lock`).
    pub fn lock_path_for(target: &Path) -> PathBuf {
        let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        target.with_file_name(name)
    }

    /// Acquire an exclusive lock guarding `target`, blocking until it is available.
    ///
    /// The parent directory is created if needed. There is no timeout; callers on an
    /// async runtime run this inside `spawn_blocking`.
    pub fn acquire(target: &Path) -> Result<Self> {
        let lock_path = Self::lock_path_for(target);
        super::dirs::ensure_parent_dir(&lock_path)?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire lock: {}", lock_path.display()))?;

        tracing::trace!("Acquired lock {}", lock_path.display());
        Ok(Self {
            file,
            path: lock_path,
        })
    }

    /// Path of the lock file itself.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[allow(unstable_name_collisions)]
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_for() {
        assert_eq!(
            FileLock::lock_path_for(Path::new("/c/depmap.json")),
            PathBuf::from("/c/depmap.json.lock")
        );
    }

    #[test]
    fn test_lock_acquire_and_release() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("sub/depmap.json");

        let lock = FileLock::acquire(&target).unwrap();
        assert!(lock.path().exists());
        drop(lock);

        // Re-acquiring after drop must not block
        let _again = FileLock::acquire(&target).unwrap();
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("depmap.json");

        let first = FileLock::acquire(&target).unwrap();
        let acquired = Arc::new(AtomicBool::new(false));

        let flag = acquired.clone();
        let target_clone = target.clone();
        let waiter = tokio::task::spawn_blocking(move || {
            let _second = FileLock::acquire(&target_clone).unwrap();
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!acquired.load(Ordering::SeqCst));

        drop(first);
        waiter.await.unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }
}
