//! Lexical path normalization.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components without touching the
/// filesystem.
///
/// Location keys in the dependency map are normalized this way so that `root/./p1` and
/// `root/p2/../p1` address the same subtree.
///
/// ```rust
/// use modgraph::utils::fs::normalize_path;
/// use std::path::Path;
///
/// assert_eq!(normalize_path(Path::new("/srv/js/./p2/../p1")), Path::new("/srv/js/p1"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                } else if !matches!(components.last(), Some(Component::RootDir | Component::Prefix(_))) {
                    components.push(component);
                }
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("/x/../../y")), PathBuf::from("/y"));
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
    }
}
