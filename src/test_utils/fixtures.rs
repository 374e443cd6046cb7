//! On-disk module fixtures.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

/// Render an AMD module declaring `define` and, optionally, `require` dependencies.
pub fn amd_module(define: &[&str], require: &[&str]) -> String {
    let quote = |deps: &[&str]| {
        deps.iter().map(|d| format!("\"{d}\"")).collect::<Vec<_>>().join(", ")
    };
    let mut body = String::new();
    if !require.is_empty() {
        body = format!("\n    require([{}], function() {{}});\n", quote(require));
    }
    format!("define([{}], function() {{{}}});\n", quote(define), body)
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Set a file's modification time to `millis` after the epoch.
pub fn set_mtime(path: &Path, millis: u64) -> Result<()> {
    fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(UNIX_EPOCH + Duration::from_millis(millis)))
        .with_context(|| format!("Failed to set modification time of {}", path.display()))
}

/// Modification time of `path` in epoch milliseconds.
pub fn mtime(path: &Path) -> Result<i64> {
    crate::utils::fs::file_modified_millis(path)
}

/// Two locations, `p1` and `p2`, with nested modules and dangling dependencies.
///
/// ```text
/// p1/a.js        define ./b
/// p1/b.js        define ./c
/// p1/c.js        define ./a ./b ./noexist
/// p1/p1.js       define p1/a p2/p1/b p2/p1/p1/c p2/noexist
/// p2/a.js        define ./b
/// p2/b.js        define ./c
/// p2/p1/a.js     define ./b
/// p2/p1/p1.js    define ./c
/// p2/p1/p1/{a,b,c}.js   same as p1/{a,b,c}.js
/// p2/p1/p1/foo.js       define like p1/p1.js, require p2/a
/// ```
#[derive(Debug, Clone)]
pub struct ModuleFixture {
    /// Directory holding `p1` and `p2`.
    pub root: PathBuf,
}

impl ModuleFixture {
    /// `define` lists written by [`create`](Self::create), by relative module path.
    pub const DEFINES: &'static [(&'static str, &'static [&'static str])] = &[
        ("p1/a", &["./b"]),
        ("p1/b", &["./c"]),
        ("p1/c", &["./a", "./b", "./noexist"]),
        ("p1/p1", &["p1/a", "p2/p1/b", "p2/p1/p1/c", "p2/noexist"]),
        ("p2/a", &["./b"]),
        ("p2/b", &["./c"]),
        ("p2/p1/a", &["./b"]),
        ("p2/p1/p1", &["./c"]),
        ("p2/p1/p1/a", &["./b"]),
        ("p2/p1/p1/b", &["./c"]),
        ("p2/p1/p1/c", &["./a", "./b", "./noexist"]),
        ("p2/p1/p1/foo", &["p1/a", "p2/p1/b", "p2/p1/p1/c", "p2/noexist"]),
    ];

    /// Write the fixture under `root`.
    pub fn create(root: &Path) -> Result<Self> {
        for (module, define) in Self::DEFINES {
            let require: &[&str] = if *module == "p2/p1/p1/foo" { &["p2/a"] } else { &[] };
            write_file(root, &format!("{module}.js"), &amd_module(define, require))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Path of location `name` (`"p1"` or `"p2"`).
    pub fn location(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Path of the source file for `module`, e.g. `"p2/p1/a"`.
    pub fn file(&self, module: &str) -> PathBuf {
        self.root.join(format!("{module}.js"))
    }

    /// Write a `modgraph.toml` mapping `p1Alias` and `p2Alias` to the two locations,
    /// with the snapshot kept in `root/cache`.
    pub fn write_config(&self) -> Result<PathBuf> {
        write_file(
            &self.root,
            crate::config::DEFAULT_CONFIG_FILE,
            "cache_dir = \"cache\"\n\n[paths]\np1Alias = \"p1\"\np2Alias = \"p2\"\n",
        )
    }
}
