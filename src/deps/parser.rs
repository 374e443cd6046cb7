//! Extraction of dependency specifiers from module source.
//!
//! The dependency tree treats parsing as a black box behind [`DependencyParser`]. The
//! bundled [`AmdParser`] recognizes the three call shapes an AMD module uses to declare
//! its dependencies:
//!
//! ```text
//! define(["./b", "dojo/has"], function (b, has) { ... });       -> define
//! define("name", ["./b"], function (b) { ... });                -> define
//! require(["./lazy"], function (lazy) { ... });                 -> require
//! var x = require("./sync");                                     -> object
//! ```
//!
//! A `define` whose dependency array is never closed is rejected with
//! [`ModgraphError::ParseError`] rather than guessed at.

use crate::core::ModgraphError;
use crate::deps::node::ModuleDeps;
use anyhow::Result;
use regex::Regex;
use std::path::Path;

/// Source parser consumed by the dependency tree.
///
/// Implementations must be pure functions of the file content; the tree relies on this
/// when it reuses cached results for files whose timestamp has not changed.
pub trait DependencyParser: Send + Sync {
    /// Extract the ordered dependency specifiers declared in `content`.
    ///
    /// `path` is provided for diagnostics only.
    fn parse(&self, path: &Path, content: &str) -> Result<ModuleDeps>;
}

/// Regex-based parser for AMD `define`/`require` calls.
#[derive(Debug, Clone)]
pub struct AmdParser {
    define: Regex,
    define_open: Regex,
    require_array: Regex,
    require_sync: Regex,
    string_literal: Regex,
    comment: Regex,
}

impl AmdParser {
    /// Compile the call-shape patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            define: Regex::new(r#"\bdefine\s*\(\s*(?:(?:"[^"]*"|'[^']*')\s*,\s*)?\[([^\]]*)\]"#)?,
            define_open: Regex::new(r#"\bdefine\s*\(\s*(?:(?:"[^"]*"|'[^']*')\s*,\s*)?\["#)?,
            require_array: Regex::new(r"\brequire\s*\(\s*\[([^\]]*)\]")?,
            require_sync: Regex::new(r#"\brequire\s*\(\s*(?:"([^"]+)"|'([^']+)')\s*\)"#)?,
            string_literal: Regex::new(r#""([^"]*)"|'([^']*)'"#)?,
            comment: Regex::new(r"(?s:/\*.*?\*/)|(?m:^[ \t]*//[^\n]*)")?,
        })
    }

    fn string_literals<'t>(&'t self, list: &'t str) -> impl Iterator<Item = String> + 't {
        self.string_literal.captures_iter(list).filter_map(|cap| {
            cap.get(1).or_else(|| cap.get(2)).map(|m| m.as_str().to_string())
        })
    }
}

fn push_unique(target: &mut Vec<String>, value: String) {
    if !target.contains(&value) {
        target.push(value);
    }
}

impl DependencyParser for AmdParser {
    fn parse(&self, path: &Path, content: &str) -> Result<ModuleDeps> {
        let source = self.comment.replace_all(content, "");
        let mut deps = ModuleDeps::default();

        match self.define.captures(&source).and_then(|cap| cap.get(1)) {
            Some(list) => deps.define = self.string_literals(list.as_str()).collect(),
            None if self.define_open.is_match(&source) => {
                return Err(ModgraphError::ParseError {
                    path: path.display().to_string(),
                    reason: "unterminated define dependency array".to_string(),
                }
                .into());
            }
            None => {}
        }

        for cap in self.require_array.captures_iter(&source) {
            if let Some(list) = cap.get(1) {
                for spec in self.string_literals(list.as_str()) {
                    push_unique(&mut deps.require, spec);
                }
            }
        }

        for cap in self.require_sync.captures_iter(&source) {
            if let Some(spec) = cap.get(1).or_else(|| cap.get(2)) {
                push_unique(&mut deps.object, spec.as_str().to_string());
            }
        }

        tracing::trace!(
            "Parsed {}: {} define, {} require, {} object",
            path.display(),
            deps.define.len(),
            deps.require.len(),
            deps.object.len()
        );
        Ok(deps)
    }
}
