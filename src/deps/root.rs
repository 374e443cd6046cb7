//! Request-scoped namespace views.
//!
//! A [`TreeRoot`] projects discovered location trees onto alias names. Attaching a tree
//! shares it (`Arc`), nothing is copied, so building a view per request configuration is
//! cheap and never touches the filesystem.
//!
//! Alias names may span several segments (`"dojo/nls"`). Missing intermediate segments
//! become virtual directories, and lookups walk the longest matching alias: with `p2` and
//! `p2/p1` both attached, `p2/p1/a` resolves inside the `p2/p1` tree while `p2/b` falls
//! back to the `p2` tree.

use crate::core::ModgraphError;
use crate::deps::node::{NodeRef, NodeTree, split_path};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct VirtualDir {
    children: BTreeMap<String, VirtualDir>,
    mount: Option<Arc<NodeTree>>,
}

impl VirtualDir {
    fn is_vacant(&self) -> bool {
        self.mount.is_none() && self.children.is_empty()
    }
}

/// Root of an aliased namespace view. Its own name is always empty.
#[derive(Debug, Clone, Default)]
pub struct TreeRoot {
    root: VirtualDir,
}

impl TreeRoot {
    /// An empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// The root's name: always `""`.
    pub fn name(&self) -> &str {
        ""
    }

    /// Attach `tree` at `alias`, replacing whatever was attached there before.
    ///
    /// # Errors
    ///
    /// [`ModgraphError::Configuration`] if `alias` has no path segments.
    pub fn attach(&mut self, alias: &str, tree: Arc<NodeTree>) -> Result<(), ModgraphError> {
        let mut dir = &mut self.root;
        let mut segments = split_path(alias).peekable();
        if segments.peek().is_none() {
            return Err(ModgraphError::Configuration {
                message: format!("Alias name '{alias}' is empty"),
            });
        }
        for segment in segments {
            dir = dir.children.entry(segment.to_string()).or_default();
        }
        dir.mount = Some(tree);
        Ok(())
    }

    /// Remove the tree attached at `alias`, returning it.
    pub fn detach(&mut self, alias: &str) -> Option<Arc<NodeTree>> {
        fn detach_in<'s>(
            dir: &mut VirtualDir,
            mut segments: impl Iterator<Item = &'s str>,
        ) -> Option<Arc<NodeTree>> {
            match segments.next() {
                None => dir.mount.take(),
                Some(segment) => {
                    let child = dir.children.get_mut(segment)?;
                    let removed = detach_in(child, segments);
                    if child.is_vacant() {
                        dir.children.remove(segment);
                    }
                    removed
                }
            }
        }
        detach_in(&mut self.root, split_path(alias))
    }

    /// Alias paths that currently have a tree attached, sorted.
    pub fn aliases(&self) -> Vec<String> {
        fn collect(dir: &VirtualDir, prefix: &str, out: &mut Vec<String>) {
            for (name, child) in &dir.children {
                let path =
                    if prefix.is_empty() { name.clone() } else { format!("{prefix}/{name}") };
                if child.mount.is_some() {
                    out.push(path.clone());
                }
                collect(child, &path, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.root, "", &mut out);
        out
    }

    /// View of the root.
    pub fn view(&self) -> ViewNode<'_> {
        ViewNode {
            name: "",
            dir: Some(&self.root),
            node: None,
        }
    }

    /// Top-level child by name.
    pub fn child(&self, name: &str) -> Option<ViewNode<'_>> {
        self.view().child(name)
    }

    /// Number of top-level children.
    pub fn child_count(&self) -> usize {
        self.view().child_count()
    }

    /// Resolve a module id such as `"p2Alias/p1/a"` to its node.
    pub fn resolve(&self, module_id: &str) -> Option<ViewNode<'_>> {
        split_path(module_id).try_fold(self.view(), |view, segment| view.child(segment))
    }

    /// Transitive `define` closure of `module_ids`.
    ///
    /// Modules are listed in first-seen depth-first order, following each module's
    /// dependencies in declaration order. Specifiers that resolve to no file-backed node
    /// are reported in [`Expansion::dangling`] instead of failing.
    pub fn expand<S: AsRef<str>>(&self, module_ids: &[S]) -> Expansion {
        let mut expansion = Expansion::default();
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();

        // Stack entries: (referrer, specifier as written, resolved id)
        let mut stack: Vec<(Option<String>, String, String)> = module_ids
            .iter()
            .rev()
            .map(|id| {
                let id = id.as_ref().to_string();
                (None, id.clone(), normalize_module_id(&id))
            })
            .collect();

        while let Some((referrer, specifier, id)) = stack.pop() {
            if seen.contains(&id) {
                continue;
            }
            let Some(view) = self.resolve(&id).filter(ViewNode::is_file) else {
                if reported.insert((referrer.clone(), specifier.clone())) {
                    expansion.dangling.push(Dangling {
                        referrer,
                        specifier,
                    });
                }
                continue;
            };
            seen.insert(id.clone());

            for dep in view.define_deps().iter().rev() {
                let resolved = resolve_specifier(&id, dep);
                if !seen.contains(&resolved) {
                    stack.push((Some(id.clone()), dep.clone(), resolved));
                }
            }
            expansion.modules.push(id);
        }

        expansion
    }
}

/// A dependency that resolved to nothing during [`TreeRoot::expand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dangling {
    /// Module that declared the dependency; `None` for a requested root module.
    pub referrer: Option<String>,
    /// The specifier as written.
    pub specifier: String,
}

/// Result of [`TreeRoot::expand`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Resolved module ids in first-seen order.
    pub modules: Vec<String>,
    /// Unresolvable specifiers, in the order they were encountered.
    pub dangling: Vec<Dangling>,
}

/// Resolve `specifier` relative to the module id `referrer`.
///
/// Only specifiers starting with `./` or `../` are relative; everything else is already
/// a module id and is returned normalized.
///
/// ```rust
/// use modgraph::deps::resolve_specifier;
///
/// assert_eq!(resolve_specifier("p1Alias/c", "./a"), "p1Alias/a");
/// assert_eq!(resolve_specifier("p2/p1/a", "../b"), "p2/b");
/// assert_eq!(resolve_specifier("p1/a", "p2/x"), "p2/x");
/// ```
pub fn resolve_specifier(referrer: &str, specifier: &str) -> String {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return normalize_module_id(specifier);
    }

    let mut segments: Vec<&str> = split_path(referrer).collect();
    segments.pop();
    for segment in split_path(specifier) {
        if segment == ".." {
            segments.pop();
        } else {
            segments.push(segment);
        }
    }
    segments.join("/")
}

fn normalize_module_id(id: &str) -> String {
    split_path(id).collect::<Vec<_>>().join("/")
}

/// A node in a [`TreeRoot`] view.
///
/// Combines the virtual directory structure created by alias names with the attached
/// trees underneath, so navigation works the same at every level.
#[derive(Debug, Clone, Copy)]
pub struct ViewNode<'a> {
    name: &'a str,
    dir: Option<&'a VirtualDir>,
    node: Option<NodeRef<'a>>,
}

impl<'a> ViewNode<'a> {
    /// Segment name. For an alias attachment this is the alias segment, not the
    /// location's own directory name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The attached tree node, if this position is backed by one.
    pub fn node(&self) -> Option<NodeRef<'a>> {
        self.node
    }

    /// Child by name, preferring a more specific alias over the current tree.
    pub fn child(&self, name: &str) -> Option<ViewNode<'a>> {
        let next_dir = self.dir.and_then(|d| d.children.get_key_value(name));
        let next_node = match next_dir.and_then(|(_, d)| d.mount.as_ref()) {
            Some(mount) => Some(mount.root()),
            None => self.node.and_then(|n| n.child(name)),
        };

        match (next_dir, next_node) {
            (None, None) => None,
            (Some((key, dir)), node) => Some(ViewNode {
                name: key.as_str(),
                dir: Some(dir),
                node,
            }),
            (None, Some(node)) => Some(ViewNode {
                name: node.name(),
                dir: None,
                node: Some(node),
            }),
        }
    }

    /// Descendant by `/`-separated path.
    pub fn get(&self, path: &str) -> Option<ViewNode<'a>> {
        split_path(path).try_fold(*self, |view, segment| view.child(segment))
    }

    /// Names of all children, virtual and attached, sorted.
    pub fn child_names(&self) -> BTreeSet<&'a str> {
        let mut names = BTreeSet::new();
        if let Some(dir) = self.dir {
            names.extend(dir.children.keys().map(String::as_str));
        }
        if let Some(node) = self.node {
            names.extend(node.node().children().keys().map(String::as_str));
        }
        names
    }

    /// Children in name order.
    pub fn children(&self) -> Vec<ViewNode<'a>> {
        self.child_names().into_iter().filter_map(|name| self.child(name)).collect()
    }

    /// Number of distinct children.
    pub fn child_count(&self) -> usize {
        self.child_names().len()
    }

    /// `define` specifiers; empty for virtual directories.
    pub fn define_deps(&self) -> &'a [String] {
        self.node.map(|n| n.define_deps()).unwrap_or_default()
    }

    /// `require` specifiers; empty for virtual directories.
    pub fn require_deps(&self) -> &'a [String] {
        self.node.map(|n| n.require_deps()).unwrap_or_default()
    }

    /// Backing file modification time.
    pub fn last_modified(&self) -> Option<i64> {
        self.node.and_then(|n| n.last_modified())
    }

    /// Time the dependency data last changed.
    pub fn last_modified_dep(&self) -> Option<i64> {
        self.node.and_then(|n| n.last_modified_dep())
    }

    /// True if backed by a source file.
    pub fn is_file(&self) -> bool {
        self.node.is_some_and(|n| n.is_file())
    }
}
