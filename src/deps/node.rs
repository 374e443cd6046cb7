//! Hierarchical module namespace nodes.
//!
//! A location's modules are stored in a [`NodeTree`], an arena of [`DependencyNode`]s
//! addressed by [`NodeId`]. The arena's `children` maps are the only ownership path;
//! `parent` is a plain index used for navigation, so a published tree can be shared
//! behind an [`Arc`](std::sync::Arc) and attached under several aliases at once without
//! any reference cycles.
//!
//! Trees are never pruned in place. Validation builds a replacement tree and the owner
//! swaps it in, so ids stay valid for as long as a reader holds the tree.

use crate::core::ModgraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Index;

/// Path separator used in module ids and node paths.
pub const SEPARATOR: char = '/';

/// Index of a node within its [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: Self = Self(0);
}

/// Dependency specifiers declared by one source file.
///
/// Order is significant: consumers wire `define` dependencies in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDeps {
    /// Specifiers from the module's `define([...])` array.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub define: Vec<String>,
    /// Specifiers from `require([...])` calls, loaded at runtime.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require: Vec<String>,
    /// Specifiers from synchronous `require("x")` calls.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object: Vec<String>,
}

impl ModuleDeps {
    /// Dependencies with only `define` entries.
    pub fn define<I, S>(define: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            define: define.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Builder-style setter for `require` entries.
    #[must_use]
    pub fn with_require<I, S>(mut self, require: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require = require.into_iter().map(Into::into).collect();
        self
    }

    /// True if no specifiers of any kind are declared.
    pub fn is_empty(&self) -> bool {
        self.define.is_empty() && self.require.is_empty() && self.object.is_empty()
    }
}

/// One segment of the module namespace.
///
/// A node with `last_modified` set is backed by a source file; without it the node is a
/// directory placeholder. A node may be both (a file `x.js` next to a directory `x/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, NodeId>,
    #[serde(default)]
    deps: ModuleDeps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_modified_dep: Option<i64>,
}

impl DependencyNode {
    fn new(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            parent,
            children: BTreeMap::new(),
            deps: ModuleDeps::default(),
            last_modified: None,
            last_modified_dep: None,
        }
    }

    /// Local segment name, unique among siblings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Navigational back-reference; `None` for the tree root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children keyed by name.
    pub fn children(&self) -> &BTreeMap<String, NodeId> {
        &self.children
    }

    /// Declared dependencies.
    pub fn deps(&self) -> &ModuleDeps {
        &self.deps
    }

    /// `define([...])` specifiers in declaration order.
    pub fn define_deps(&self) -> &[String] {
        &self.deps.define
    }

    /// `require([...])` specifiers in source order.
    pub fn require_deps(&self) -> &[String] {
        &self.deps.require
    }

    /// Modification time of the backing file in epoch millis.
    pub fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    /// Time the dependency data was last derived with a different result.
    pub fn last_modified_dep(&self) -> Option<i64> {
        self.last_modified_dep
    }

    /// True if the node is backed by a source file.
    pub fn is_file(&self) -> bool {
        self.last_modified.is_some()
    }
}

/// Arena holding one location's node hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTree {
    nodes: Vec<DependencyNode>,
}

impl NodeTree {
    /// Create a tree containing only a root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![DependencyNode::new(root_name, None)],
        }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node by id, if it belongs to this tree.
    pub fn node(&self, id: NodeId) -> Option<&DependencyNode> {
        self.nodes.get(id.0)
    }

    /// Attach a new, empty child named `name` under `parent`.
    ///
    /// # Errors
    ///
    /// [`ModgraphError::DuplicateName`] if `parent` already has a child with that name,
    /// [`ModgraphError::NodeNotFound`] if `parent` is not in this tree.
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, ModgraphError> {
        let parent_node = self.nodes.get(parent.0).ok_or_else(|| ModgraphError::NodeNotFound {
            path: format!("#{}", parent.0),
        })?;
        if parent_node.children.contains_key(name) {
            return Err(ModgraphError::DuplicateName {
                parent: parent_node.name.clone(),
                name: name.to_string(),
            });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(DependencyNode::new(name, Some(parent)));
        self.nodes[parent.0].children.insert(name.to_string(), id);
        Ok(id)
    }

    /// Look up a direct child by name.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes.get(id.0)?.children.get(name).copied()
    }

    /// Descend from `id` along a `/`-separated path.
    ///
    /// Empty and `.` segments are ignored, so `"a//b"` and `"./a/b"` both mean `a/b`.
    pub fn get(&self, id: NodeId, path: &str) -> Option<NodeId> {
        split_path(path).try_fold(id, |current, segment| self.child(current, segment))
    }

    /// Descend along `segments`, creating missing nodes as directory placeholders.
    pub fn ensure_path<'s, I>(&mut self, id: NodeId, segments: I) -> Result<NodeId, ModgraphError>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut current = id;
        for segment in segments {
            current = match self.child(current, segment) {
                Some(existing) => existing,
                None => self.add_child(current, segment)?,
            };
        }
        Ok(current)
    }

    /// Replace a node's dependencies and both timestamps in one step.
    ///
    /// The caller supplies consistent timestamps; nothing is derived here.
    pub fn set_dependencies(
        &mut self,
        id: NodeId,
        deps: ModuleDeps,
        last_modified: i64,
        last_modified_dep: i64,
    ) -> Result<(), ModgraphError> {
        let node = self.nodes.get_mut(id.0).ok_or_else(|| ModgraphError::NodeNotFound {
            path: format!("#{}", id.0),
        })?;
        node.deps = deps;
        node.last_modified = Some(last_modified);
        node.last_modified_dep = Some(last_modified_dep);
        Ok(())
    }

    /// Path of `id` relative to the root, segments joined with `/`.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(node_id.0) else {
                break;
            };
            if node.parent.is_some() {
                segments.push(node.name.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        segments.join("/")
    }

    /// Root view.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    /// View of an arbitrary node.
    pub fn view(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id.0).map(|_| NodeRef {
            tree: self,
            id,
        })
    }

    /// All node ids in depth-first pre-order, children visited by name.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.values().rev().copied());
        }
        order
    }

    /// Number of file-backed nodes.
    pub fn file_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_file()).count()
    }

    /// Check the arena's internal links after deserialization.
    ///
    /// Every child index must be in range and point back at its parent, and every
    /// non-root node must be reachable exactly once.
    pub fn check_integrity(&self) -> Result<(), ModgraphError> {
        let broken = |reason: String| ModgraphError::Other {
            message: format!("Corrupt node tree: {reason}"),
        };

        let Some(root) = self.nodes.first() else {
            return Err(broken("missing root node".to_string()));
        };
        if root.parent.is_some() {
            return Err(broken("root node has a parent".to_string()));
        }

        let mut seen = vec![false; self.nodes.len()];
        seen[0] = true;
        for (index, node) in self.nodes.iter().enumerate() {
            for (name, child) in &node.children {
                let Some(child_node) = self.nodes.get(child.0) else {
                    return Err(broken(format!("child '{name}' index {} out of range", child.0)));
                };
                if child_node.parent != Some(NodeId(index)) || child_node.name != *name {
                    return Err(broken(format!("child '{name}' is not linked to its parent")));
                }
                if std::mem::replace(&mut seen[child.0], true) {
                    return Err(broken(format!("node '{name}' is attached twice")));
                }
            }
        }

        if seen.iter().all(|reached| *reached) {
            Ok(())
        } else {
            Err(broken("unreachable nodes".to_string()))
        }
    }
}

impl Index<NodeId> for NodeTree {
    type Output = DependencyNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

/// Borrowed cursor over a node in a [`NodeTree`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a NodeTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    /// Id of the node within its tree.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree this view points into.
    pub fn tree(&self) -> &'a NodeTree {
        self.tree
    }

    /// The underlying node data.
    pub fn node(&self) -> &'a DependencyNode {
        &self.tree[self.id]
    }

    /// Local segment name.
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<NodeRef<'a>> {
        self.tree.child(self.id, name).map(|id| self.at(id))
    }

    /// Descendant by `/`-separated path.
    pub fn get(&self, path: &str) -> Option<NodeRef<'a>> {
        self.tree.get(self.id, path).map(|id| self.at(id))
    }

    /// Parent within the same tree.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.at(id))
    }

    /// Children in name order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node().children.values().map(move |&id| NodeRef {
            tree,
            id,
        })
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// `define` specifiers.
    pub fn define_deps(&self) -> &'a [String] {
        self.node().define_deps()
    }

    /// `require` specifiers.
    pub fn require_deps(&self) -> &'a [String] {
        self.node().require_deps()
    }

    /// All declared dependencies.
    pub fn deps(&self) -> &'a ModuleDeps {
        self.node().deps()
    }

    /// Backing file modification time.
    pub fn last_modified(&self) -> Option<i64> {
        self.node().last_modified
    }

    /// Time the dependency data last changed.
    pub fn last_modified_dep(&self) -> Option<i64> {
        self.node().last_modified_dep
    }

    /// True if backed by a source file.
    pub fn is_file(&self) -> bool {
        self.node().is_file()
    }

    /// Path relative to the tree root.
    pub fn path(&self) -> String {
        self.tree.path_of(self.id)
    }

    fn at(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef {
            tree: self.tree,
            id,
        }
    }
}

/// Split a module path into its meaningful segments.
pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty() && *s != ".")
}
