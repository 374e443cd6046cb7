//! `modgraph show`: inspect the aliased module tree.

use crate::config::AggregatorConfig;
use crate::core::ModgraphError;
use crate::deps::{AmdParser, BuildOptions, DependencyTree, TreeRoot, ViewNode};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

/// Print the module tree as seen through the configured aliases.
#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Module id to describe, e.g. `p1Alias/a`
    module: Option<String>,

    /// Output JSON instead of text
    #[arg(long)]
    json: bool,

    /// Maximum tree depth to print
    #[arg(short = 'd', long)]
    depth: Option<usize>,

    /// Use the snapshot as is, without checking file timestamps
    #[arg(long)]
    no_validate: bool,
}

impl ShowCommand {
    /// Open the tree for `config` and print the requested view.
    pub async fn execute(self, config: &AggregatorConfig) -> Result<()> {
        let options = BuildOptions {
            clean: false,
            validate_deps: !self.no_validate,
        };
        let tree =
            DependencyTree::open(config.tree_settings()?, Arc::new(AmdParser::new()?), options)
                .await?;

        let mut root = TreeRoot::new();
        tree.map_dependencies(&mut root, &config.aliases(), true)?;

        match &self.module {
            Some(module) => self.show_module(&root, module),
            None if self.json => {
                let json = view_to_json(root.view(), self.depth, 0);
                println!("{}", serde_json::to_string_pretty(&json)?);
                Ok(())
            }
            None => {
                self.print_tree(&root);
                Ok(())
            }
        }
    }

    fn show_module(&self, root: &TreeRoot, module: &str) -> Result<()> {
        let view = root.resolve(module).ok_or_else(|| ModgraphError::NodeNotFound {
            path: module.to_string(),
        })?;
        let expansion = root.expand(&[module]);

        if self.json {
            let json = serde_json::json!({
                "module": module,
                "defineDeps": view.define_deps(),
                "requireDeps": view.require_deps(),
                "lastModified": view.last_modified(),
                "lastModifiedDep": view.last_modified_dep(),
                "children": view.child_names(),
                "closure": expansion.modules,
                "dangling": expansion.dangling.iter().map(|d| serde_json::json!({
                    "referrer": d.referrer,
                    "specifier": d.specifier,
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(());
        }

        println!("{}", module.cyan().bold());
        if !view.is_file() {
            println!("  {}", "(directory)".bright_black());
        }
        print_list("define", view.define_deps());
        print_list("require", view.require_deps());
        if view.is_file() {
            print_list("closure", &expansion.modules);
        }
        for dangling in &expansion.dangling {
            let from = dangling.referrer.as_deref().unwrap_or("<request>");
            println!(
                "  {} {} {}",
                "unresolved".yellow(),
                dangling.specifier,
                format!("(from {from})").bright_black()
            );
        }
        Ok(())
    }

    fn print_tree(&self, root: &TreeRoot) {
        let children = root.view().children();
        if children.is_empty() {
            println!("No aliases configured.");
            return;
        }
        for (i, child) in children.iter().enumerate() {
            self.print_node(*child, "", i == children.len() - 1, 0);
        }
    }

    fn print_node(&self, node: ViewNode<'_>, prefix: &str, is_last: bool, depth: usize) {
        if let Some(max_depth) = self.depth
            && depth >= max_depth
        {
            return;
        }

        let connector = if is_last { "└── " } else { "├── " };
        let deps = if node.define_deps().is_empty() {
            String::new()
        } else {
            format!(" {}", format!("[{}]", node.define_deps().join(", ")).bright_black())
        };
        let name = if node.is_file() { node.name().cyan() } else { node.name().normal() };
        println!("{prefix}{connector}{name}{deps}");

        let children = node.children();
        let child_prefix = if is_last { format!("{prefix}    ") } else { format!("{prefix}│   ") };
        for (i, child) in children.iter().enumerate() {
            self.print_node(*child, &child_prefix, i == children.len() - 1, depth + 1);
        }
    }
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("  {}:", label.bold());
    for item in items {
        println!("    {item}");
    }
}

fn view_to_json(node: ViewNode<'_>, max_depth: Option<usize>, depth: usize) -> serde_json::Value {
    let children: Vec<serde_json::Value> = if max_depth.is_some_and(|max| depth >= max) {
        Vec::new()
    } else {
        node.children().into_iter().map(|child| view_to_json(child, max_depth, depth + 1)).collect()
    };

    serde_json::json!({
        "name": node.name(),
        "defineDeps": node.define_deps(),
        "requireDeps": node.require_deps(),
        "lastModified": node.last_modified(),
        "children": children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::{ModuleDeps, NodeId, NodeTree};

    #[test]
    fn test_view_to_json_respects_depth() {
        let mut tree = NodeTree::new("p1");
        let a = tree.add_child(NodeId::ROOT, "a").unwrap();
        tree.set_dependencies(a, ModuleDeps::define(["./b"]), 10, 10).unwrap();
        let mut root = TreeRoot::new();
        root.attach("p1Alias", Arc::new(tree)).unwrap();

        let full = view_to_json(root.view(), None, 0);
        assert_eq!(full["children"][0]["name"], "p1Alias");
        assert_eq!(full["children"][0]["children"][0]["defineDeps"][0], "./b");

        let shallow = view_to_json(root.view(), Some(1), 0);
        assert_eq!(shallow["children"][0]["children"].as_array().unwrap().len(), 0);
    }
}
