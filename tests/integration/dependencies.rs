//! Building, validating and rebuilding the dependency tree over the p1/p2 fixture.

use modgraph::deps::{
    AmdParser, BuildOptions, DependencyTree, ModuleDeps, NodeId, NodeTree, TreeRoot, TreeSettings,
};
use modgraph::test_utils::{ModuleFixture, init_test_logging, mtime};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

fn settings(fixture: &ModuleFixture) -> TreeSettings {
    TreeSettings::new([fixture.location("p1"), fixture.location("p2")], "sha256:test")
        .with_snapshot(fixture.root.join("cache/depmap.json"))
}

async fn open(fixture: &ModuleFixture, options: BuildOptions) -> DependencyTree {
    DependencyTree::open(settings(fixture), Arc::new(AmdParser::new().unwrap()), options)
        .await
        .unwrap()
}

fn aliases(fixture: &ModuleFixture, names: &[(&str, &str)]) -> BTreeMap<String, PathBuf> {
    names.iter().map(|(alias, dir)| (alias.to_string(), fixture.location(dir))).collect()
}

fn yesterday() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as i64;
    now - 24 * 60 * 60 * 1000
}

#[tokio::test]
async fn test_fresh_build_mirrors_fixture() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let fixture = ModuleFixture::create(temp.path()).unwrap();
    let tree = open(&fixture, BuildOptions::clean()).await;

    assert_eq!(tree.locations().len(), 2);
    let p1 = tree.location(&fixture.location("p1")).unwrap();
    let p2 = tree.location(&fixture.location("p2")).unwrap();
    let p1 = p1.root();
    let p2 = p2.root();

    assert_eq!(p1.child_count(), 4);
    assert_eq!(p2.child_count(), 3);
    for name in ["a", "b", "c", "p1"] {
        assert_eq!(p1.child(name).unwrap().child_count(), 0, "p1/{name}");
    }
    assert_eq!(p2.get("p1").unwrap().child_count(), 2);
    assert_eq!(p2.get("p1/a").unwrap().child_count(), 0);
    assert_eq!(p2.get("p1/p1").unwrap().child_count(), 4);
    assert_eq!(p2.get("p1/p1/foo").unwrap().child_count(), 0);

    assert_eq!(p1.child("a").unwrap().define_deps(), ["./b"]);
    assert_eq!(p1.child("b").unwrap().define_deps(), ["./c"]);
    assert_eq!(p1.child("c").unwrap().define_deps(), ["./a", "./b", "./noexist"]);
    assert_eq!(
        p1.child("p1").unwrap().define_deps(),
        ["p1/a", "p2/p1/b", "p2/p1/p1/c", "p2/noexist"]
    );
    assert_eq!(p2.get("p1/a").unwrap().define_deps(), ["./b"]);
    assert_eq!(p2.get("p1/p1").unwrap().define_deps(), ["./c"]);
    let foo = p2.get("p1/p1/foo").unwrap();
    assert_eq!(foo.define_deps(), ["p1/a", "p2/p1/b", "p2/p1/p1/c", "p2/noexist"]);
    assert_eq!(foo.require_deps(), ["p2/a"]);

    let a_time = mtime(&fixture.file("p1/a")).unwrap();
    assert_eq!(p1.child("a").unwrap().last_modified(), Some(a_time));
    assert_eq!(p1.child("a").unwrap().last_modified_dep(), Some(a_time));
}

#[tokio::test]
async fn test_snapshot_reuse_validation_and_clean() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let fixture = ModuleFixture::create(temp.path()).unwrap();
    let yesterday = yesterday();
    let p1_dir = fixture.location("p1");
    let p2_dir = fixture.location("p2");
    let p3_dir = fixture.location("p3");
    let p2_p1_a_time = mtime(&fixture.file("p2/p1/a")).unwrap();

    // Seed the snapshot with stale and deliberately wrong data
    {
        let tree = open(&fixture, BuildOptions::clean()).await;
        tree.update_location(&p1_dir, |t| {
            let a = t.get(NodeId::ROOT, "a").unwrap();
            t.set_dependencies(a, ModuleDeps::define(["foo/bar"]), yesterday, yesterday).unwrap();
            let b = t.get(NodeId::ROOT, "b").unwrap();
            t.set_dependencies(b, ModuleDeps::define(["./c"]), yesterday, yesterday).unwrap();
        })
        .unwrap();
        tree.update_location(&p2_dir, |t| {
            let a = t.get(NodeId::ROOT, "p1/a").unwrap();
            t.set_dependencies(a, ModuleDeps::define(["xxx"]), p2_p1_a_time, p2_p1_a_time)
                .unwrap();
        })
        .unwrap();

        let mut p3 = NodeTree::new("p3");
        let a = p3.add_child(NodeId::ROOT, "a").unwrap();
        p3.set_dependencies(a, ModuleDeps::define(["./b"]), yesterday, yesterday).unwrap();
        tree.publish(&p3_dir, p3);
        tree.persist().await.unwrap();
    }

    let all = aliases(&fixture, &[("p1Alias", "p1"), ("p2Alias", "p2"), ("p3Alias", "p3")]);

    // Snapshot taken as is
    let tree = open(&fixture, BuildOptions::default()).await;
    let mut root = TreeRoot::new();
    tree.map_dependencies(&mut root, &all, true).unwrap();
    assert_eq!(root.name(), "");
    assert_eq!(root.child_count(), 3);
    let a = root.resolve("p1Alias/a").unwrap();
    assert_eq!(a.define_deps(), ["foo/bar"]);
    assert_eq!(a.last_modified(), Some(yesterday));
    assert_eq!(a.last_modified_dep(), Some(yesterday));
    let b = root.resolve("p1Alias/b").unwrap();
    assert_eq!(b.last_modified(), Some(yesterday));
    assert_eq!(b.last_modified_dep(), Some(yesterday));
    assert_eq!(root.resolve("p3Alias/a").unwrap().define_deps(), ["./b"]);
    assert_eq!(root.resolve("p2Alias/p1/a").unwrap().define_deps(), ["xxx"]);
    drop(root);
    drop(tree);

    // Validation follows timestamps, not content
    let tree = open(&fixture, BuildOptions::validate()).await;
    let mut root = TreeRoot::new();
    tree.map_dependencies(&mut root, &all, true).unwrap();
    assert_eq!(root.child_count(), 3);
    assert_eq!(root.child("p3Alias").unwrap().child_count(), 0);

    let a_time = mtime(&fixture.file("p1/a")).unwrap();
    let b_time = mtime(&fixture.file("p1/b")).unwrap();
    let a = root.resolve("p1Alias/a").unwrap();
    assert_eq!(a.define_deps(), ["./b"]);
    assert_eq!(a.last_modified(), Some(a_time));
    assert_eq!(a.last_modified_dep(), Some(a_time));
    let b = root.resolve("p1Alias/b").unwrap();
    assert_eq!(b.last_modified(), Some(b_time));
    assert_eq!(b.last_modified_dep(), Some(yesterday));

    let p2_p1_a = root.resolve("p2Alias/p1/a").unwrap();
    assert_eq!(p2_p1_a.define_deps(), ["xxx"]);
    assert_eq!(p2_p1_a.last_modified(), Some(p2_p1_a_time));
    assert_eq!(p2_p1_a.last_modified_dep(), Some(p2_p1_a_time));
    drop(root);
    drop(tree);

    // Clean rebuild re-derives everything
    let tree = open(&fixture, BuildOptions::clean()).await;
    let mut root = TreeRoot::new();
    tree.map_dependencies(&mut root, &all, false).unwrap();
    assert!(root.child("p3Alias").is_none());
    let p2_p1_a = root.resolve("p2Alias/p1/a").unwrap();
    assert_eq!(p2_p1_a.define_deps(), ["./b"]);
    assert_eq!(p2_p1_a.last_modified(), Some(p2_p1_a_time));
    assert_eq!(p2_p1_a.last_modified_dep(), Some(p2_p1_a_time));
}

#[tokio::test]
async fn test_map_dependencies_missing_alias() {
    let temp = TempDir::new().unwrap();
    let fixture = ModuleFixture::create(temp.path()).unwrap();
    let tree = open(&fixture, BuildOptions::validate()).await;

    let with_missing = aliases(&fixture, &[("p1Alias", "p1"), ("NoExist", "noexist")]);
    let mut root = TreeRoot::new();
    let err = tree.map_dependencies(&mut root, &with_missing, true).unwrap_err();
    assert!(err.to_string().contains("NoExist"));

    tree.map_dependencies(&mut root, &with_missing, false).unwrap();
    assert!(root.child("NoExist").is_none());
    assert!(root.child("p1Alias").is_some());
}

#[tokio::test]
async fn test_aliases_expose_identical_data() {
    let temp = TempDir::new().unwrap();
    let fixture = ModuleFixture::create(temp.path()).unwrap();
    let tree = open(&fixture, BuildOptions::validate()).await;

    let mut root = TreeRoot::new();
    tree.map_dependencies(
        &mut root,
        &aliases(&fixture, &[("p1Alias", "p1"), ("p2Alias", "p2")]),
        true,
    )
    .unwrap();

    for (module, define) in ModuleFixture::DEFINES {
        let aliased = module.replacen("p1/", "p1Alias/", 1);
        let aliased = if module.starts_with("p2/") {
            module.replacen("p2/", "p2Alias/", 1)
        } else {
            aliased
        };
        let node = root.resolve(&aliased).unwrap_or_else(|| panic!("{aliased} missing"));
        assert_eq!(node.define_deps(), *define, "{aliased}");
    }

    // The same tree is shared, not copied
    let shared = tree.location(&fixture.location("p1")).unwrap();
    assert!(Arc::strong_count(&shared) >= 3);
}

#[tokio::test]
async fn test_expand_reports_dangling_dependencies() {
    let temp = TempDir::new().unwrap();
    let fixture = ModuleFixture::create(temp.path()).unwrap();
    let tree = open(&fixture, BuildOptions::validate()).await;

    let mut root = TreeRoot::new();
    tree.map_dependencies(&mut root, &aliases(&fixture, &[("p1", "p1"), ("p2", "p2")]), true)
        .unwrap();

    let expansion = root.expand(&["p2/p1/p1/foo"]);
    assert_eq!(
        expansion.modules,
        [
            "p2/p1/p1/foo",
            "p1/a",
            "p1/b",
            "p1/c",
            "p2/p1/p1/c",
            "p2/p1/p1/a",
            "p2/p1/p1/b",
        ]
    );
    let dangling: Vec<&str> = expansion.dangling.iter().map(|d| d.specifier.as_str()).collect();
    assert_eq!(dangling, ["./noexist", "p2/p1/b", "./noexist", "p2/noexist"]);
}

#[tokio::test]
async fn test_new_and_removed_files_picked_up_by_validation() {
    let temp = TempDir::new().unwrap();
    let fixture = ModuleFixture::create(temp.path()).unwrap();
    let p1 = fixture.location("p1");
    open(&fixture, BuildOptions::validate()).await;

    std::fs::remove_file(fixture.file("p1/c")).unwrap();
    modgraph::test_utils::write_file(&fixture.root, "p1/d.js", "define([\"./a\"], function(){});")
        .unwrap();

    let tree = open(&fixture, BuildOptions::validate()).await;
    let p1_tree = tree.location(&p1).unwrap();
    assert!(p1_tree.root().child("c").is_none());
    assert_eq!(p1_tree.root().child("d").unwrap().define_deps(), ["./a"]);
}
