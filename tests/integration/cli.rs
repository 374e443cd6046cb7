//! End-to-end runs of the `modgraph` binary.

use assert_cmd::Command;
use modgraph::test_utils::ModuleFixture;
use predicates::prelude::*;
use tempfile::TempDir;

fn modgraph(fixture: &ModuleFixture) -> Command {
    let mut cmd = Command::cargo_bin("modgraph").unwrap();
    cmd.current_dir(&fixture.root).env("NO_COLOR", "1").env_remove("MODGRAPH_CONFIG");
    cmd
}

fn setup() -> (TempDir, ModuleFixture) {
    let temp = TempDir::new().unwrap();
    let fixture = ModuleFixture::create(temp.path()).unwrap();
    fixture.write_config().unwrap();
    (temp, fixture)
}

#[test]
fn test_build_writes_snapshot_then_validates() {
    let (_temp, fixture) = setup();

    modgraph(&fixture)
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("scanned"))
        .stdout(predicate::str::contains("snapshot written"));
    assert!(fixture.root.join("cache/depmap.json").exists());

    modgraph(&fixture)
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("validated"))
        .stdout(predicate::str::contains("0 parsed"));

    modgraph(&fixture)
        .args(["build", "--no-validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kept"));
}

#[test]
fn test_show_module_json() {
    let (_temp, fixture) = setup();

    let output = modgraph(&fixture).args(["show", "p1Alias/c", "--json"]).assert().success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["defineDeps"], serde_json::json!(["./a", "./b", "./noexist"]));
    assert_eq!(json["closure"], serde_json::json!(["p1Alias/c", "p1Alias/a", "p1Alias/b"]));
    assert_eq!(json["dangling"][0]["specifier"], "./noexist");
}

#[test]
fn test_show_tree() {
    let (_temp, fixture) = setup();

    modgraph(&fixture)
        .args(["show", "--depth", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("p1Alias"))
        .stdout(predicate::str::contains("p2Alias"))
        .stdout(predicate::str::contains("[./a, ./b, ./noexist]"))
        .stdout(predicate::str::contains("foo").not());
}

#[test]
fn test_show_unknown_module_fails() {
    let (_temp, fixture) = setup();

    modgraph(&fixture)
        .args(["show", "p1Alias/zzz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Node not found: p1Alias/zzz"));
}

#[test]
fn test_config_shows_signature() {
    let (_temp, fixture) = setup();

    modgraph(&fixture)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("sha256:"))
        .stdout(predicate::str::contains("p1Alias"));
}

#[test]
fn test_missing_config_reports_error() {
    let temp = TempDir::new().unwrap();
    let fixture = ModuleFixture::create(temp.path()).unwrap();

    modgraph(&fixture)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}
