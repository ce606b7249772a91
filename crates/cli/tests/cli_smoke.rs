//! CLI smoke tests for berth.
//!
//! These run the real binary against a throwaway node tree; nothing here
//! touches the network or the container tooling.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn berth_cmd(node_root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("berth").unwrap();
    cmd.arg("--node-root").arg(node_root);
    cmd
}

fn write_app(node_root: &Path, id: &str, yaml: &str) {
    let dir = node_root.join("apps").join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("app.yml"), yaml).unwrap();
}

fn seed_node() -> TempDir {
    let root = TempDir::new().unwrap();
    write_app(
        root.path(),
        "files",
        r#"
version: 1
name: Files
containers:
  - name: web
    image: files:latest
    ports: [9000]
    main: true
metadata:
  title: Files
  version: "1.2.0"
"#,
    );
    write_app(
        root.path(),
        "legacy",
        r#"
name: legacy
image: legacy:latest
port: 8080
metadata:
  title: Legacy
  version: "0.9.0"
"#,
    );
    root
}

#[test]
fn update_writes_registries_and_compose_files() {
    let root = seed_node();

    berth_cmd(root.path())
        .arg("update")
        .assert()
        .success()
        .stderr(predicate::str::contains("Generated configuration for 2 app(s)"));

    let apps = root.path().join("apps");
    assert!(apps.join("registry.json").is_file());
    assert!(apps.join("apps.json").is_file());
    assert!(apps.join("files").join("docker-compose.yml").is_file());
    assert!(apps.join("legacy").join("docker-compose.yml").is_file());

    let compose = fs::read_to_string(apps.join("files").join("docker-compose.yml")).unwrap();
    assert!(compose.contains("files_web:"));
}

#[test]
fn update_reports_broken_apps_but_succeeds() {
    let root = seed_node();
    write_app(root.path(), "broken", "image: [oops\n");

    berth_cmd(root.path())
        .arg("update")
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipped app 'broken'"));
}

#[test]
fn install_and_uninstall_update_state() {
    let root = seed_node();

    berth_cmd(root.path())
        .args(["install", "files"])
        .assert()
        .success();

    let state = fs::read_to_string(root.path().join("db").join("user.json")).unwrap();
    assert!(state.contains("\"files\""));

    fs::create_dir_all(root.path().join("app-data").join("files")).unwrap();
    berth_cmd(root.path())
        .args(["uninstall", "files"])
        .assert()
        .success();

    let state = fs::read_to_string(root.path().join("db").join("user.json")).unwrap();
    assert!(!state.contains("\"files\""));
    assert!(!root.path().join("app-data").join("files").exists());
}

#[test]
fn import_reconstructs_manifest_from_compose() {
    let root = seed_node();

    berth_cmd(root.path()).arg("update").assert().success();

    // Overwrite the manifest, then recover it from the generated compose file
    let manifest = root.path().join("apps").join("files").join("app.yml");
    fs::remove_file(&manifest).unwrap();

    berth_cmd(root.path())
        .args(["import", "files"])
        .assert()
        .success();

    let recovered = fs::read_to_string(&manifest).unwrap();
    assert!(recovered.starts_with("version: 1"));
    assert!(recovered.contains("name: web"));
    assert!(recovered.contains("image: files:latest"));
}

#[test]
fn compose_fails_without_generated_file() {
    let root = seed_node();

    berth_cmd(root.path())
        .args(["compose", "files", "ps"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find docker-compose.yml"));
}

#[test]
fn start_with_no_state_file_is_a_no_op() {
    let root = seed_node();

    berth_cmd(root.path()).arg("start").assert().success();
}

#[test]
fn start_reports_every_failing_app() {
    let root = seed_node();
    berth_cmd(root.path()).args(["install", "files"]).assert().success();
    berth_cmd(root.path()).args(["install", "legacy"]).assert().success();

    // No compose files were generated, so every worker fails; all of them
    // must still be joined and reported
    berth_cmd(root.path())
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("files"))
        .stderr(predicate::str::contains("legacy"))
        .stderr(predicate::str::contains("2 app(s) failed"));
}
