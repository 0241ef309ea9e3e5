// ABOUTME: Integration tests for the zen-docker CLI commands.
// ABOUTME: Validates --help, types, list and show against temporary build files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn zen_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("zen-docker"))
}

const BUILD: &str = r#"
toolchains:
  buildx: /usr/bin/buildx
  crane: /usr/bin/crane
targets:
  - type: docker_image
    name: api-image
    desc: API image
    image: acme/api
  - type: docker_container
    name: api
    image: acme/api:latest
"#;

#[test]
fn help_shows_commands() {
    zen_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("types"));
}

#[test]
fn types_lists_both_target_types() {
    zen_cmd()
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("docker_image"))
        .stdout(predicate::str::contains("docker_container"));
}

#[test]
fn list_prints_targets_from_build_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("BUILD.yml"), BUILD).unwrap();

    zen_cmd()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("api-image  API image"))
        .stdout(predicate::str::contains("api\n"));
}

#[test]
fn list_as_json_emits_one_record_per_target() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("BUILD.yml"), BUILD).unwrap();

    let out = zen_cmd()
        .arg("--json")
        .arg("-C")
        .arg(dir.path())
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let records: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["name"], "api-image");
    assert_eq!(records[0]["scripts"], serde_json::json!(["build", "deploy", "load"]));
    assert_eq!(records[1]["scripts"], serde_json::json!(["deploy"]));
}

#[test]
fn show_prints_scripts_and_aliases() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("BUILD.yml"), BUILD).unwrap();

    zen_cmd()
        .current_dir(dir.path())
        .args(["show", "api-image"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tool crane: /usr/bin/crane"))
        .stdout(predicate::str::contains("script deploy (alias push)"));
}

#[test]
fn unknown_target_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("BUILD.yml"), BUILD).unwrap();

    zen_cmd()
        .current_dir(dir.path())
        .args(["run", "web", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target: web"));
}

#[test]
fn unknown_script_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("BUILD.yml"), BUILD).unwrap();

    zen_cmd()
        .current_dir(dir.path())
        .args(["run", "api", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no script build"));
}

#[test]
fn missing_build_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    zen_cmd()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("build file not found"));
}
