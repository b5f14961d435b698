//! CLI end-to-end tests that invoke the compiled `stylecheck` binary.
//!
//! Styles point at a closed loopback port so no test touches the network.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use style_core::{Section, Style, StyleId};
use tempfile::TempDir;

fn stylecheck(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stylecheck").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("STYLECHECK_CONFIG")
        .env("NO_COLOR", "1");
    cmd
}

fn write_style(dir: &TempDir, id: u64, name: &str) {
    let mut style = Style::new(StyleId(id), name, vec![Section::global("a{}")]);
    style.update_url = Some(format!("http://127.0.0.1:9/{id}.json"));
    let path = dir.path().join(".stylecheck/styles");
    fs::create_dir_all(&path).unwrap();
    fs::write(
        path.join(format!("{id}.json")),
        serde_json::to_string_pretty(&style).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_help_exits_zero() {
    let dir = TempDir::new().unwrap();
    stylecheck(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn test_log_without_activity() {
    let dir = TempDir::new().unwrap();
    stylecheck(&dir)
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("No update activity recorded yet."));
}

#[test]
fn test_check_with_no_styles() {
    let dir = TempDir::new().unwrap();
    stylecheck(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 checked"));
}

#[test]
fn test_check_unreachable_style_is_skipped_and_logged() {
    let dir = TempDir::new().unwrap();
    write_style(&dir, 1, "Dark");

    stylecheck(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 Dark (server unreachable)"));

    stylecheck(&dir)
        .args(["log", "--tail", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped (server unreachable) #1 Dark"));
}

#[test]
fn test_check_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    stylecheck(&dir)
        .args(["check", "--id", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Style not found: #42"));
}

#[test]
fn test_watch_refuses_disabled_interval() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("stylecheck.toml"), "interval_hours = 0.0\n").unwrap();

    stylecheck(&dir)
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Scheduled checks are disabled"));
}

#[test]
fn test_explicit_config_path() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("custom.yaml"), "data_dir: elsewhere\n").unwrap();
    write_style(&dir, 1, "Dark");

    // The style lives under the default data dir, which this config does not use
    stylecheck(&dir)
        .args(["--config", "custom.yaml", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 checked"));
}
