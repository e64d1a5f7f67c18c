//! CLI end-to-end tests
//!
//! Tests for the segtrim command-line interface. None of these need ffmpeg.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the segtrim binary, run from an empty directory so no
/// stray config.toml is picked up.
#[allow(deprecated)]
fn segtrim_cmd(cwd: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("segtrim").unwrap();
    cmd.current_dir(cwd);
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("segtrim"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("segtrim"));

    segtrim_cmd(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_plan_table() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .args(["plan", "--duration", "95", "--segment", "30", "--removal", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 windows"))
        .stdout(predicate::str::contains("60.000"));
}

#[test]
fn test_cli_plan_json() {
    let dir = tempdir().unwrap();
    let output = segtrim_cmd(dir.path())
        .args(["plan", "-d", "72", "-s", "30", "-r", "5", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let windows = json["windows"].as_array().unwrap();
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[2]["cut_length"], 7.0);
}

#[test]
fn test_cli_plan_with_nothing_to_keep() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .args(["plan", "-d", "4", "-s", "10", "-r", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No windows"));
}

#[test]
fn test_cli_plan_rejects_removal_not_below_segment() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .args(["plan", "-d", "60", "-s", "10", "-r", "10"])
        .assert()
        .failure();
}

#[test]
fn test_cli_run_missing_file() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .args(["run", "does-not-exist.mp4", "-s", "30", "-r", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_run_rejects_unsupported_extension() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "not a video").unwrap();

    segtrim_cmd(dir.path())
        .arg("run")
        .arg(&input)
        .args(["-s", "30", "-r", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file type"));

    assert!(input.exists());
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[server]
port = 8080

[processing]
parallel_cuts = 2
"#,
    )
    .unwrap();

    segtrim_cmd(dir.path())
        .arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("8080"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[processing]\nparallel_cuts = 0\n").unwrap();

    segtrim_cmd(dir.path())
        .arg("validate")
        .arg(&config_path)
        .assert()
        .failure();
}

#[test]
fn test_cli_check_tools_command() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_plan_rejects_oversized_plans() {
    let dir = tempdir().unwrap();
    segtrim_cmd(dir.path())
        .args(["plan", "-d", "20000000", "-s", "1", "-r", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("limited"));
}
