//! Integration tests for the Podplan CLI
//!
//! These tests run the actual CLI binary and verify output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAN_OUT: &str = r#"
schema: podplan/workflow@0.1
templates:
  default:
    containers:
      - name: base
        image: airflow
tasks:
  - id: start
  - id: write
    resources:
      - volume: shared
        path: /data
        access: write
  - id: read
    resources:
      - volume: shared
        path: /data
        access: read
flows:
  - source: start
    target: [write, read]
"#;

/// Get the binary to test, isolated from user config and environment
fn podplan_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("podplan").unwrap();
    cmd.arg("--config")
        .arg(temp_dir.path().join("config.toml"))
        .env_remove("PODPLAN_DEFAULT_TIMEOUT")
        .env_remove("PODPLAN_DERIVE_MOUNTS")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn demo() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/read_write_pvc.yaml")
}

fn write_workflow(dir: &Path, name: &str, yaml: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn test_help_flag() {
    let temp_dir = TempDir::new().unwrap();
    podplan_cmd(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("plan"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_demo() {
    let temp_dir = TempDir::new().unwrap();
    podplan_cmd(&temp_dir)
        .arg("validate")
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("Tasks: 3"))
        .stdout(predicate::str::contains(
            "start_task → volume_write_task → volume_read_task",
        ));
}

#[test]
fn test_validate_cycle_fails_with_fix() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_workflow(
        temp_dir.path(),
        "cycle.yaml",
        r#"
schema: podplan/workflow@0.1
tasks:
  - id: a
  - id: b
flows:
  - source: a
    target: b
  - source: b
    target: a
"#,
    );

    podplan_cmd(&temp_dir)
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("PODPLAN-020"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_validate_wrong_schema() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_workflow(
        temp_dir.path(),
        "old.yaml",
        "schema: podplan/workflow@0.0\ntasks: []\n",
    );

    podplan_cmd(&temp_dir)
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid schema version"));
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_demo_is_clean() {
    let temp_dir = TempDir::new().unwrap();
    podplan_cmd(&temp_dir)
        .arg("check")
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("No hazards"));
}

#[test]
fn test_check_reports_missing_edge() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_workflow(temp_dir.path(), "fan_out.yaml", FAN_OUT);

    podplan_cmd(&temp_dir)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains(
            "'read' reads without depending on writer 'write'",
        ))
        .stderr(predicate::str::contains("PODPLAN-030"));
}

// ============================================================================
// plan
// ============================================================================

#[test]
fn test_plan_text() {
    let temp_dir = TempDir::new().unwrap();
    podplan_cmd(&temp_dir)
        .arg("plan")
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("Execution plan (3 tasks)"))
        .stdout(predicate::str::contains("busybox:latest"));
}

#[test]
fn test_plan_json_is_machine_readable() {
    let temp_dir = TempDir::new().unwrap();
    let output = podplan_cmd(&temp_dir)
        .args(["plan", "--format", "json"])
        .arg(demo())
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = plan["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["task"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["start_task", "volume_write_task", "volume_read_task"]);
    assert_eq!(plan["steps"][0]["spec"]["metadata"]["annotations"]["test"], "annotation");
}

#[test]
fn test_plan_invalid_workflow_fails() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_workflow(temp_dir.path(), "fan_out.yaml", FAN_OUT);

    podplan_cmd(&temp_dir)
        .args(["plan", "--format", "yaml"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_config_file_sets_default_timeout() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[defaults]\ntimeout_secs = 77\n",
    )
    .unwrap();

    podplan_cmd(&temp_dir)
        .arg("plan")
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout: 77s"));
}
