//! End-to-end CLI tests (§8 scenarios), grounded on the teacher's
//! assert_cmd-based integration test style.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn init_project(dir: &Path) {
    fs::create_dir_all(dir.join(".git")).unwrap();
}

fn cmd(dir: &Path) -> Command {
    let mut c = Command::cargo_bin("agent-tracker").unwrap();
    c.current_dir(dir);
    c
}

#[test]
fn start_then_status_shows_running_agent() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_project(tmp.path());

    cmd(tmp.path())
        .args(["start", "researcher", "begin researching"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started researcher"));

    cmd(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Researcher"))
        .stdout(predicate::str::contains("started"));
}

#[test]
fn complete_is_idempotent_on_repeat_invocation() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_project(tmp.path());

    cmd(tmp.path())
        .args(["start", "researcher", "begin"])
        .assert()
        .success();
    cmd(tmp.path())
        .args(["complete", "researcher", "first", "done"])
        .assert()
        .success();
    cmd(tmp.path())
        .args(["complete", "researcher", "second", "done"])
        .assert()
        .success();

    let session_dir = tmp.path().join("docs").join("sessions");
    let session_file = fs::read_dir(&session_dir)
        .unwrap()
        .find(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .ends_with("-pipeline.json")
        })
        .unwrap()
        .unwrap()
        .path();
    let contents = fs::read_to_string(session_file).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let agents = doc["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0]["message"], "first done");
}

#[test]
fn unknown_agent_is_rejected_with_nonzero_exit() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_project(tmp.path());

    cmd(tmp.path())
        .args(["start", "not-a-real-agent", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown agent"));
}

#[test]
fn verify_parallel_exploration_happy_path() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_project(tmp.path());

    cmd(tmp.path())
        .args(["start", "researcher", "r"])
        .assert()
        .success();
    cmd(tmp.path())
        .args(["start", "planner", "p"])
        .assert()
        .success();
    cmd(tmp.path())
        .args(["complete", "researcher", "r", "done"])
        .assert()
        .success();
    cmd(tmp.path())
        .args(["complete", "planner", "p", "done"])
        .assert()
        .success();

    cmd(tmp.path())
        .arg("verify-parallel-exploration")
        .assert()
        .success()
        .stdout(predicate::str::contains("exploration"));
}

#[test]
fn verify_parallel_validation_reports_incomplete_when_one_agent_missing() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_project(tmp.path());

    cmd(tmp.path())
        .args(["start", "reviewer", "r"])
        .assert()
        .success();
    cmd(tmp.path())
        .args(["complete", "reviewer", "r", "done"])
        .assert()
        .success();
    cmd(tmp.path())
        .args(["start", "doc-master", "d"])
        .assert()
        .success();
    cmd(tmp.path())
        .args(["complete", "doc-master", "d", "done"])
        .assert()
        .success();

    cmd(tmp.path())
        .arg("verify-parallel-validation")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Incomplete"));
}

#[test]
fn set_github_issue_then_status_shows_it() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_project(tmp.path());

    cmd(tmp.path())
        .args(["set-github-issue", "42"])
        .assert()
        .success();

    cmd(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("#42"));
}

#[test]
fn missing_project_root_fails_with_not_found() {
    let tmp = tempfile::TempDir::new().unwrap();

    cmd(tmp.path())
        .args(["start", "researcher", "x"])
        .assert()
        .failure();
}
