//! End-to-end tests for the steplog binary
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

mod utils;

use assert_cmd::Command;
use predicates::prelude::*;
use steplog::Status;
use utils::{read_records, temp_sink};

fn steplog() -> Command {
    let mut cmd = Command::cargo_bin("steplog").unwrap();
    for key in [
        "STEPLOG_SINK",
        "STEPLOG_USER",
        "STEPLOG_RUN_ID",
        "STEPLOG_LEVEL",
        "STEPLOG_INCLUDE_TRACE",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    steplog()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn test_demo_writes_three_records() {
    let (_dir, sink) = temp_sink();

    steplog()
        .args(["demo", "--sink"])
        .arg(&sink)
        .assert()
        .success()
        .stderr(predicate::str::contains("slow_square(3) = 9"))
        .stderr(predicate::str::contains("steplog::timing"))
        .stderr(predicate::str::contains("\"status\":\"success\""))
        .stderr(predicate::str::contains("\"step\":\"demo-block\""));

    let records = read_records(&sink);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].step, "slow_square");
    assert_eq!(records[1].step, "demo-block");
    assert_eq!(records[1].module, "__block__");
    assert_eq!(records[2].step, "run");
    assert!(records.iter().all(|r| r.run_id.as_deref() == Some("manual-demo")));
    assert!(records[0].duration_seconds >= 0.2);
}

#[cfg(unix)]
#[test]
fn test_run_records_success() {
    let (_dir, sink) = temp_sink();

    steplog()
        .args(["run", "--step", "echo-check", "--run-id", "ci-1", "--sink"])
        .arg(&sink)
        .args(["--", "echo", "licence set"])
        .assert()
        .success()
        .stdout(predicate::str::contains("licence set"));

    let records = read_records(&sink);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, Status::Success);
    assert_eq!(records[0].step, "echo-check");
    assert_eq!(records[0].run_id.as_deref(), Some("ci-1"));
    assert_eq!(records[0].extra.get("exit_code").unwrap(), &serde_json::json!(0));
}

#[cfg(unix)]
#[test]
fn test_run_propagates_exit_code() {
    let (_dir, sink) = temp_sink();

    steplog()
        .args(["run", "--sink"])
        .arg(&sink)
        .args(["--", "sh", "-c", "exit 4"])
        .assert()
        .code(4);

    let records = read_records(&sink);
    assert_eq!(records[0].status, Status::Failure);
    assert_eq!(records[0].step, "sh");
    assert!(records[0].notes.contains("exited with code 4"));
}

#[cfg(unix)]
#[test]
fn test_run_killed_by_signal_exits_like_shell() {
    let (_dir, sink) = temp_sink();

    steplog()
        .args(["run", "--sink"])
        .arg(&sink)
        .args(["--", "sh", "-c", "kill -TERM $$"])
        .assert()
        .code(143);

    let records = read_records(&sink);
    assert_eq!(records[0].status, Status::Failure);
    assert_eq!(records[0].extra.get("exit_code"), Some(&serde_json::json!(143)));
}

#[test]
fn test_run_missing_program_fails() {
    let (_dir, sink) = temp_sink();

    steplog()
        .args(["run", "--sink"])
        .arg(&sink)
        .args(["--", "/no/such/program"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to spawn"));

    assert_eq!(read_records(&sink)[0].status, Status::Failure);
}

#[test]
fn test_summarize_text_and_json() {
    let (_dir, sink) = temp_sink();
    steplog().args(["demo", "--sink"]).arg(&sink).assert().success();

    steplog()
        .arg("summarize")
        .arg(&sink)
        .assert()
        .success()
        .stdout(predicate::str::contains("slow_square"))
        .stdout(predicate::str::contains("total"));

    let output = steplog()
        .arg("summarize")
        .arg(&sink)
        .args(["--format", "json", "--step", "^demo"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total_records"], 1);
    assert_eq!(summary["steps"][0]["step"], "demo-block");
}

#[test]
fn test_summarize_reports_skipped_lines() {
    let (_dir, sink) = temp_sink();
    std::fs::create_dir_all(sink.parent().unwrap()).unwrap();
    std::fs::write(&sink, "{\"truncated\": \n").unwrap();

    steplog()
        .arg("summarize")
        .arg(&sink)
        .assert()
        .success()
        .stdout(predicate::str::contains("No timing records."))
        .stderr(predicate::str::contains("Skipped 1 malformed line(s)"));
}

#[test]
fn test_summarize_tolerates_tail_cut_mid_character() {
    let (_dir, sink) = temp_sink();
    steplog().args(["demo", "--sink"]).arg(&sink).assert().success();

    let mut contents = std::fs::read(&sink).unwrap();
    contents.extend_from_slice(b"{\"id\":\"x\",\"notes\":\"caf\xC3");
    std::fs::write(&sink, contents).unwrap();

    steplog()
        .arg("summarize")
        .arg(&sink)
        .assert()
        .success()
        .stdout(predicate::str::contains("slow_square"))
        .stderr(predicate::str::contains("Skipped 1 malformed line(s)"));
}

#[test]
fn test_summarize_missing_file_fails() {
    steplog()
        .args(["summarize", "/no/such/sink.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read sink"));
}

#[test]
fn test_invalid_regex_fails() {
    let (_dir, sink) = temp_sink();
    steplog().args(["demo", "--sink"]).arg(&sink).assert().success();

    steplog()
        .arg("summarize")
        .arg(&sink)
        .args(["--step", "("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --step regex"));
}
