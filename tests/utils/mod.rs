// Shared helpers for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use steplog::TimingRecord;
use tempfile::TempDir;

/// Fresh temp dir and a sink path inside a not-yet-existing subdirectory
pub fn temp_sink() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("timings").join("session.jsonl");
    (dir, path)
}

/// Every line of the sink parsed as a record; panics on a malformed line
pub fn read_records(path: &Path) -> Vec<TimingRecord> {
    let contents = std::fs::read_to_string(path).expect("read sink");
    contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("line parses as a record"))
        .collect()
}

pub fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|c| c.lines().count())
        .unwrap_or(0)
}
