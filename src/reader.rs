//! Reading sinks back
//!
//! Sinks may be appended to while they are read, so the last line can be a
//! partial record. Malformed lines are counted and skipped, never fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;
use crate::record::TimingRecord;

/// Records read from a sink
#[derive(Debug, Default)]
pub struct ReadOutcome {
    pub records: Vec<TimingRecord>,
    /// Lines that did not parse as a record
    pub skipped: usize,
}

/// Parse one sink line
pub fn parse_line(line: &str) -> Result<TimingRecord> {
    Ok(serde_json::from_str(line)?)
}

/// Read every record in the sink at `path`
///
/// Lines are split on raw bytes: an append cut off inside a multibyte
/// character is skipped like any other partial line. Only I/O errors fail.
pub fn read_sink(path: &Path) -> Result<ReadOutcome> {
    let reader = BufReader::new(File::open(path)?);
    let mut outcome = ReadOutcome::default();

    for bytes in reader.split(b'\n') {
        let bytes = bytes?;
        let Ok(line) = std::str::from_utf8(&bytes) else {
            tracing::debug!("skipping non-UTF-8 line in {}", path.display());
            outcome.skipped += 1;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(record) => outcome.records.push(record),
            Err(err) => {
                tracing::debug!("skipping malformed line in {}: {}", path.display(), err);
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}
