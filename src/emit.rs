//! Record emission shared by [`Recorder`](crate::Recorder) and
//! [`Timer`](crate::Timer)
//!
//! A record goes to the log stream first and then, if configured, to the
//! sink. Sink failures are logged and dropped here so they can never change
//! the outcome of the operation that was timed.

use std::path::Path;
use tracing::Level;

use crate::record::TimingRecord;
use crate::sink;

/// Log target used for record echoes
pub const TIMING_TARGET: &str = "steplog::timing";

/// Emit `record` at `level` and append it to `sink_path` if given
///
/// Returns the serialized line.
pub fn emit(record: &TimingRecord, level: Level, sink_path: Option<&Path>) -> String {
    let line = record.to_json_line();
    log_line(record, &line, level);

    if let Some(path) = sink_path {
        if let Err(err) = sink::append_line(path, &line) {
            tracing::error!("Failed to write JSONL timing record: {}", err);
        }
    }

    line
}

fn log_line(record: &TimingRecord, line: &str, level: Level) {
    let step = record.step.as_str();
    let status = record.status.as_str();
    let duration_seconds = record.duration_seconds;

    // tracing requires the level to be known at the call site
    match level {
        Level::TRACE => tracing::trace!(target: TIMING_TARGET, step, status, duration_seconds, "{}", line),
        Level::DEBUG => tracing::debug!(target: TIMING_TARGET, step, status, duration_seconds, "{}", line),
        Level::INFO => tracing::info!(target: TIMING_TARGET, step, status, duration_seconds, "{}", line),
        Level::WARN => tracing::warn!(target: TIMING_TARGET, step, status, duration_seconds, "{}", line),
        Level::ERROR => tracing::error!(target: TIMING_TARGET, step, status, duration_seconds, "{}", line),
    }
}

/// Parse a level name as used in configuration and on the command line
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
