//! Append-only JSONL sink
//!
//! Each record line goes out in a single `write_all` on a descriptor opened
//! with `O_APPEND`, so concurrent POSIX writers do not interleave partial
//! lines. When the append open is refused the line is written through a
//! process-wide mutex instead. Neither path is a strict guarantee on every
//! platform.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Result, StepLogError};

static FALLBACK_LOCK: Mutex<()> = Mutex::new(());

/// Create the directory that will hold `path`
///
/// Racing processes may both create it; an existing directory is fine.
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Append one line (a newline is added) to the sink at `path`
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let sink_err = |source| StepLogError::Sink {
        path: path.to_path_buf(),
        source,
    };

    ensure_parent_dir(path).map_err(sink_err)?;

    let mut data = String::with_capacity(line.len() + 1);
    data.push_str(line);
    data.push('\n');

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(mut file) => file.write_all(data.as_bytes()).map_err(sink_err),
        Err(err) => {
            tracing::debug!(
                "append-mode open of {} failed ({}), using locked write",
                path.display(),
                err
            );
            append_locked(path, data.as_bytes()).map_err(sink_err)
        }
    }
}

fn append_locked(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let _guard = FALLBACK_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut file = OpenOptions::new().create(true).write(true).open(path)?;
    file.seek(SeekFrom::End(0))?;
    file.write_all(data)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/session.jsonl");

        append_line(&path, "{\"a\":1}").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"a\":1}\n");
    }

    #[test]
    fn test_append_preserves_existing_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.jsonl");

        for line in ["one", "two", "three"] {
            append_line(&path, line).unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().collect::<Vec<_>>(), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_append_to_directory_is_sink_error() {
        let dir = TempDir::new().unwrap();
        let err = append_line(dir.path(), "x").unwrap_err();
        assert!(matches!(err, StepLogError::Sink { .. }));
    }

    #[test]
    fn test_ensure_parent_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b.jsonl");
        ensure_parent_dir(&path).unwrap();
        ensure_parent_dir(&path).unwrap();
        assert!(dir.path().join("a").is_dir());
    }

    #[test]
    fn test_bare_file_name_needs_no_parent() {
        assert!(ensure_parent_dir(Path::new("session.jsonl")).is_ok());
    }
}
