//! Scoped block timing
//!
//! [`Timer`] times an arbitrary region rather than one callable. The guard
//! it returns records exactly once: on [`TimerGuard::finish`], or on drop if
//! the region was left early by `?` or a panic.
//!
//! ```
//! use steplog::Timer;
//!
//! let guard = Timer::new("reproject").start();
//! let result: Result<u32, String> = Ok(5);
//! let value = guard.finish(result).unwrap();
//! assert_eq!(value, 5);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::thread;
use tracing::Level;

use crate::emit::emit;
use crate::record::{CallSite, Extra, Started, Status, TimingRecord};

const BLOCK_MODULE: &str = "__block__";

/// Configuration for a timed block
#[derive(Debug, Clone)]
pub struct Timer {
    step: String,
    user: Option<String>,
    sink: Option<PathBuf>,
    level: Level,
    notes: Option<String>,
    extra: Extra,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new("block")
    }
}

impl Timer {
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            user: None,
            sink: None,
            level: Level::INFO,
            notes: None,
            extra: Extra::new(),
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn sink(mut self, path: impl Into<PathBuf>) -> Self {
        self.sink = Some(path.into());
        self
    }

    pub fn sink_opt(mut self, path: Option<PathBuf>) -> Self {
        self.sink = path;
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Notes recorded even on success; failures append to them
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    /// Enter the block
    pub fn start(self) -> TimerGuard {
        TimerGuard {
            timer: Some(self),
            started: Started::now(),
        }
    }

    /// Run `f` inside a timed block
    pub fn time<T, E, F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let guard = self.start();
        guard.finish(f())
    }
}

/// An open timed block
///
/// Must be closed with [`TimerGuard::finish`]; dropping it otherwise records
/// a failure.
#[must_use = "dropping the guard without finish records a failure"]
pub struct TimerGuard {
    timer: Option<Timer>,
    started: Started,
}

impl TimerGuard {
    /// Close the block with the region's outcome, returning it unchanged
    pub fn finish<T, E>(mut self, result: Result<T, E>) -> Result<T, E>
    where
        E: fmt::Display,
    {
        match &result {
            Ok(_) => self.close(Status::Success, None),
            Err(err) => self.close(Status::Failure, Some(err.to_string())),
        }
        result
    }

    fn close(&mut self, status: Status, failure: Option<String>) {
        let Some(timer) = self.timer.take() else {
            return;
        };
        let window = self.started.finish();

        let notes = match (timer.notes, failure) {
            (Some(preset), Some(desc)) => Some(format!("{}\n{}", preset, desc)),
            (None, Some(desc)) => Some(desc),
            (preset, None) => preset,
        };
        let site = CallSite {
            module: BLOCK_MODULE.to_string(),
            function: timer.step.clone(),
            step: timer.step,
            user: timer.user,
        };

        let rec = TimingRecord::build(&site, window, status, notes, timer.extra);
        emit(&rec, timer.level, timer.sink.as_deref());
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        if self.timer.is_none() {
            return;
        }
        let reason = if thread::panicking() {
            "panicked"
        } else {
            "scope exited before finish"
        };
        self.close(Status::Failure, Some(reason.to_string()));
    }
}
