//! Call instrumentation
//!
//! [`Recorder`] wraps a single callable, times it, and emits exactly one
//! [`TimingRecord`](crate::TimingRecord) however the callable exits. The
//! callable's result (or panic) is handed back unchanged.
//!
//! # Example
//!
//! ```
//! use steplog::Recorder;
//!
//! let squared: Result<i32, String> = Recorder::new("square").call(|| Ok(3 * 3));
//! assert_eq!(squared, Ok(9));
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::emit::emit;
use crate::record::{CallSite, Extra, Started, Status, TimingRecord, Window};

/// Instruments one callable per call
#[derive(Debug, Clone)]
pub struct Recorder {
    module: String,
    function: String,
    step: Option<String>,
    user: Option<String>,
    sink: Option<PathBuf>,
    level: Level,
    include_trace: bool,
    extra: Extra,
}

impl Recorder {
    /// Create a recorder for the callable labelled `function`
    ///
    /// The step name defaults to the same label.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            module: String::new(),
            function: function.into(),
            step: None,
            user: None,
            sink: None,
            level: Level::INFO,
            include_trace: true,
            extra: Extra::new(),
        }
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Record `user` instead of the OS user
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Persist records to this JSONL file in addition to logging them
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

    /// Append a backtrace to the notes of failure records
    pub fn include_trace(mut self, include: bool) -> Self {
        self.include_trace = include;
        self
    }

    pub fn extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    pub fn sink_path(&self) -> Option<&Path> {
        self.sink.as_deref()
    }

    pub fn step_name(&self) -> &str {
        self.step.as_deref().unwrap_or(&self.function)
    }

    /// Time a fallible callable
    ///
    /// `Err` and panics are recorded as failures; the error is returned and
    /// the panic resumed exactly as the callable produced them.
    pub fn call<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        self.call_with(f, |_| Extra::new())
    }

    /// Like [`Recorder::call`], adding extras derived from the result
    pub fn call_with<T, E, F, X>(&self, f: F, extras: X) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
        X: FnOnce(&Result<T, E>) -> Extra,
    {
        let started = Started::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(f));
        let window = started.finish();

        match outcome {
            Ok(result) => {
                let added = extras(&result);
                match &result {
                    Ok(_) => self.record(window, Status::Success, None, added),
                    Err(err) => {
                        let notes = self.failure_notes(err.to_string());
                        self.record(window, Status::Failure, Some(notes), added);
                    }
                }
                result
            }
            Err(payload) => {
                let notes = self.failure_notes(panic_message(payload.as_ref()));
                self.record(window, Status::Failure, Some(notes), Extra::new());
                panic::resume_unwind(payload)
            }
        }
    }

    /// Time an infallible callable; only a panic counts as failure
    pub fn measure<T, F>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self.call(|| Ok::<T, std::convert::Infallible>(f())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    fn failure_notes(&self, description: String) -> String {
        if self.include_trace {
            format!("{}\n{:?}", description, backtrace::Backtrace::new())
        } else {
            description
        }
    }

    fn record(&self, window: Window, status: Status, notes: Option<String>, added: Extra) {
        let site = CallSite {
            module: self.module.clone(),
            function: self.function.clone(),
            step: self.step_name().to_string(),
            user: self.user.clone(),
        };
        let mut extra = self.extra.clone();
        extra.extend(added);

        let rec = TimingRecord::build(&site, window, status, notes, extra);
        emit(&rec, self.level, self.sink.as_deref());
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}

/// Time a callable under a recorder labelled with the caller's module path
///
/// ```
/// let value: Result<u32, String> = steplog::timeit!("answer", || Ok(42));
/// assert_eq!(value, Ok(42));
/// ```
#[macro_export]
macro_rules! timeit {
    ($recorder:expr, $label:expr, $body:expr) => {
        ($recorder)
            .clone()
            .module(module_path!())
            .function($label)
            .call($body)
    };
    ($label:expr, $body:expr) => {
        $crate::Recorder::new($label)
            .module(module_path!())
            .call($body)
    };
}
