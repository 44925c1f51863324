//! Timing record data model and JSON-line serialization
//!
//! A [`TimingRecord`] is built once per instrumented operation and never
//! mutated afterwards. Its wire form is a single-line JSON object; see
//! [`TimingRecord::to_json_line`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::run_context::get_run_context;
use crate::session::current_user;

/// Outcome of an instrumented operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Failure => "failure",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied structured metadata attached to a record
///
/// Values that cannot be represented as JSON are stored as their `Debug`
/// string instead, so a record is never rejected because of its extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extra(BTreeMap<String, serde_json::Value>);

impl Extra {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a serializable value, falling back to its `Debug` form
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Serialize + fmt::Debug,
    {
        let value = serde_json::to_value(&value)
            .unwrap_or_else(|_| serde_json::Value::String(format!("{:?}", value)));
        self.0.insert(key.into(), value);
    }

    /// Insert any displayable value as a string
    pub fn insert_display(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.0
            .insert(key.into(), serde_json::Value::String(value.to_string()));
    }

    /// Builder-style [`Extra::insert`]
    pub fn with<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Serialize + fmt::Debug,
    {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`, later keys winning
    pub fn extend(&mut self, other: Extra) {
        self.0.extend(other.0);
    }
}

/// Identifies an instrumented call site
#[derive(Debug, Clone, Default)]
pub struct CallSite {
    pub module: String,
    pub function: String,
    pub step: String,
    /// Identity override; `None` means the OS user
    pub user: Option<String>,
}

/// Start of a timing window
///
/// Wall-clock start is truncated to microseconds and the elapsed time comes
/// from a monotonic clock, rounded to the nearest microsecond. The end time
/// is derived from that rounded value, so `end - start` always equals the
/// recorded duration exactly.
#[derive(Debug, Clone, Copy)]
pub struct Started {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl Started {
    pub fn now() -> Self {
        let now = Utc::now();
        let wall = DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now);
        Self {
            wall,
            mono: Instant::now(),
        }
    }

    /// Close the window
    pub fn finish(self) -> Window {
        let elapsed = self.mono.elapsed();
        self.close_after(elapsed)
    }

    /// Close the window `elapsed` after the start, rounded to the nearest
    /// microsecond
    fn close_after(self, elapsed: Duration) -> Window {
        let micros = i64::try_from((elapsed.as_nanos() + 500) / 1000).unwrap_or(i64::MAX);
        let end = self
            .wall
            .checked_add_signed(chrono::TimeDelta::microseconds(micros))
            .unwrap_or(self.wall);
        Window {
            start: self.wall,
            end,
            micros,
        }
    }
}

/// A closed timing window
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    micros: i64,
}

impl Window {
    /// Duration in seconds at microsecond precision
    pub fn duration_seconds(&self) -> f64 {
        self.micros as f64 / 1_000_000.0
    }
}

/// One structured entry describing a single instrumented operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub id: String,
    pub timestamp_utc: String,
    pub user: String,
    #[serde(default)]
    pub run_id: Option<String>,
    pub module: String,
    pub function: String,
    pub step: String,
    pub start_iso: String,
    pub end_iso: String,
    pub duration_seconds: f64,
    pub status: Status,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub extra: Extra,
}

impl TimingRecord {
    /// Build a record for the calling thread
    ///
    /// `run_id` is read from the calling thread's run context.
    pub fn build(
        site: &CallSite,
        window: Window,
        status: Status,
        notes: Option<String>,
        extra: Extra,
    ) -> Self {
        let user = match &site.user {
            Some(user) => user.clone(),
            None => current_user(),
        };

        TimingRecord {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            user,
            run_id: get_run_context(),
            module: site.module.clone(),
            function: site.function.clone(),
            step: site.step.clone(),
            start_iso: window.start.to_rfc3339_opts(SecondsFormat::Micros, true),
            end_iso: window.end.to_rfc3339_opts(SecondsFormat::Micros, true),
            duration_seconds: window.duration_seconds(),
            status,
            notes: notes.unwrap_or_default(),
            extra,
        }
    }

    /// Serialize to a single JSON line (no trailing newline)
    ///
    /// Never fails: if serde rejects the record, a minimal object carrying
    /// the id and the record's `Debug` form is produced instead.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            serde_json::json!({
                "id": self.id,
                "status": self.status.as_str(),
                "unserializable": format!("{:?}", self),
            })
            .to_string()
        })
    }
}
