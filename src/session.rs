//! Session helpers
//!
//! A session is one interactive test run: a run id derived from the user and
//! the UTC start time, set as the run context of the starting thread, with
//! records collected in `timings/session-{run_id}.jsonl`.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::recorder::Recorder;
use crate::run_context::set_run_context;
use crate::scope::Timer;

/// Directory under the session root that holds sink files
pub const TIMINGS_DIR: &str = "timings";

const USER_ENV_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

/// The acting OS user
///
/// Environment variables win over the password database so that service
/// accounts and containers can set the identity explicitly.
pub fn current_user() -> String {
    USER_ENV_VARS
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
        .or_else(os_user)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
fn os_user() -> Option<String> {
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|user| user.name)
}

#[cfg(not(unix))]
fn os_user() -> Option<String> {
    None
}

/// `manual-{user}-{YYYYMMDDTHHMMSSZ}`
pub fn session_run_id(user: &str, now: DateTime<Utc>) -> String {
    format!("manual-{}-{}", user, now.format("%Y%m%dT%H%M%SZ"))
}

/// An open timing session
#[derive(Debug, Clone)]
pub struct Session {
    run_id: String,
    sink_path: PathBuf,
}

impl Session {
    /// Start a session rooted at `root` for the current user
    pub fn begin(root: impl AsRef<Path>) -> Result<Self> {
        let run_id = session_run_id(&current_user(), Utc::now());
        Self::with_run_id(root, run_id)
    }

    /// Start a session with an explicit run id
    ///
    /// Sets the calling thread's run context and creates the timings
    /// directory.
    pub fn with_run_id(root: impl AsRef<Path>, run_id: impl Into<String>) -> Result<Self> {
        let run_id = run_id.into();
        let dir = root.as_ref().join(TIMINGS_DIR);
        fs::create_dir_all(&dir)?;

        set_run_context(run_id.clone());
        tracing::debug!("session {} writing to {}", run_id, dir.display());

        let sink_path = dir.join(format!("session-{}.jsonl", run_id));
        Ok(Self { run_id, sink_path })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    /// A recorder that persists into this session
    pub fn recorder(&self, function: impl Into<String>) -> Recorder {
        Recorder::new(function).sink(self.sink_path.clone())
    }

    /// A block timer that persists into this session
    pub fn timer(&self, step: impl Into<String>) -> Timer {
        Timer::new(step).sink(self.sink_path.clone())
    }
}
