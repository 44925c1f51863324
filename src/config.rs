//! Recorder configuration
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML
//! file, `STEPLOG_*` environment variables. Command-line flags are applied
//! on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::emit::parse_level;
use crate::error::{Result, StepLogError};
use crate::recorder::Recorder;
use crate::scope::Timer;

pub const ENV_SINK: &str = "STEPLOG_SINK";
pub const ENV_USER: &str = "STEPLOG_USER";
pub const ENV_RUN_ID: &str = "STEPLOG_RUN_ID";
pub const ENV_LEVEL: &str = "STEPLOG_LEVEL";
pub const ENV_INCLUDE_TRACE: &str = "STEPLOG_INCLUDE_TRACE";

/// Settings shared by every recorder and timer a program creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// JSONL sink; records are only logged when unset
    pub sink: Option<PathBuf>,

    /// Identity override
    pub user: Option<String>,

    /// Run id to install as the run context of the main thread
    pub run_id: Option<String>,

    /// Level of the record echo on the log stream
    #[serde(default = "default_level")]
    pub level: String,

    /// Backtrace in failure notes
    #[serde(default = "default_include_trace")]
    pub include_trace: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_include_trace() -> bool {
    true
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sink: None,
            user: None,
            run_id: None,
            level: default_level(),
            include_trace: default_include_trace(),
        }
    }
}

impl RecorderConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.log_level()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Defaults, then `file` if given, then the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env()
    }

    /// Apply `STEPLOG_*` overrides; values are taken verbatim
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(sink) = std::env::var(ENV_SINK) {
            self.sink = Some(PathBuf::from(sink));
        }
        if let Ok(user) = std::env::var(ENV_USER) {
            self.user = Some(user);
        }
        if let Ok(run_id) = std::env::var(ENV_RUN_ID) {
            self.run_id = Some(run_id);
        }
        if let Ok(level) = std::env::var(ENV_LEVEL) {
            self.level = level;
        }
        if let Ok(flag) = std::env::var(ENV_INCLUDE_TRACE) {
            self.include_trace = parse_bool(&flag).ok_or_else(|| StepLogError::InvalidEnv {
                key: ENV_INCLUDE_TRACE.to_string(),
                value: flag.clone(),
            })?;
        }
        self.log_level()?;
        Ok(self)
    }

    pub fn log_level(&self) -> Result<Level> {
        parse_level(&self.level).ok_or_else(|| StepLogError::InvalidLevel(self.level.clone()))
    }

    /// A recorder carrying these settings
    pub fn recorder(&self, function: impl Into<String>) -> Result<Recorder> {
        let mut recorder = Recorder::new(function)
            .sink_opt(self.sink.clone())
            .level(self.log_level()?)
            .include_trace(self.include_trace);
        if let Some(user) = &self.user {
            recorder = recorder.user(user.clone());
        }
        Ok(recorder)
    }

    /// A block timer carrying these settings
    pub fn timer(&self, step: impl Into<String>) -> Result<Timer> {
        let mut timer = Timer::new(step)
            .sink_opt(self.sink.clone())
            .level(self.log_level()?);
        if let Some(user) = &self.user {
            timer = timer.user(user.clone());
        }
        Ok(timer)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
