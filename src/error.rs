//! Error types for steplog
//!
//! Only configuration, reading and sink I/O surface errors. Failures of the
//! operations being timed are never wrapped here; they flow back to the
//! caller untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the steplog library
#[derive(Error, Debug)]
pub enum StepLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid log level: {0} (expected trace, debug, info, warn or error)")]
    InvalidLevel(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("Failed to append to sink {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for steplog operations
pub type Result<T> = std::result::Result<T, StepLogError>;
