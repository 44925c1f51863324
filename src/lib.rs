//! steplog - structured JSONL timing records for scripted checks
//!
//! Wrap a callable with [`Recorder`] or a block with [`Timer`]; each run
//! emits one [`TimingRecord`] to the `tracing` log stream and, optionally,
//! appends it as one JSON line to a sink file. Records carry the calling
//! thread's run context so that a session's records can be grouped later.
//!
//! The recorder only observes: errors and panics from the timed code reach
//! the caller unchanged, and sink failures are logged, never returned.

pub mod cli;
pub mod command;
pub mod config;
pub mod emit;
pub mod error;
pub mod reader;
pub mod record;
pub mod recorder;
pub mod run_context;
pub mod scope;
pub mod session;
pub mod sink;
pub mod summary;

pub use config::RecorderConfig;
pub use error::{Result, StepLogError};
pub use reader::{read_sink, ReadOutcome};
pub use record::{Extra, Status, TimingRecord};
pub use recorder::Recorder;
pub use run_context::{clear_run_context, get_run_context, set_run_context};
pub use scope::{Timer, TimerGuard};
pub use session::{current_user, Session};
pub use summary::Summary;
