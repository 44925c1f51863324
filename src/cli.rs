//! CLI argument parsing for steplog

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "steplog")]
#[command(version)]
#[command(about = "Structured JSONL timing records for scripted checks", long_about = None)]
pub struct Cli {
    /// TOML config file (sink, user, run_id, level, include_trace)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable trace-level diagnostic output on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only show warnings and errors on stderr
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a JSONL sink per step
    Summarize {
        /// Sink file to read
        file: PathBuf,

        /// Output format
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only include steps matching this regex
        #[arg(long = "step", value_name = "REGEX")]
        step: Option<String>,
    },

    /// Run a command and record its timing
    Run {
        /// Step name (defaults to the program name)
        #[arg(long)]
        step: Option<String>,

        /// Sink file to append the record to
        #[arg(long, value_name = "PATH")]
        sink: Option<PathBuf>,

        /// Run id for the record
        #[arg(long = "run-id", value_name = "ID")]
        run_id: Option<String>,

        /// Identity override
        #[arg(long)]
        user: Option<String>,

        /// Command to run (everything after --)
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Write a few sample records
    Demo {
        /// Sink file (default: timings/demo-session.jsonl)
        #[arg(long, value_name = "PATH")]
        sink: Option<PathBuf>,
    },
}
