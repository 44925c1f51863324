//! External command execution with pass/fail classification
//!
//! A command fails when it cannot be spawned, exits non-zero, or writes the
//! word "error" (any case) to stderr. Output is captured for the caller.

use std::process::{Command, ExitStatus};
use thiserror::Error;

/// Captured output of a command that passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Why a command was classified as failed
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("no command given")]
    Empty,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
        stdout: Vec<u8>,
    },

    #[error("{program} reported an error on stderr: {stderr}")]
    StderrError {
        program: String,
        stderr: String,
        stdout: Vec<u8>,
    },
}

impl CommandError {
    /// Exit code to propagate; 1 when the child never ran or exited cleanly
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::NonZeroExit { code, .. } => *code,
            _ => 1,
        }
    }

    /// Captured stdout, if the child ran
    pub fn stdout(&self) -> &[u8] {
        match self {
            CommandError::NonZeroExit { stdout, .. } | CommandError::StderrError { stdout, .. } => {
                stdout
            }
            _ => &[],
        }
    }
}

/// Exit code as a shell reports it: `128 + signal` for a child killed by a
/// signal
#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Run `argv[0]` with the remaining arguments and classify the result
pub fn run_command(argv: &[String]) -> Result<CommandOutcome, CommandError> {
    let (program, args) = argv.split_first().ok_or(CommandError::Empty)?;

    tracing::debug!("spawning {} {:?}", program, args);
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stderr_text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let code = exit_code_of(output.status);

    if !output.status.success() {
        return Err(CommandError::NonZeroExit {
            program: program.clone(),
            code,
            stderr: stderr_text,
            stdout: output.stdout,
        });
    }
    if stderr_text.to_ascii_lowercase().contains("error") {
        return Err(CommandError::StderrError {
            program: program.clone(),
            stderr: stderr_text,
            stdout: output.stdout,
        });
    }

    Ok(CommandOutcome {
        exit_code: code,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
