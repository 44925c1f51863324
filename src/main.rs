use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use steplog::{
    cli::{Cli, Commands, OutputFormat},
    command::{run_command, CommandError, CommandOutcome},
    read_sink, set_run_context, Extra, RecorderConfig, Summary,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; record echoes go to stderr
fn init_tracing(debug: bool, quiet: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn summarize(file: &Path, format: OutputFormat, step: Option<&str>) -> Result<()> {
    let outcome =
        read_sink(file).with_context(|| format!("Failed to read sink {}", file.display()))?;

    let records = match step {
        Some(pattern) => {
            let re = Regex::new(pattern)
                .with_context(|| format!("Invalid --step regex: {}", pattern))?;
            outcome
                .records
                .into_iter()
                .filter(|r| re.is_match(&r.step))
                .collect()
        }
        None => outcome.records,
    };

    let summary = Summary::from_records(&records);
    match format {
        OutputFormat::Text => print!("{}", summary.render_text()),
        OutputFormat::Json => println!("{}", summary.to_json()?),
    }

    if outcome.skipped > 0 {
        eprintln!("Skipped {} malformed line(s)", outcome.skipped);
    }
    Ok(())
}

fn command_extras(command: &[String], result: &Result<CommandOutcome, CommandError>) -> Extra {
    let (exit_code, stdout_bytes) = match result {
        Ok(outcome) => (outcome.exit_code, outcome.stdout.len()),
        Err(err) => (err.exit_code(), err.stdout().len()),
    };
    Extra::new()
        .with("command", command)
        .with("exit_code", exit_code)
        .with("stdout_bytes", stdout_bytes)
}

/// Run an external command under a recorder; returns the exit code to use
fn run(config: &RecorderConfig, step: Option<String>, command: Vec<String>) -> Result<i32> {
    if let Some(run_id) = &config.run_id {
        set_run_context(run_id.clone());
    }

    let program = command.first().cloned().unwrap_or_default();
    let mut recorder = config.recorder(program)?.module("steplog::run");
    if let Some(step) = step {
        recorder = recorder.step(step);
    }

    let result = recorder.call_with(|| run_command(&command), |r| command_extras(&command, r));

    let mut stdout = std::io::stdout();
    match result {
        Ok(outcome) => {
            stdout.write_all(&outcome.stdout)?;
            std::io::stderr().write_all(&outcome.stderr)?;
            Ok(0)
        }
        Err(err) => {
            stdout.write_all(err.stdout())?;
            eprintln!("{}", err);
            Ok(err.exit_code())
        }
    }
}

/// Demo workload: a timed function, a timed block and a method-style call
fn demo(config: &RecorderConfig, sink: Option<PathBuf>) -> Result<()> {
    let sink = sink
        .or_else(|| config.sink.clone())
        .unwrap_or_else(|| PathBuf::from("timings").join("demo-session.jsonl"));
    let config = RecorderConfig {
        sink: Some(sink.clone()),
        ..config.clone()
    };

    set_run_context(config.run_id.clone().unwrap_or_else(|| "manual-demo".to_string()));

    let slow_square = |x: u64| {
        thread::sleep(Duration::from_millis(200));
        x * x
    };
    let squared = config
        .recorder("slow_square")?
        .module("steplog::demo")
        .measure(|| slow_square(3));

    config.timer("demo-block")?.time(|| {
        thread::sleep(Duration::from_millis(50));
        Ok::<(), std::io::Error>(())
    })?;

    config
        .recorder("P::run")?
        .module("steplog::demo")
        .step("run")
        .measure(|| thread::sleep(Duration::from_millis(100)));

    eprintln!("slow_square(3) = {}", squared);
    eprintln!("Timings written to {}", sink.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug, args.quiet);

    let config = RecorderConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Summarize { file, format, step } => summarize(&file, format, step.as_deref()),
        Commands::Run {
            step,
            sink,
            run_id,
            user,
            command,
        } => {
            let config = RecorderConfig {
                sink: sink.or(config.sink),
                run_id: run_id.or(config.run_id),
                user: user.or(config.user),
                ..config
            };
            let code = run(&config, step, command)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Demo { sink } => demo(&config, sink),
    }
}
