use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;
use ykmx_core::{init_logging, AppDirs, Config, LogLevel};
use ykmx_plugin::{run_stdio, validate_action_line, ExitReason, PanelDemo};

#[derive(Debug, Parser)]
#[command(
    name = "ykmx-panel-demo",
    version,
    about = "Panel demo plugin for the ykmx plugin protocol"
)]
struct Cli {
    /// Config file to load instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Keep config and logs under this directory
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Mirror logs to stderr
    #[arg(long, global = true)]
    log_stderr: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Speak the plugin protocol on stdin/stdout (the default)
    Run,
    /// Check action lines read from stdin against the protocol schema
    Validate,
}

#[derive(Debug, Error)]
#[error("{invalid} of {checked} action lines failed validation")]
struct InvalidActions {
    checked: usize,
    invalid: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ValidationReport {
    checked: usize,
    invalid: usize,
}

/// Validate every non-blank line of `input`, writing one verdict per line to `out`.
fn validate_lines<R: BufRead, W: Write>(input: R, mut out: W) -> std::io::Result<ValidationReport> {
    let mut report = ValidationReport::default();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        report.checked += 1;
        match validate_action_line(&line) {
            Ok(message) => writeln!(out, "line {}: ok {}", index + 1, message.action.kind())?,
            Err(err) => {
                report.invalid += 1;
                writeln!(out, "line {}: invalid: {err}", index + 1)?;
            }
        }
    }
    Ok(report)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = match &cli.state_dir {
        Some(root) => AppDirs::under(root),
        None => AppDirs::discover()?,
    };
    let mut config = match &cli.config {
        Some(path) => {
            dirs.ensure_exists()?;
            Config::load_from(path)?
        }
        None => Config::load_or_default(&dirs)?,
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.log_stderr {
        config.logging.stderr = true;
    }
    let _logging = init_logging(&config.logging, &dirs)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            tracing::info!(
                open_command = %config.panel_demo.open_command,
                config_dir = %dirs.config_dir().display(),
                "starting panel demo plugin"
            );
            let mut plugin = PanelDemo::new(config.panel_demo);
            let summary = run_stdio(&mut plugin)?;
            if summary.exit == ExitReason::EndOfInput {
                tracing::info!("host closed stdin before shutdown");
            }
        }
        Command::Validate => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            let report = validate_lines(stdin.lock(), stdout.lock())?;
            if report.invalid > 0 {
                return Err(InvalidActions {
                    checked: report.checked,
                    invalid: report.invalid,
                }
                .into());
            }
        }
    }

    Ok(())
}
