//! CLI entry point for the otoro word-distance search.
//!
//! Parses command-line arguments with clap, runs the selected command
//! against stdin/stdout, and maps errors to appropriate exit codes. Logging
//! is initialised eagerly so subsequent operations can emit structured
//! diagnostics via `tracing`.

use std::io::{self, BufWriter};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use otoro_cli::{
    cli::{Cli, CliError, run_cli},
    logging::{self, LoggingError},
};
use tracing::error;

/// Parse CLI arguments and execute the command over stdin/stdout.
fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let stdin = io::stdin();
    let stdout = io::stdout();
    let writer = BufWriter::new(stdout.lock());
    run_cli(cli, stdin.lock(), writer).context("failed to execute command")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(cli_error) = err.downcast_ref::<CliError>() {
                log_cli_error(cli_error);
            } else {
                error!(error = %err, "command execution failed");
            }
            ExitCode::FAILURE
        }
    }
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialised"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}

fn log_cli_error(err: &CliError) {
    match err {
        CliError::Core(core) => error!(
            error = %core,
            code = %core.code(),
            "command execution failed"
        ),
        _ => error!(error = %err, "command execution failed"),
    }
}
