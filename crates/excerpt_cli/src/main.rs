//! `excerpt` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, start logging, dispatch one subcommand.
//! - Map failures to exit codes: 2 for caller mistakes, 1 otherwise.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use excerpt_core::{init_logging, LogSink, ServiceError};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let sink = match cli.log_dir.clone() {
        Some(dir) => LogSink::Directory(dir),
        None => LogSink::Stderr,
    };
    if let Err(err) = init_logging(cli.effective_log_level(), sink) {
        eprintln!("error: {err}");
        return ExitCode::from(2);
    }

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ServiceError>() {
        Some(err) if err.is_caller_error() => 2,
        _ => 1,
    }
}
