//! `brewfile` binary.
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use brewfile_cli::cli::Cli;
use brewfile_cli::commands;
use brewfile_cli::logging::{self, Logger};
use brewfile_cli::render::Style;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let style = Style::detect(args.global.no_color);
    let command = args.command.as_ref().map_or("reconcile", |c| c.log_name());
    logging::init_subscriber(args.verbose, command, style);
    let log = Arc::new(Logger::new(command));

    match commands::run(&args, log.clone(), style) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
