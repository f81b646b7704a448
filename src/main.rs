//! `lnk` command-line entry point.
use std::process::ExitCode;

use clap::Parser;
use lnk::error::LnkError;
use lnk::{cli, commands, logging};

fn main() -> ExitCode {
    let args = cli::Cli::parse();
    let name = args.command.name();
    logging::init_subscriber(args.verbose, name);
    let log = logging::Logger::new(name);

    match commands::run(&args.command, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&e.to_string());
            if let Some(hint) = e.downcast_ref::<LnkError>().and_then(LnkError::hint) {
                log.info(hint);
            }
            if let Some(path) = log.log_path() {
                log.debug(&format!("log written to {}", path.display()));
            }
            ExitCode::FAILURE
        }
    }
}
