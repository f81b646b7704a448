//! Top-level subcommand orchestration.
//!
//! Each handler builds an [`Lnk`] engine from the environment and the
//! command's options, runs one engine operation and reports through the
//! [`Logger`].  Typed errors become [`anyhow::Error`] here.
pub mod add;
pub mod bootstrap;
pub mod completions;
pub mod doctor;
pub mod init;
pub mod list;
pub mod pull;
pub mod push;
pub mod rm;
pub mod status;

use anyhow::Result;

use crate::cli::Command;
use crate::config::{CommandOptions, Settings};
use crate::engine::Lnk;
use crate::logging::Logger;

/// Run the selected subcommand.
///
/// # Errors
///
/// Returns the error of the handler that ran.
pub fn run(command: &Command, log: &Logger) -> Result<()> {
    match command {
        Command::Init(opts) => init::run(opts, log),
        Command::Add(opts) => add::run(opts, log),
        Command::Rm(opts) => rm::run(opts, log),
        Command::List(opts) => list::run(opts, log),
        Command::Status => status::run(log),
        Command::Push(opts) => push::run(opts, log),
        Command::Pull(opts) => pull::run(opts, log),
        Command::Doctor(opts) => doctor::run(opts, log),
        Command::Bootstrap => bootstrap::run(log),
        Command::Completions(opts) => {
            completions::run(opts);
            Ok(())
        }
    }
}

/// Engine for the host named in `options`, rooted at the configured
/// repository.
///
/// # Errors
///
/// Returns an error if the home directory is unknown or the host label is
/// invalid.
pub fn open(options: &CommandOptions) -> Result<Lnk> {
    let settings = Settings::from_env()?;
    let host = options.host()?;
    let lnk = Lnk::open(settings.layout(), host);
    tracing::debug!(
        "repository {} (host {})",
        lnk.layout().repo_root().display(),
        lnk.host()
    );
    Ok(lnk)
}

/// `~/rel` for display.
pub(crate) fn tilde(rel: &str) -> String {
    format!("~/{rel}")
}

/// `"1 file"` / `"3 files"`.
pub(crate) fn files(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{count} files")
    }
}
