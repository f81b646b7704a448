//! Init command implementation.
use anyhow::Result;

use crate::cli::InitOpts;
use crate::config::CommandOptions;
use crate::engine::InitOutcome;
use crate::logging::Logger;

/// Run the init command.
///
/// # Errors
///
/// Returns an error if the repository cannot be created or cloned, if an
/// existing repository would be clobbered without `--force`, or if the
/// bootstrap script fails.
pub fn run(opts: &InitOpts, log: &Logger) -> Result<()> {
    let options = CommandOptions::from(opts);
    let lnk = super::open(&options)?;
    let root = lnk.layout().repo_root().display().to_string();

    let outcome = match &options.remote_url {
        Some(url) => {
            log.stage(&format!("Cloning {url}"));
            lnk.init_from_remote(url, options.force, !options.no_bootstrap)?
        }
        None => {
            log.stage("Initializing repository");
            lnk.init(options.force)?
        }
    };

    match outcome {
        InitOutcome::Created => log.info(&format!("created {root}")),
        InitOutcome::AlreadyInitialized => log.info(&format!("{root} is already initialized")),
        InitOutcome::Cloned { bootstrapped } => {
            log.info(&format!("cloned into {root}"));
            if bootstrapped {
                log.info("bootstrap completed");
            }
            log.info("run `lnk pull` to create symlinks for managed files");
        }
    }
    Ok(())
}
