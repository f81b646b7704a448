//! Rm command implementation.
use anyhow::Result;

use super::tilde;
use crate::cli::RmOpts;
use crate::config::CommandOptions;
use crate::logging::Logger;

/// Stop managing a file and move it back to where its symlink was.
///
/// # Errors
///
/// Returns an error if the path is not a managed symlink (unless
/// `--force`), or if any step fails.
pub fn run(opts: &RmOpts, log: &Logger) -> Result<()> {
    let options = CommandOptions::from(opts);
    let lnk = super::open(&options)?;

    log.stage(&format!("Removing from {}", lnk.host()));
    let rel = lnk.remove(&opts.path, options.force)?;
    log.info(&format!("removed {}", tilde(&rel)));
    Ok(())
}
