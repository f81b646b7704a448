//! Pull command implementation.
use anyhow::Result;

use super::{files, tilde};
use crate::cli::PullOpts;
use crate::config::CommandOptions;
use crate::logging::Logger;

/// Pull from the remote and restore symlinks for the selected host.
///
/// # Errors
///
/// Returns an error if there is no remote, the pull fails, or a symlink
/// cannot be restored.
pub fn run(opts: &PullOpts, log: &Logger) -> Result<()> {
    let options = CommandOptions::from(opts);
    let lnk = super::open(&options)?;

    log.stage("Pulling");
    let restored = lnk.pull()?;
    for rel in &restored {
        log.info(&format!("restored {}", tilde(rel)));
    }
    log.info(&format!("{} restored for {}", files(restored.len()), lnk.host()));
    Ok(())
}
