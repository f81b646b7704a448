//! Push command implementation.
use anyhow::Result;

use crate::cli::PushOpts;
use crate::config::CommandOptions;
use crate::logging::Logger;
use crate::sync::DEFAULT_PUSH_MESSAGE;

/// Commit pending changes, then push.
///
/// # Errors
///
/// Returns an error if there is no remote or any Git step fails.
pub fn run(opts: &PushOpts, log: &Logger) -> Result<()> {
    let options = CommandOptions::from(opts);
    let lnk = super::open(&options)?;
    let message = options.message.as_deref();

    log.stage("Pushing");
    if lnk.push(message)? {
        log.info(&format!(
            "committed: {}",
            message.unwrap_or(DEFAULT_PUSH_MESSAGE)
        ));
    } else {
        log.debug("nothing to commit");
    }
    log.info("pushed to remote");
    Ok(())
}
