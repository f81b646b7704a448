//! Bootstrap command implementation.
use anyhow::Result;

use crate::config::CommandOptions;
use crate::logging::Logger;
use crate::paths::BOOTSTRAP_SCRIPT;

/// Run the repository's bootstrap script.
///
/// # Errors
///
/// Returns an error if the repository is not initialized or the script
/// exits non-zero.
pub fn run(log: &Logger) -> Result<()> {
    let lnk = super::open(&CommandOptions::default())?;
    log.stage(&format!("Running {BOOTSTRAP_SCRIPT}"));
    if lnk.bootstrap()? {
        log.info("bootstrap completed");
    } else {
        log.info(&format!(
            "no {BOOTSTRAP_SCRIPT} in {}",
            lnk.layout().repo_root().display()
        ));
    }
    Ok(())
}
