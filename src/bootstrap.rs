//! Bootstrap script runner.
//!
//! A repository may carry a `bootstrap.sh` at its root.  It runs with the
//! repository as working directory and the terminal attached.
use std::path::{Path, PathBuf};

use crate::engine::Lnk;
use crate::error::{LnkError, Result};
use crate::exec;
use crate::fs;
use crate::git::GitBackend;
use crate::paths::BOOTSTRAP_SCRIPT;

/// Location of the bootstrap script, if the repository has one.
#[must_use]
pub fn find_script(repo_root: &Path) -> Option<PathBuf> {
    let script = repo_root.join(BOOTSTRAP_SCRIPT);
    script.is_file().then_some(script)
}

/// Run the bootstrap script in `repo_root`.  Returns `false` if there is
/// none.
///
/// # Errors
///
/// Returns [`LnkError::BootstrapFailed`] if the script exits non-zero, or a
/// filesystem error if it cannot be made executable or started.
pub fn run_script(repo_root: &Path) -> Result<bool> {
    let Some(script) = find_script(repo_root) else {
        tracing::debug!("no {BOOTSTRAP_SCRIPT} in {}", repo_root.display());
        return Ok(false);
    };
    fs::make_executable(&script)?;
    tracing::info!("running {}", script.display());
    let status = exec::run_interactive(repo_root, "sh", &[BOOTSTRAP_SCRIPT])
        .map_err(|e| LnkError::fs("run", &script, e))?;
    if status.success() {
        Ok(true)
    } else {
        Err(LnkError::BootstrapFailed {
            code: status.code(),
        })
    }
}

impl<G: GitBackend> Lnk<G> {
    /// Run the repository's bootstrap script.  Returns `false` if there is
    /// none.
    ///
    /// # Errors
    ///
    /// Returns [`LnkError::NotInitialized`] or any error from [`run_script`].
    pub fn bootstrap(&self) -> Result<bool> {
        self.ensure_initialized()?;
        run_script(self.layout().repo_root())
    }
}
