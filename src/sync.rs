//! Remote synchronization and symlink restore.
use crate::engine::Lnk;
use crate::error::Result;
use crate::fs;
use crate::git::{GitBackend, RepoStatus};
use crate::paths::is_valid_relative;

/// Commit message used by [`Lnk::push`] when none is given.
pub const DEFAULT_PUSH_MESSAGE: &str = "lnk: sync configuration files";

impl<G: GitBackend> Lnk<G> {
    /// Ahead/behind counts and dirtiness relative to the remote.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LnkError::NoRemote`] without a remote.
    pub fn status(&self) -> Result<RepoStatus> {
        self.ensure_initialized()?;
        self.git().status()
    }

    /// Commit any pending changes and push.  Returns `true` if a commit was
    /// made.
    ///
    /// # Errors
    ///
    /// Returns the backend error if staging, committing or pushing fails.
    pub fn push(&self, message: Option<&str>) -> Result<bool> {
        self.ensure_initialized()?;
        let committed = if self.git().has_changes()? {
            self.git().add_all()?;
            self.git().commit(message.unwrap_or(DEFAULT_PUSH_MESSAGE))?;
            true
        } else {
            false
        };
        self.git().push()?;
        Ok(committed)
    }

    /// Pull from the remote, then restore symlinks for this host.  Returns
    /// the entries whose symlinks were (re)created.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the pull fails, or a filesystem error
    /// from restore.
    pub fn pull(&self) -> Result<Vec<String>> {
        self.ensure_initialized()?;
        self.git().pull()?;
        self.restore()
    }

    /// Make every manifest entry whose payload exists reachable through a
    /// correct symlink, replacing whatever occupies the link location.
    /// Entries with a missing payload are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or a link cannot be
    /// replaced.
    pub fn restore(&self) -> Result<Vec<String>> {
        self.ensure_initialized()?;
        let mut restored = Vec::new();
        for rel in self.manifest().read()? {
            if !is_valid_relative(&rel) {
                tracing::warn!("skipping invalid manifest entry '{rel}'");
                continue;
            }
            let payload = self.layout().payload_path(self.host(), &rel);
            if !fs::exists(&payload) {
                tracing::debug!("payload for {rel} missing, not restoring");
                continue;
            }
            let link = self.layout().symlink_path(&rel);
            if fs::is_valid_symlink(&link, &payload) {
                continue;
            }
            fs::remove_any(&link)?;
            fs::create_symlink(&payload, &link)?;
            tracing::debug!("restored {rel}");
            restored.push(rel);
        }
        Ok(restored)
    }
}
