//! Transactional engine.
//!
//! [`Lnk`] ties a [`Layout`], a [`Host`] and a [`GitBackend`] together and
//! implements adopt, release and init.  Sync and doctor operations live in
//! [`crate::sync`] and [`crate::doctor`] as further `impl` blocks.
mod adopt;
mod init;
mod release;
pub mod rollback;

use std::path::PathBuf;

use crate::error::{LnkError, Result};
use crate::git::{GitBackend, SystemGit};
use crate::manifest::{self, Manifest};
use crate::paths::{Host, Layout};

pub use adopt::Candidate;
pub use init::InitOutcome;

/// Commit message prefix shared by every engine-authored commit.
pub const COMMIT_PREFIX: &str = "lnk:";

/// Managed-files engine for one host.
#[derive(Debug)]
pub struct Lnk<G = SystemGit> {
    layout: Layout,
    host: Host,
    git: G,
}

impl Lnk<SystemGit> {
    /// Engine backed by the system `git` for `layout`'s repository.
    #[must_use]
    pub fn open(layout: Layout, host: Host) -> Self {
        let git = SystemGit::new(layout.repo_root());
        Self::with_backend(layout, host, git)
    }
}

impl<G: GitBackend> Lnk<G> {
    /// Engine with an explicit Git backend.
    #[must_use]
    pub const fn with_backend(layout: Layout, host: Host, git: G) -> Self {
        Self { layout, host, git }
    }

    /// Paths in use.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Host this engine operates on.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// Git backend.
    #[must_use]
    pub const fn git(&self) -> &G {
        &self.git
    }

    /// Manifest for this engine's host.
    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest::for_host(&self.layout, &self.host)
    }

    /// Returns `true` if the repository root holds a Git working tree.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.layout.is_git_repo()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(LnkError::NotInitialized {
                repo: self.layout.repo_root().to_path_buf(),
            })
        }
    }

    /// Managed entries for this host, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not initialized or the
    /// manifest cannot be read.
    pub fn list(&self) -> Result<Vec<String>> {
        self.ensure_initialized()?;
        self.manifest().read()
    }

    /// Managed entries for every host that has a manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not initialized or a manifest
    /// cannot be read.
    pub fn list_all(&self) -> Result<Vec<(Host, Vec<String>)>> {
        self.ensure_initialized()?;
        manifest::discover(&self.layout)?
            .into_iter()
            .map(|(host, m)| Ok((host, m.read()?)))
            .collect()
    }

    /// Manifest location relative to the repository root, for staging.
    pub(crate) fn manifest_repo_path(&self) -> PathBuf {
        PathBuf::from(self.host.manifest_file_name())
    }
}

/// Last path component of a home-relative name, for commit messages.
pub(crate) fn basename(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn basename_takes_last_component() {
        assert_eq!(basename(".config/nvim/init.lua"), "init.lua");
        assert_eq!(basename(".bashrc"), ".bashrc");
    }
}
