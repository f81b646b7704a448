//! Repository initialization, locally or from a remote.
use std::os::unix::fs::DirBuilderExt as _;

use super::Lnk;
use crate::bootstrap;
use crate::error::{LnkError, Result};
use crate::fs;
use crate::git::GitBackend;
use crate::manifest;
use crate::paths::Host;

/// What [`Lnk::init`] or [`Lnk::init_from_remote`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A new empty repository was created.
    Created,
    /// An lnk repository was already present; nothing changed.
    AlreadyInitialized,
    /// The remote was cloned.
    Cloned {
        /// Whether a bootstrap script ran after cloning.
        bootstrapped: bool,
    },
}

impl<G: GitBackend> Lnk<G> {
    /// Create the repository if needed.  Idempotent on an lnk repository.
    ///
    /// # Errors
    ///
    /// Returns [`LnkError::ExistingNonLnkRepo`] if the root holds some other
    /// Git repository and `force` is not set.
    pub fn init(&self, force: bool) -> Result<InitOutcome> {
        let root = self.layout.repo_root();
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(root)
            .map_err(|e| LnkError::fs("create directory", root, e))?;

        if self.is_initialized() {
            if force || self.looks_like_lnk_repo()? {
                return Ok(InitOutcome::AlreadyInitialized);
            }
            return Err(LnkError::ExistingNonLnkRepo {
                path: root.to_path_buf(),
            });
        }
        self.git.init()?;
        tracing::debug!("initialized {}", root.display());
        Ok(InitOutcome::Created)
    }

    /// Clone `url` into the repository root, then run its bootstrap script
    /// unless `run_bootstrap` is false.
    ///
    /// # Errors
    ///
    /// Without `force`, returns [`LnkError::ContainsManagedFiles`] if the
    /// existing repository manages files, or [`LnkError::ExistingNonLnkRepo`]
    /// if it is not an lnk repository.  Clone and bootstrap failures are
    /// returned as is.
    pub fn init_from_remote(
        &self,
        url: &str,
        force: bool,
        run_bootstrap: bool,
    ) -> Result<InitOutcome> {
        let root = self.layout.repo_root();
        if self.is_initialized() {
            if !force {
                if self.has_managed_files()? {
                    return Err(LnkError::ContainsManagedFiles {
                        path: root.to_path_buf(),
                    });
                }
                if !self.looks_like_lnk_repo()? {
                    return Err(LnkError::ExistingNonLnkRepo {
                        path: root.to_path_buf(),
                    });
                }
            }
            tracing::debug!("replacing {} with a clone of {url}", root.display());
            fs::remove_any(root)?;
        } else if force && fs::exists(root) {
            fs::remove_any(root)?;
        }

        self.git.clone_from(url)?;
        let bootstrapped = run_bootstrap && bootstrap::run_script(root)?;
        Ok(InitOutcome::Cloned { bootstrapped })
    }

    /// An lnk repository has a manifest at its root, or nothing but `.git`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository root cannot be listed.
    pub fn looks_like_lnk_repo(&self) -> Result<bool> {
        let root = self.layout.repo_root();
        let entries = std::fs::read_dir(root).map_err(|e| LnkError::fs("list", root, e))?;
        let mut other = false;
        for entry in entries {
            let name = entry.map_err(|e| LnkError::fs("list", root, e))?.file_name();
            let Some(name) = name.to_str() else {
                other = true;
                continue;
            };
            if Host::from_manifest_file_name(name).is_some() {
                return Ok(true);
            }
            if name != ".git" {
                other = true;
            }
        }
        Ok(!other)
    }

    /// Returns `true` if any host's manifest lists at least one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a manifest cannot be read.
    pub fn has_managed_files(&self) -> Result<bool> {
        for (_, m) in manifest::discover(&self.layout)? {
            if !m.read()?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
