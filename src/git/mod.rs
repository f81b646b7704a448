//! Git backend.
//!
//! The engine talks to version control only through [`GitBackend`].  The
//! production implementation, [`SystemGit`], shells out to the `git`
//! executable for anything that touches the index, history or network, and
//! reads repository state through `git2`.
mod system;

use std::path::Path;

use crate::error::Result;

pub use system::SystemGit;

/// Branch name used for newly initialized repositories.
pub const DEFAULT_BRANCH: &str = "main";

/// Snapshot of repository state relative to its remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// Commits on the local branch not on its upstream.
    pub ahead: usize,
    /// Commits on the upstream not on the local branch.
    pub behind: usize,
    /// Working tree or index differs from `HEAD`.
    pub dirty: bool,
    /// URL of the remote used for push and pull.
    pub remote_url: String,
    /// Current branch, `None` on a detached head.
    pub branch: Option<String>,
}

impl RepoStatus {
    /// Returns `true` if the repository matches its remote and has no local
    /// changes.
    #[must_use]
    pub const fn is_up_to_date(&self) -> bool {
        self.ahead == 0 && self.behind == 0 && !self.dirty
    }
}

/// Version control operations the engine relies on.
///
/// Paths are relative to the repository root.
#[cfg_attr(test, mockall::automock)]
pub trait GitBackend {
    /// Create an empty repository on [`DEFAULT_BRANCH`].
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be created.
    fn init(&self) -> Result<()>;

    /// Clone `url` into the repository root.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails.
    fn clone_from(&self, url: &str) -> Result<()>;

    /// Stage `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if staging fails.
    fn add(&self, path: &Path) -> Result<()>;

    /// Stage the removal of `path` from the index, keeping the working copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be updated.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Reset the index entry for `path` to `HEAD` (or drop it before the
    /// first commit).
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be updated.
    fn unstage(&self, path: &Path) -> Result<()>;

    /// Stage every change in the working tree.
    ///
    /// # Errors
    ///
    /// Returns an error if staging fails.
    fn add_all(&self) -> Result<()>;

    /// Commit the index with `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn commit(&self, message: &str) -> Result<()>;

    /// Returns `true` if the working tree or index has uncommitted changes,
    /// including untracked files.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    fn has_changes(&self) -> Result<bool>;

    /// Report ahead/behind counts, dirtiness and the remote.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LnkError::NoRemote`] if no remote is configured.
    fn status(&self) -> Result<RepoStatus>;

    /// Push the current branch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LnkError::NoRemote`] if no remote is configured.
    fn push(&self) -> Result<()>;

    /// Fast-forward the current branch from its remote.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LnkError::NoRemote`] if no remote is configured.
    fn pull(&self) -> Result<()>;
}
