//! Domain-specific error types for lnk.
//!
//! Core modules return [`LnkError`] so that callers can match on the failure
//! kind (e.g. [`LnkError::AlreadyManaged`]).  Command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via the standard `?` operator
//! and print [`LnkError::hint`] when one is available.
//!
//! # Error kinds
//!
//! ```text
//! LnkError
//! ├── NotInitialized / HomeNotFound        environment and repository state
//! ├── FileNotFound / InvalidPath           user input cannot be resolved
//! ├── UnsupportedType / NothingToAdd       input is not adoptable
//! ├── AlreadyManaged / NotManaged          manifest membership conflicts
//! ├── InvalidHost                          host label rejected
//! ├── ExistingNonLnkRepo / ContainsManagedFiles   init refuses to clobber
//! ├── GitOperation / NoRemote              backend failures
//! ├── BootstrapFailed                      bootstrap script exit status
//! └── Filesystem                           move/symlink/stat/write failures
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Git operations that can fail inside the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitOp {
    /// `git init`
    Init,
    /// `git clone`
    Clone,
    /// `git add`
    Add,
    /// `git rm --cached`
    Remove,
    /// `git reset` (unstage)
    Reset,
    /// `git commit`
    Commit,
    /// `git push`
    Push,
    /// `git pull`
    Pull,
    /// Status, remote and ref queries.
    Status,
}

impl fmt::Display for GitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Clone => "clone",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Reset => "reset",
            Self::Commit => "commit",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Status => "status",
        };
        f.write_str(name)
    }
}

/// Top-level error type for lnk.
#[derive(Error, Debug)]
pub enum LnkError {
    /// The repository root has no Git working tree.
    #[error("lnk repository not initialized at {}", .repo.display())]
    NotInitialized {
        /// Repository root that was probed.
        repo: PathBuf,
    },

    /// The home directory cannot be determined.
    #[error("cannot determine home directory")]
    HomeNotFound,

    /// A user-supplied path does not exist.
    #[error("file not found: {}", .path.display())]
    FileNotFound {
        /// Path as supplied.
        path: PathBuf,
    },

    /// A user-supplied path cannot be resolved or is not adoptable.
    #[error("invalid path {}: {reason}", .path.display())]
    InvalidPath {
        /// Path as supplied.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// The path is neither a regular file nor a directory.
    #[error("unsupported file type: {}", .path.display())]
    UnsupportedType {
        /// Offending path.
        path: PathBuf,
    },

    /// Recursive expansion produced no files.
    #[error("nothing to add")]
    NothingToAdd,

    /// The home-relative path is already listed in the manifest.
    #[error("already managed: {rel}")]
    AlreadyManaged {
        /// Home-relative path.
        rel: String,
    },

    /// The path is not managed by lnk.
    #[error("not managed by lnk: {}", .path.display())]
    NotManaged {
        /// Offending path.
        path: PathBuf,
    },

    /// Host label cannot be used as a configuration namespace.
    #[error("invalid host name '{host}'")]
    InvalidHost {
        /// Rejected label.
        host: String,
    },

    /// Init found a Git tree that does not look like an lnk repository.
    #[error("{} contains a git repository that is not managed by lnk", .path.display())]
    ExistingNonLnkRepo {
        /// Repository root.
        path: PathBuf,
    },

    /// Init with a remote refused to overwrite managed files.
    #[error("{} already contains managed files", .path.display())]
    ContainsManagedFiles {
        /// Repository root.
        path: PathBuf,
    },

    /// A Git backend operation failed.
    #[error("git {operation} failed: {message}")]
    GitOperation {
        /// Which operation failed.
        operation: GitOp,
        /// Upstream message.
        message: String,
    },

    /// The repository has no configured remote.
    #[error("no remote configured")]
    NoRemote,

    /// The bootstrap script exited unsuccessfully.
    #[error("bootstrap script failed (exit {})", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    BootstrapFailed {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
    },

    /// A filesystem operation failed.
    #[error("{operation} {}: {source}", .path.display())]
    Filesystem {
        /// Short operation name (e.g. `"move"`, `"create symlink"`).
        operation: &'static str,
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl LnkError {
    /// Build a [`LnkError::Filesystem`] from an I/O error.
    pub fn fs(operation: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Filesystem {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a [`LnkError::GitOperation`].
    pub fn git(operation: GitOp, message: impl Into<String>) -> Self {
        Self::GitOperation {
            operation,
            message: message.into(),
        }
    }

    /// Suggestion to print below the error summary, if any.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized { .. } => Some("run `lnk init` first"),
            Self::HomeNotFound => Some("set the HOME environment variable"),
            Self::AlreadyManaged { .. } => Some("use `lnk list` to see managed files"),
            Self::NotManaged { .. } => Some("only symlinks created by `lnk add` can be removed"),
            Self::ContainsManagedFiles { .. } => {
                Some("use `lnk pull` to update, or pass --force to replace the repository")
            }
            Self::ExistingNonLnkRepo { .. } => Some("pass --force to use it anyway"),
            Self::NoRemote => Some("add one with `git -C <repo> remote add origin <url>`"),
            Self::NothingToAdd => Some("the directory contains no regular files"),
            _ => None,
        }
    }
}

/// Result alias for lnk core operations.
pub type Result<T, E = LnkError> = std::result::Result<T, E>;
