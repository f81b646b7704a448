//! Path resolution.
//!
//! Translates between absolute paths, home-relative names and on-disk storage
//! locations inside the repository:
//!
//! ```text
//! <repo_root>/.lnk              common manifest
//! <repo_root>/.lnk.<host>       host manifest
//! <repo_root>/<rel>             common payload
//! <repo_root>/<host>.lnk/<rel>  host payload
//! ```
use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{LnkError, Result};

/// Directory name of the repository under the config home.
pub const REPO_DIR_NAME: &str = "lnk";

/// File name of the common manifest; host manifests append `.<host>`.
pub const MANIFEST_FILE: &str = ".lnk";

/// Suffix of host payload directories (`<host>.lnk/`).
pub const HOST_DIR_SUFFIX: &str = ".lnk";

/// Name of the optional bootstrap script at the repository root.
pub const BOOTSTRAP_SCRIPT: &str = "bootstrap.sh";

/// Configuration namespace an entry belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Host {
    /// Shared configuration stored at the repository root.
    #[default]
    Common,
    /// Host-specific configuration stored under `<host>.lnk/`.
    Named(String),
}

impl Host {
    /// Parse an optional host label.  `None` and the empty string select
    /// the common configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LnkError::InvalidHost`] if the label contains a path
    /// separator or whitespace, or starts with a dot.
    pub fn parse(label: Option<&str>) -> Result<Self> {
        let Some(label) = label.filter(|l| !l.is_empty()) else {
            return Ok(Self::Common);
        };
        let invalid = label.starts_with('.')
            || label.contains('/')
            || label.contains('\\')
            || label.chars().any(char::is_whitespace);
        if invalid {
            return Err(LnkError::InvalidHost {
                host: label.to_string(),
            });
        }
        Ok(Self::Named(label.to_string()))
    }

    /// Host label, `None` for the common configuration.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Common => None,
            Self::Named(name) => Some(name),
        }
    }

    /// Manifest file name for this host (`.lnk` or `.lnk.<host>`).
    #[must_use]
    pub fn manifest_file_name(&self) -> String {
        match self {
            Self::Common => MANIFEST_FILE.to_string(),
            Self::Named(name) => format!("{MANIFEST_FILE}.{name}"),
        }
    }

    /// Payload directory relative to the repository root, empty for common.
    #[must_use]
    pub fn storage_prefix(&self) -> PathBuf {
        match self {
            Self::Common => PathBuf::new(),
            Self::Named(name) => PathBuf::from(format!("{name}{HOST_DIR_SUFFIX}")),
        }
    }

    /// Recover the host from a manifest file name found at the repository root.
    #[must_use]
    pub fn from_manifest_file_name(file_name: &str) -> Option<Self> {
        if file_name == MANIFEST_FILE {
            return Some(Self::Common);
        }
        let label = file_name.strip_prefix(MANIFEST_FILE)?.strip_prefix('.')?;
        Self::parse(Some(label))
            .ok()
            .filter(|h| *h != Self::Common)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => f.write_str("common"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Compute the repository root from the home directory and an optional
/// `XDG_CONFIG_HOME` value (ignored when empty).
#[must_use]
pub fn repo_root_for(home: &Path, xdg_config_home: Option<&OsStr>) -> PathBuf {
    xdg_config_home
        .filter(|v| !v.is_empty())
        .map_or_else(|| home.join(".config"), PathBuf::from)
        .join(REPO_DIR_NAME)
}

/// Returns `true` if `rel` is usable as a storage subpath: non-empty,
/// relative, and free of `.`/`..` components.
#[must_use]
pub fn is_valid_relative(rel: &str) -> bool {
    let path = Path::new(rel);
    !rel.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Returns `true` if a common entry named `rel` would land on one of the
/// repository's own files: `.git`, a manifest, a host payload directory or
/// the bootstrap script.
#[must_use]
pub fn is_reserved(rel: &str) -> bool {
    let first = rel.split('/').next().unwrap_or(rel);
    first == ".git"
        || first == BOOTSTRAP_SCRIPT
        || first.ends_with(HOST_DIR_SUFFIX)
        || first
            .strip_prefix(MANIFEST_FILE)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Canonicalize the longest existing ancestor of `path` and re-append the
/// remaining components, so paths that do not exist yet still compare
/// equal to their resolved siblings.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = dunce::canonicalize(&existing) {
            return rest
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part: &std::ffi::OsString| acc.join(part));
        }
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Resolved home directory and repository root for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    home: PathBuf,
    repo_root: PathBuf,
}

impl Layout {
    /// Build a layout from explicit paths.  Both are normalized through any
    /// existing symlinked ancestors.
    #[must_use]
    pub fn new(home: impl AsRef<Path>, repo_root: impl AsRef<Path>) -> Self {
        Self {
            home: normalize(home.as_ref()),
            repo_root: normalize(repo_root.as_ref()),
        }
    }

    /// Home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Repository root.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Returns `true` if the repository root contains a Git working tree.
    #[must_use]
    pub fn is_git_repo(&self) -> bool {
        self.repo_root.join(".git").exists()
    }

    /// Absolute path of the manifest for `host`.
    #[must_use]
    pub fn manifest_path(&self, host: &Host) -> PathBuf {
        self.repo_root.join(host.manifest_file_name())
    }

    /// Payload location relative to the repository root.
    #[must_use]
    pub fn repo_relative(&self, host: &Host, rel: &str) -> PathBuf {
        host.storage_prefix().join(rel)
    }

    /// Absolute payload location for `(host, rel)`.
    #[must_use]
    pub fn payload_path(&self, host: &Host, rel: &str) -> PathBuf {
        self.repo_root.join(self.repo_relative(host, rel))
    }

    /// Absolute symlink location for `rel`.
    #[must_use]
    pub fn symlink_path(&self, rel: &str) -> PathBuf {
        self.home.join(rel)
    }

    /// Returns `true` if `abs` is the repository root or lies inside it.
    #[must_use]
    pub fn is_inside_repo(&self, abs: &Path) -> bool {
        abs.starts_with(&self.repo_root)
    }

    /// Translate a user-supplied path to an absolute path.
    ///
    /// The parent directory is canonicalized but the final component is kept
    /// as-is, so a symlink argument still names the link rather than its
    /// target.
    ///
    /// # Errors
    ///
    /// Returns [`LnkError::InvalidPath`] if the path cannot be canonicalized.
    pub fn absolute(&self, path: &Path) -> Result<PathBuf> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| LnkError::fs("resolve current directory for", path, e))?
                .join(path)
        };
        let invalid = |e: std::io::Error| LnkError::InvalidPath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        match (joined.parent(), joined.file_name()) {
            (Some(parent), Some(name)) => {
                Ok(dunce::canonicalize(parent).map_err(invalid)?.join(name))
            }
            _ => dunce::canonicalize(&joined).map_err(invalid),
        }
    }

    /// Home-relative name of an absolute path.
    ///
    /// Paths outside home keep their absolute form with the leading
    /// separator stripped (`/etc/hosts` becomes `etc/hosts`).
    ///
    /// # Errors
    ///
    /// Returns [`LnkError::InvalidPath`] for the home directory itself, the
    /// filesystem root, or names that are not valid UTF-8.
    pub fn relative(&self, abs: &Path) -> Result<String> {
        let rel = abs.strip_prefix(&self.home).map_or_else(
            |_| {
                abs.strip_prefix(Path::new("/"))
                    .map_or_else(|_| abs.to_path_buf(), Path::to_path_buf)
            },
            Path::to_path_buf,
        );
        let invalid = |reason: &str| LnkError::InvalidPath {
            path: abs.to_path_buf(),
            reason: reason.to_string(),
        };
        let rel = rel
            .to_str()
            .ok_or_else(|| invalid("path is not valid UTF-8"))?
            .to_string();
        if rel.is_empty() {
            return Err(invalid("refusing to manage the home directory itself"));
        }
        if !is_valid_relative(&rel) {
            return Err(invalid("path cannot be expressed relative to home"));
        }
        Ok(rel)
    }
}
