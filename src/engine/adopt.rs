//! Adoption: move files into the repository and link them back.
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use super::rollback::Rollback;
use super::{COMMIT_PREFIX, Lnk, basename};
use crate::error::{LnkError, Result};
use crate::fs::{self, EntryKind};
use crate::git::GitBackend;
use crate::manifest::{Manifest, Snapshot};
use crate::paths::{self, Host};

/// A validated adoption input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute location of the file or directory.
    pub source: PathBuf,
    /// Home-relative name recorded in the manifest.
    pub rel: String,
    /// File or directory.
    pub kind: EntryKind,
}

impl<G: GitBackend> Lnk<G> {
    /// Adopt a single file or directory and commit it as
    /// `lnk: added <basename>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not adoptable or any step fails; in
    /// that case every completed step is undone.
    pub fn add(&self, path: &Path) -> Result<Candidate> {
        self.ensure_initialized()?;
        let managed = self.managed_set()?;
        let candidate = self.validate(path, &managed)?;
        let message = format!("{COMMIT_PREFIX} added {}", basename(&candidate.rel));
        self.adopt_all(std::slice::from_ref(&candidate), &message)?;
        tracing::debug!("adopted {}", candidate.rel);
        Ok(candidate)
    }

    /// Adopt several paths in one commit.  Every input is validated before
    /// anything is touched, and a failure part-way leaves the filesystem,
    /// manifest and index as they were.
    ///
    /// With `recursive`, directory inputs are replaced by the regular files
    /// beneath them.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, [`LnkError::NothingToAdd`] for an
    /// empty expansion, or the error of the step that failed.
    pub fn add_batch(&self, paths: &[PathBuf], recursive: bool) -> Result<Vec<Candidate>> {
        let candidates = self.preview(paths, recursive)?;
        let mut message = format!("{COMMIT_PREFIX} added {} files", candidates.len());
        if recursive {
            message.push_str(" recursively");
        }
        self.adopt_all(&candidates, &message)?;
        tracing::debug!("adopted {} file(s)", candidates.len());
        Ok(candidates)
    }

    /// Validate what [`Self::add_batch`] would adopt without changing
    /// anything.
    ///
    /// # Errors
    ///
    /// Same validation errors as [`Self::add_batch`].
    pub fn preview(&self, paths: &[PathBuf], recursive: bool) -> Result<Vec<Candidate>> {
        self.ensure_initialized()?;
        let mut managed = self.managed_set()?;
        let inputs = if recursive {
            Self::expand(paths)?
        } else {
            paths.to_vec()
        };
        if inputs.is_empty() {
            return Err(LnkError::NothingToAdd);
        }
        let mut candidates = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let candidate = self.validate(input, &managed)?;
            managed.insert(candidate.rel.clone());
            candidates.push(candidate);
        }
        Ok(candidates)
    }

    fn managed_set(&self) -> Result<BTreeSet<String>> {
        Ok(self.manifest().read()?.into_iter().collect())
    }

    /// Replace directory inputs with the files beneath them.
    fn expand(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for path in paths {
            let is_dir = path.symlink_metadata().is_ok_and(|m| m.is_dir());
            if !is_dir {
                out.push(path.clone());
                continue;
            }
            let walk = fs::walk_files(path)?;
            for link in &walk.skipped_symlinks {
                tracing::warn!("skipping symlink {}", link.display());
            }
            out.extend(walk.files);
        }
        Ok(out)
    }

    fn validate(&self, path: &Path, managed: &BTreeSet<String>) -> Result<Candidate> {
        if !fs::exists(path) {
            return Err(LnkError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let source = self.layout.absolute(path)?;
        if fs::is_symlink(&source) {
            let into_repo =
                fs::resolve_link(&source).is_ok_and(|t| self.layout.is_inside_repo(&t));
            if into_repo {
                return Err(LnkError::AlreadyManaged {
                    rel: self.layout.relative(&source)?,
                });
            }
            return Err(LnkError::UnsupportedType { path: source });
        }
        let kind = fs::validate_for_add(&source)?;
        self.guard_source(&source)?;
        let rel = self.layout.relative(&source)?;
        if self.host == Host::Common && paths::is_reserved(&rel) {
            return Err(LnkError::InvalidPath {
                path: source,
                reason: format!("'{rel}' collides with a file lnk keeps in its repository"),
            });
        }
        if managed.contains(&rel) {
            return Err(LnkError::AlreadyManaged { rel });
        }
        Ok(Candidate { source, rel, kind })
    }

    /// Refuse paths whose adoption would swallow the repository or home.
    fn guard_source(&self, source: &Path) -> Result<()> {
        let reason = if source == self.layout.home() {
            "refusing to manage the home directory itself"
        } else if self.layout.is_inside_repo(source) {
            "path is inside the lnk repository"
        } else if self.layout.repo_root().starts_with(source) {
            "path contains the lnk repository"
        } else {
            return Ok(());
        };
        Err(LnkError::InvalidPath {
            path: source.to_path_buf(),
            reason: reason.to_string(),
        })
    }

    fn adopt_all(&self, candidates: &[Candidate], message: &str) -> Result<()> {
        let manifest = self.manifest();
        let snapshot = manifest.snapshot()?;
        let mut rollback = Rollback::new();
        let result = self.adopt_steps(candidates, &manifest, snapshot, message, &mut rollback);
        rollback.settle(result)
    }

    fn adopt_steps<'a>(
        &'a self,
        candidates: &[Candidate],
        manifest: &Manifest,
        snapshot: Snapshot,
        message: &str,
        rollback: &mut Rollback<'a>,
    ) -> Result<()> {
        rollback.push("restore manifest", move || snapshot.restore());
        for candidate in candidates {
            self.adopt_one(candidate, manifest, rollback)?;
        }

        let mut staged: Vec<PathBuf> = candidates
            .iter()
            .map(|c| self.layout.repo_relative(&self.host, &c.rel))
            .collect();
        staged.push(self.manifest_repo_path());
        for path in staged {
            let git = &self.git;
            let undo_path = path.clone();
            rollback.push(format!("unstage {}", path.display()), move || {
                git.unstage(&undo_path)
            });
            self.git.add(&path)?;
        }
        self.git.commit(message)
    }

    fn adopt_one<'a>(
        &'a self,
        candidate: &Candidate,
        manifest: &Manifest,
        rollback: &mut Rollback<'a>,
    ) -> Result<()> {
        let payload = self.layout.payload_path(&self.host, &candidate.rel);
        if fs::exists(&payload) {
            return Err(LnkError::fs(
                "adopt",
                &payload,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "payload already exists in repository",
                ),
            ));
        }

        let created = fs::create_parent_dirs(&payload)?;
        rollback.push(format!("remove directories for {}", candidate.rel), move || {
            fs::remove_created_dirs(&created);
            Ok(())
        });

        fs::move_path(&candidate.source, &payload)?;
        let (from, to) = (candidate.source.clone(), payload.clone());
        rollback.push(format!("move {} back", candidate.rel), move || {
            fs::move_path(&to, &from)
        });

        fs::create_symlink(&payload, &candidate.source)?;
        let link = candidate.source.clone();
        rollback.push(format!("remove symlink {}", candidate.rel), move || {
            fs::remove_any(&link)
        });

        manifest.add(&candidate.rel)?;
        Ok(())
    }
}
