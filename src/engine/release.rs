//! Release: stop managing a file and put it back where its symlink was.
use std::io;
use std::path::{Path, PathBuf};

use super::rollback::Rollback;
use super::{COMMIT_PREFIX, Lnk, basename};
use crate::error::{LnkError, Result};
use crate::fs;
use crate::git::GitBackend;
use crate::manifest::Manifest;
use crate::paths::{HOST_DIR_SUFFIX, Host};

/// Everything the release steps need, resolved up front.
struct Release {
    link: PathBuf,
    raw_target: PathBuf,
    payload: PathBuf,
    payload_in_repo: PathBuf,
    rel: String,
    /// Host whose storage holds the payload.
    owner: Host,
    listed: bool,
}

impl<G: GitBackend> Lnk<G> {
    /// Release the managed file whose symlink lives at `path`.
    ///
    /// The symlink must point at this host's payload for its name.  It is
    /// replaced by the payload and the removal is committed as
    /// `lnk: removed <basename>`.
    ///
    /// With `force`, an entry the manifest does not list is released too, a
    /// missing payload only drops the symlink and the manifest entry, and a
    /// symlink into another host's storage is released from that host,
    /// whose manifest entry is dropped in the same commit.
    ///
    /// Returns the home-relative name of the released entry.
    ///
    /// # Errors
    ///
    /// Returns [`LnkError::NotManaged`] if `path` is not a managed symlink.
    /// Failures up to and including the commit are rolled back; a failure
    /// moving the payload back is reported as is.
    pub fn remove(&self, path: &Path, force: bool) -> Result<String> {
        self.ensure_initialized()?;
        let release = self.resolve_release(path, force)?;
        let payload_present = fs::exists(&release.payload);

        let manifest = Manifest::for_host(&self.layout, &release.owner);
        let mut rollback = Rollback::new();
        let result = self.release_steps(&release, &manifest, &mut rollback);
        rollback.settle(result)?;

        if payload_present {
            fs::move_path(&release.payload, &release.link)?;
        } else {
            tracing::warn!(
                "payload for {} was missing, dropped the entry only",
                release.rel
            );
        }
        Ok(release.rel)
    }

    fn resolve_release(&self, path: &Path, force: bool) -> Result<Release> {
        if !fs::exists(path) {
            return Err(LnkError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let link = self.layout.absolute(path)?;
        let payload = fs::validate_for_release(&link, self.layout.repo_root())?;
        let rel = self.layout.relative(&link)?;
        let Some(owner) = self.payload_owner(&payload, &rel) else {
            return Err(LnkError::NotManaged { path: link });
        };
        if owner != self.host {
            if !force {
                return Err(LnkError::NotManaged { path: link });
            }
            tracing::warn!("{rel} is stored for host {owner}, releasing it from there");
        }
        let listed = Manifest::for_host(&self.layout, &owner).contains(&rel)?;
        if !listed && !force {
            return Err(LnkError::NotManaged { path: link });
        }
        if !fs::exists(&payload) && !force {
            return Err(LnkError::fs(
                "restore",
                &payload,
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "payload is missing from the repository (use --force to drop the entry)",
                ),
            ));
        }
        let payload_in_repo = payload
            .strip_prefix(self.layout.repo_root())
            .map(Path::to_path_buf)
            .map_err(|_| LnkError::NotManaged { path: link.clone() })?;
        let raw_target =
            std::fs::read_link(&link).map_err(|e| LnkError::fs("read symlink", &link, e))?;
        Ok(Release {
            link,
            raw_target,
            payload,
            payload_in_repo,
            rel,
            owner,
            listed,
        })
    }

    /// Host whose payload location for `rel` is exactly `payload`, checking
    /// this engine's host first.
    fn payload_owner(&self, payload: &Path, rel: &str) -> Option<Host> {
        let stored = payload.strip_prefix(self.layout.repo_root()).ok()?;
        let first = stored.components().next()?.as_os_str().to_str()?;
        let other = first
            .strip_suffix(HOST_DIR_SUFFIX)
            .and_then(|label| Host::parse(Some(label)).ok())
            .unwrap_or(Host::Common);
        [self.host.clone(), other]
            .into_iter()
            .find(|host| self.layout.payload_path(host, rel) == payload)
    }

    fn release_steps<'a>(
        &'a self,
        release: &Release,
        manifest: &Manifest,
        rollback: &mut Rollback<'a>,
    ) -> Result<()> {
        fs::remove_any(&release.link)?;
        let (link, target) = (release.link.clone(), release.raw_target.clone());
        rollback.push(format!("recreate symlink {}", release.rel), move || {
            std::os::unix::fs::symlink(&target, &link)
                .map_err(|e| LnkError::fs("create symlink", &link, e))
        });

        if release.listed {
            let snapshot = manifest.snapshot()?;
            rollback.push("restore manifest", move || snapshot.restore());
            manifest.remove(&release.rel)?;
        }

        let git = &self.git;
        let staged = release.payload_in_repo.clone();
        rollback.push(format!("unstage {}", staged.display()), move || {
            git.unstage(&staged)
        });
        self.git.remove(&release.payload_in_repo)?;

        if release.listed {
            let manifest_path = PathBuf::from(release.owner.manifest_file_name());
            self.git.add(&manifest_path)?;
            rollback.push(format!("unstage {}", manifest_path.display()), move || {
                git.unstage(&manifest_path)
            });
        }

        self.git.commit(&format!(
            "{COMMIT_PREFIX} removed {}",
            basename(&release.rel)
        ))
    }
}
