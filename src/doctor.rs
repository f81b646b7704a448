//! Health check and repair.
//!
//! An entry is *invalid* when its payload is missing from the repository or
//! its name escapes the home directory.  An entry has a *broken symlink*
//! when its payload exists but the home location is missing, is not a
//! symlink, or points elsewhere.
use crate::engine::rollback::Rollback;
use crate::engine::{COMMIT_PREFIX, Lnk};
use crate::error::Result;
use crate::fs;
use crate::git::GitBackend;
use crate::manifest::Manifest;
use crate::paths::is_valid_relative;

/// Findings of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorReport {
    /// Entries with no payload or an unusable name.
    pub invalid_entries: Vec<String>,
    /// Entries whose home symlink needs restoring.
    pub broken_symlinks: Vec<String>,
}

impl DoctorReport {
    /// Returns `true` if nothing needs repair.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.invalid_entries.is_empty() && self.broken_symlinks.is_empty()
    }
}

/// What a repair changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorRepair {
    /// Scan taken before repairing.
    pub report: DoctorReport,
    /// Entries whose symlinks were recreated.
    pub restored: Vec<String>,
    /// Entries dropped from the manifest.
    pub cleaned: Vec<String>,
}

/// Commit message for dropping `count` invalid entries.
#[must_use]
pub fn cleaned_message(count: usize) -> String {
    let noun = if count == 1 { "entry" } else { "entries" };
    format!("{COMMIT_PREFIX} cleaned {count} invalid {noun}")
}

impl<G: GitBackend> Lnk<G> {
    /// Scan this host's manifest without changing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not initialized or the
    /// manifest cannot be read.
    pub fn diagnose(&self) -> Result<DoctorReport> {
        self.ensure_initialized()?;
        let mut report = DoctorReport::default();
        for rel in self.manifest().read()? {
            if !is_valid_relative(&rel) {
                report.invalid_entries.push(rel);
                continue;
            }
            let payload = self.layout().payload_path(self.host(), &rel);
            if !fs::exists(&payload) {
                report.invalid_entries.push(rel);
                continue;
            }
            let link = self.layout().symlink_path(&rel);
            if !fs::is_valid_symlink(&link, &payload) {
                report.broken_symlinks.push(rel);
            }
        }
        Ok(report)
    }

    /// Restore broken symlinks, then drop invalid entries in one commit
    /// that also untracks their missing payloads.
    ///
    /// Dangling home symlinks left by dropped entries are removed after the
    /// commit.
    ///
    /// # Errors
    ///
    /// Returns an error if restore fails, or if cleaning fails; cleaning is
    /// rolled back in that case.
    pub fn repair(&self) -> Result<DoctorRepair> {
        let report = self.diagnose()?;
        let restored = if report.broken_symlinks.is_empty() {
            Vec::new()
        } else {
            self.restore()?
        };

        let cleaned = report.invalid_entries.clone();
        if !cleaned.is_empty() {
            self.clean_entries(&cleaned)?;
            self.remove_dangling_links(&cleaned);
        }
        Ok(DoctorRepair {
            report,
            restored,
            cleaned,
        })
    }

    fn clean_entries(&self, invalid: &[String]) -> Result<()> {
        let manifest = self.manifest();
        let snapshot = manifest.snapshot()?;
        let mut rollback = Rollback::new();
        rollback.push("restore manifest", move || snapshot.restore());
        let result = self.clean_steps(&manifest, invalid, &mut rollback);
        rollback.settle(result)
    }

    fn clean_steps<'a>(
        &'a self,
        manifest: &Manifest,
        invalid: &[String],
        rollback: &mut Rollback<'a>,
    ) -> Result<()> {
        let kept: Vec<String> = manifest
            .read()?
            .into_iter()
            .filter(|rel| !invalid.contains(rel))
            .collect();
        manifest.write(kept)?;

        let git = self.git();
        for rel in invalid.iter().filter(|r| is_valid_relative(r)) {
            let payload = self.layout().repo_relative(self.host(), rel);
            git.remove(&payload)?;
            let undo = payload.clone();
            rollback.push(format!("unstage {}", payload.display()), move || {
                git.unstage(&undo)
            });
        }
        let path = self.manifest_repo_path();
        git.add(&path)?;
        rollback.push(format!("unstage {}", path.display()), move || {
            git.unstage(&path)
        });
        git.commit(&cleaned_message(invalid.len()))
    }

    /// Delete home symlinks that still point at a dropped entry's missing
    /// payload.  Anything else at those locations is left alone.
    fn remove_dangling_links(&self, rels: &[String]) {
        let repo_root = self.layout().repo_root();
        for rel in rels.iter().filter(|r| is_valid_relative(r)) {
            let link = self.layout().symlink_path(rel);
            let dangling = fs::is_symlink(&link)
                && !link.exists()
                && fs::resolve_link(&link).is_ok_and(|t| t.starts_with(repo_root));
            if dangling && let Err(e) = fs::remove_any(&link) {
                tracing::warn!("could not remove dangling symlink {}: {e}", link.display());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{GitOp, LnkError};
    use crate::git::MockGitBackend;
    use crate::paths::{Host, Layout};
    use std::path::PathBuf;

    struct Fixture {
        _dir: tempfile::TempDir,
        home: PathBuf,
        repo: PathBuf,
    }

    /// `.bashrc` and `.vimrc` adopted, with `.vimrc`'s payload deleted.
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let home = dunce::canonicalize(dir.path()).unwrap().join("home");
        let repo = home.join(".config").join("lnk");
        std::fs::create_dir_all(repo.join(".git")).unwrap();
        std::fs::write(repo.join(".lnk"), ".bashrc\n.vimrc\n").unwrap();
        for name in [".bashrc", ".vimrc"] {
            std::fs::write(repo.join(name), name).unwrap();
            fs::create_symlink(&repo.join(name), &home.join(name)).unwrap();
        }
        std::fs::remove_file(repo.join(".vimrc")).unwrap();
        Fixture {
            _dir: dir,
            home,
            repo,
        }
    }

    fn engine(f: &Fixture, git: MockGitBackend) -> Lnk<MockGitBackend> {
        Lnk::with_backend(Layout::new(&f.home, &f.repo), Host::Common, git)
    }

    #[test]
    fn cleaned_message_pluralizes() {
        assert_eq!(cleaned_message(1), "lnk: cleaned 1 invalid entry");
        assert_eq!(cleaned_message(3), "lnk: cleaned 3 invalid entries");
    }

    #[test]
    fn diagnose_reports_missing_payload_only_as_invalid() {
        let f = fixture();
        let report = engine(&f, MockGitBackend::new()).diagnose().unwrap();
        assert_eq!(report.invalid_entries, vec![".vimrc"]);
        assert!(report.broken_symlinks.is_empty());
        assert!(!report.is_healthy());
    }

    #[test]
    fn diagnose_flags_replaced_symlink() {
        let f = fixture();
        std::fs::remove_file(f.home.join(".bashrc")).unwrap();
        std::fs::write(f.home.join(".bashrc"), "local copy").unwrap();
        let report = engine(&f, MockGitBackend::new()).diagnose().unwrap();
        assert_eq!(report.broken_symlinks, vec![".bashrc"]);
    }

    #[test]
    fn repair_cleans_and_commits_once() {
        let f = fixture();
        let mut git = MockGitBackend::new();
        git.expect_remove()
            .withf(|p| p == std::path::Path::new(".vimrc"))
            .times(1)
            .returning(|_| Ok(()));
        git.expect_add().times(1).returning(|_| Ok(()));
        git.expect_commit()
            .withf(|m| m == "lnk: cleaned 1 invalid entry")
            .times(1)
            .returning(|_| Ok(()));

        let repair = engine(&f, git).repair().unwrap();

        assert_eq!(repair.cleaned, vec![".vimrc"]);
        assert!(repair.restored.is_empty());
        assert_eq!(
            std::fs::read_to_string(f.repo.join(".lnk")).unwrap(),
            ".bashrc\n"
        );
        assert!(!fs::exists(&f.home.join(".vimrc")), "dangling link removed");
        assert!(fs::is_symlink(&f.home.join(".bashrc")));
    }

    #[test]
    fn failed_clean_commit_restores_manifest() {
        let f = fixture();
        let mut git = MockGitBackend::new();
        git.expect_remove().returning(|_| Ok(()));
        git.expect_add().returning(|_| Ok(()));
        git.expect_unstage().times(2).returning(|_| Ok(()));
        git.expect_commit()
            .returning(|_| Err(LnkError::git(GitOp::Commit, "locked")));

        assert!(engine(&f, git).repair().is_err());
        assert_eq!(
            std::fs::read_to_string(f.repo.join(".lnk")).unwrap(),
            ".bashrc\n.vimrc\n"
        );
        assert!(fs::is_symlink(&f.home.join(".vimrc")));
    }

    #[test]
    fn healthy_repo_repairs_nothing() {
        let f = fixture();
        std::fs::write(f.repo.join(".lnk"), ".bashrc\n").unwrap();
        let repair = engine(&f, MockGitBackend::new()).repair().unwrap();
        assert!(repair.report.is_healthy());
        assert!(repair.cleaned.is_empty());
    }
}
