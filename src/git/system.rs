//! [`GitBackend`] backed by the `git` executable and `git2`.
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Repository, RepositoryInitOptions, StatusOptions};

use super::{DEFAULT_BRANCH, GitBackend, RepoStatus};
use crate::error::{GitOp, LnkError, Result};
use crate::exec;

/// Remote preferred when several are configured.
const PREFERRED_REMOTE: &str = "origin";

/// Git repository at a fixed working-tree root.
#[derive(Debug, Clone)]
pub struct SystemGit {
    root: PathBuf,
}

impl SystemGit {
    /// Backend for the repository at `root`.  The directory need not exist
    /// until [`GitBackend::init`] or [`GitBackend::clone_from`] is called.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Working-tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run(&self, dir: &Path, op: GitOp, args: &[&OsStr]) -> Result<String> {
        let git = exec::which("git")
            .ok_or_else(|| LnkError::git(op, "git executable not found on PATH"))?;
        let result = exec::run_in(dir, git, args).map_err(|e| LnkError::git(op, e.to_string()))?;
        if result.success {
            Ok(result.stdout)
        } else {
            Err(LnkError::git(op, result.message()))
        }
    }

    fn open(&self, op: GitOp) -> Result<Repository> {
        Repository::open(&self.root).map_err(|e| LnkError::git(op, e.message()))
    }

    /// Preferred remote as `(name, url)`.
    fn remote(repo: &Repository) -> Result<Option<(String, String)>> {
        let names = repo
            .remotes()
            .map_err(|e| LnkError::git(GitOp::Status, e.message()))?;
        let mut names: Vec<String> = names.iter().flatten().map(String::from).collect();
        if let Some(pos) = names.iter().position(|n| n == PREFERRED_REMOTE) {
            names.swap(0, pos);
        }
        let Some(name) = names.into_iter().next() else {
            return Ok(None);
        };
        let remote = repo
            .find_remote(&name)
            .map_err(|e| LnkError::git(GitOp::Status, e.message()))?;
        let url = remote.url().unwrap_or_default().to_string();
        Ok(Some((name, url)))
    }

    /// Current branch, including an unborn one.  `None` on a detached head.
    fn branch(repo: &Repository) -> Option<String> {
        match repo.head() {
            Ok(head) if head.is_branch() => head.shorthand().map(String::from),
            Ok(_) => None,
            Err(e) if e.code() == ErrorCode::UnbornBranch => repo
                .find_reference("HEAD")
                .ok()
                .and_then(|r| r.symbolic_target().map(String::from))
                .and_then(|t| t.strip_prefix("refs/heads/").map(String::from)),
            Err(_) => None,
        }
    }

    fn has_head(repo: &Repository) -> bool {
        repo.head().is_ok_and(|h| h.target().is_some())
    }

    fn ahead_behind(repo: &Repository, branch: Option<&str>) -> Result<(usize, usize)> {
        let status_err = |e: git2::Error| LnkError::git(GitOp::Status, e.message());
        let Some(local) = repo.head().ok().and_then(|h| h.target()) else {
            return Ok((0, 0));
        };
        let upstream = branch
            .and_then(|b| repo.find_branch(b, BranchType::Local).ok())
            .and_then(|b| b.upstream().ok())
            .and_then(|u| u.get().target());
        if let Some(upstream) = upstream {
            return repo.graph_ahead_behind(local, upstream).map_err(status_err);
        }
        let mut walk = repo.revwalk().map_err(status_err)?;
        walk.push(local).map_err(status_err)?;
        Ok((walk.count(), 0))
    }
}

impl GitBackend for SystemGit {
    fn init(&self) -> Result<()> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(DEFAULT_BRANCH);
        Repository::init_opts(&self.root, &opts)
            .map(|_| ())
            .map_err(|e| LnkError::git(GitOp::Init, e.message()))
    }

    fn clone_from(&self, url: &str) -> Result<()> {
        let parent = self.root.parent().unwrap_or_else(|| Path::new("/"));
        std::fs::create_dir_all(parent).map_err(|e| LnkError::fs("create directory", parent, e))?;
        self.run(
            parent,
            GitOp::Clone,
            &[
                OsStr::new("clone"),
                OsStr::new("--quiet"),
                OsStr::new(url),
                self.root.as_os_str(),
            ],
        )
        .map(|_| ())
    }

    fn add(&self, path: &Path) -> Result<()> {
        self.run(
            &self.root,
            GitOp::Add,
            &[OsStr::new("add"), OsStr::new("--"), path.as_os_str()],
        )
        .map(|_| ())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.run(
            &self.root,
            GitOp::Remove,
            &[
                OsStr::new("rm"),
                OsStr::new("-r"),
                OsStr::new("--cached"),
                OsStr::new("--quiet"),
                OsStr::new("--ignore-unmatch"),
                OsStr::new("--"),
                path.as_os_str(),
            ],
        )
        .map(|_| ())
    }

    fn unstage(&self, path: &Path) -> Result<()> {
        let repo = self.open(GitOp::Reset)?;
        if Self::has_head(&repo) {
            self.run(
                &self.root,
                GitOp::Reset,
                &[
                    OsStr::new("reset"),
                    OsStr::new("--quiet"),
                    OsStr::new("--"),
                    path.as_os_str(),
                ],
            )
            .map(|_| ())
        } else {
            self.remove(path)
        }
    }

    fn add_all(&self) -> Result<()> {
        self.run(&self.root, GitOp::Add, &[OsStr::new("add"), OsStr::new("-A")])
            .map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run(
            &self.root,
            GitOp::Commit,
            &[
                OsStr::new("commit"),
                OsStr::new("--quiet"),
                OsStr::new("-m"),
                OsStr::new(message),
            ],
        )
        .map(|_| ())
    }

    fn has_changes(&self) -> Result<bool> {
        let repo = self.open(GitOp::Status)?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = repo
            .statuses(Some(&mut opts))
            .map_err(|e| LnkError::git(GitOp::Status, e.message()))?;
        Ok(!statuses.is_empty())
    }

    fn status(&self) -> Result<RepoStatus> {
        let repo = self.open(GitOp::Status)?;
        let (_, remote_url) = Self::remote(&repo)?.ok_or(LnkError::NoRemote)?;
        let branch = Self::branch(&repo);
        let (ahead, behind) = Self::ahead_behind(&repo, branch.as_deref())?;
        let dirty = self.has_changes()?;
        Ok(RepoStatus {
            ahead,
            behind,
            dirty,
            remote_url,
            branch,
        })
    }

    fn push(&self) -> Result<()> {
        let repo = self.open(GitOp::Push)?;
        let (remote, _) = Self::remote(&repo)?.ok_or(LnkError::NoRemote)?;
        self.run(
            &self.root,
            GitOp::Push,
            &[
                OsStr::new("push"),
                OsStr::new("--quiet"),
                OsStr::new("--set-upstream"),
                OsStr::new(&remote),
                OsStr::new("HEAD"),
            ],
        )
        .map(|_| ())
    }

    fn pull(&self) -> Result<()> {
        let repo = self.open(GitOp::Pull)?;
        let (remote, _) = Self::remote(&repo)?.ok_or(LnkError::NoRemote)?;
        let branch = Self::branch(&repo)
            .ok_or_else(|| LnkError::git(GitOp::Pull, "HEAD is detached"))?;
        self.run(
            &self.root,
            GitOp::Pull,
            &[
                OsStr::new("pull"),
                OsStr::new("--quiet"),
                OsStr::new("--ff-only"),
                OsStr::new(&remote),
                OsStr::new(&branch),
            ],
        )
        .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn repo() -> (tempfile::TempDir, SystemGit) {
        let dir = tempfile::tempdir().unwrap();
        let git = SystemGit::new(dir.path().join("repo"));
        git.init().unwrap();
        let repo = Repository::open(git.root()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        config.set_bool("commit.gpgsign", false).unwrap();
        (dir, git)
    }

    fn bare_remote(dir: &Path) -> PathBuf {
        let path = dir.join("remote.git");
        let mut opts = RepositoryInitOptions::new();
        opts.bare(true).initial_head(DEFAULT_BRANCH);
        Repository::init_opts(&path, &opts).unwrap();
        path
    }

    #[test]
    fn init_creates_unborn_main() {
        let (_dir, git) = repo();
        let repo = Repository::open(git.root()).unwrap();
        assert!(repo.head().is_err(), "no commits yet");
        assert_eq!(SystemGit::branch(&repo).as_deref(), Some("main"));
    }

    #[test]
    fn add_commit_clears_changes() {
        let (_dir, git) = repo();
        std::fs::write(git.root().join("a"), "a").unwrap();
        assert!(git.has_changes().unwrap());
        git.add(Path::new("a")).unwrap();
        git.commit("first").unwrap();
        assert!(!git.has_changes().unwrap());

        let repo = Repository::open(git.root()).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("first\n"));
    }

    #[test]
    fn unstage_before_first_commit_drops_index_entry() {
        let (_dir, git) = repo();
        std::fs::write(git.root().join("a"), "a").unwrap();
        git.add(Path::new("a")).unwrap();
        git.unstage(Path::new("a")).unwrap();
        let repo = Repository::open(git.root()).unwrap();
        assert!(repo.index().unwrap().get_path(Path::new("a"), 0).is_none());
        assert!(git.root().join("a").exists(), "working copy kept");
    }

    #[test]
    fn commit_with_nothing_staged_fails() {
        let (_dir, git) = repo();
        let err = git.commit("empty").unwrap_err();
        assert!(matches!(
            err,
            LnkError::GitOperation {
                operation: GitOp::Commit,
                ..
            }
        ));
    }

    #[test]
    fn status_without_remote_is_no_remote() {
        let (_dir, git) = repo();
        assert!(matches!(git.status(), Err(LnkError::NoRemote)));
        assert!(matches!(git.push(), Err(LnkError::NoRemote)));
        assert!(matches!(git.pull(), Err(LnkError::NoRemote)));
    }

    #[test]
    fn status_counts_commits_before_first_push() {
        let (dir, git) = repo();
        let remote = bare_remote(dir.path());
        Repository::open(git.root())
            .unwrap()
            .remote("origin", remote.to_str().unwrap())
            .unwrap();
        std::fs::write(git.root().join("a"), "a").unwrap();
        git.add(Path::new("a")).unwrap();
        git.commit("first").unwrap();

        let status = git.status().unwrap();
        assert_eq!(status.ahead, 1);
        assert_eq!(status.behind, 0);
        assert!(!status.dirty);
        assert_eq!(status.branch.as_deref(), Some("main"));

        git.push().unwrap();
        let status = git.status().unwrap();
        assert!(status.is_up_to_date());
    }
}
