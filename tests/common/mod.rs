// Shared helpers for integration tests.
//
// Provides a temporary home directory with an lnk repository under
// `~/.config/lnk`, a local bare remote, and a fluent builder so each
// integration test can set up an isolated environment without repeating
// filesystem and Git boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryInitOptions};
use lnk::engine::Lnk;
use lnk::paths::{Host, Layout};

/// Set a committer identity and disable signing so commits work on any
/// machine, whatever the user's global Git configuration says.
pub fn configure_identity(repo: &Path) {
    let repo = Repository::open(repo).expect("open repository");
    let mut config = repo.config().expect("repository config");
    config.set_str("user.name", "Test User").expect("user.name");
    config
        .set_str("user.email", "test@example.com")
        .expect("user.email");
    config.set_bool("commit.gpgsign", false).expect("gpgsign");
}

/// Create an empty bare repository whose default branch is `main`.
pub fn bare_remote(path: &Path) -> PathBuf {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).initial_head("main");
    Repository::init_opts(path, &opts).expect("init bare remote");
    path.to_path_buf()
}

/// An isolated home directory backed by a [`tempfile::TempDir`].
///
/// Layout inside the temporary directory:
///
/// - `home/`        the home directory
/// - `remote.git`   optional bare remote
pub struct IntegrationTestContext {
    /// Temporary directory holding the home and the remote.
    pub dir: tempfile::TempDir,
    home: PathBuf,
}

impl IntegrationTestContext {
    /// Create an empty home with no repository.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let base = std::fs::canonicalize(dir.path()).expect("canonicalize temp dir");
        let home = base.join("home");
        std::fs::create_dir_all(&home).expect("create home");
        Self { dir, home }
    }

    /// Home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Repository root: `~/.config/lnk`.
    pub fn repo(&self) -> PathBuf {
        self.home.join(".config").join("lnk")
    }

    /// Path of the bare remote, whether or not it exists yet.
    pub fn remote_path(&self) -> PathBuf {
        self.home
            .parent()
            .expect("home has a parent")
            .join("remote.git")
    }

    /// Layout for this home.
    pub fn layout(&self) -> Layout {
        Layout::new(&self.home, self.repo())
    }

    /// Engine for the common configuration.
    pub fn lnk(&self) -> Lnk {
        Lnk::open(self.layout(), Host::Common)
    }

    /// Engine for a named host.
    pub fn lnk_for(&self, host: &str) -> Lnk {
        let host = Host::parse(Some(host)).expect("valid host");
        Lnk::open(self.layout(), host)
    }

    /// Initialize the repository and configure a committer identity.
    pub fn init(&self) {
        self.lnk().init(false).expect("init");
        configure_identity(&self.repo());
    }

    /// Create the bare remote and register it as `origin`.
    pub fn attach_remote(&self) -> PathBuf {
        let remote = bare_remote(&self.remote_path());
        let repo = Repository::open(self.repo()).expect("open repository");
        repo.remote("origin", remote.to_str().expect("utf-8 remote path"))
            .expect("add origin");
        remote
    }

    /// Write `content` to `~/<rel>`, creating parent directories.
    pub fn write_home(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.home.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, content).expect("write home file");
        path
    }

    /// Contents of `~/<rel>`, following symlinks.
    pub fn read_home(&self, rel: &str) -> String {
        std::fs::read_to_string(self.home.join(rel)).expect("read home file")
    }

    /// Returns `true` if `~/<rel>` is a symlink.
    pub fn is_symlink(&self, rel: &str) -> bool {
        self.home
            .join(rel)
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
    }

    /// Raw manifest text for `host` (`None` for common), empty if absent.
    pub fn manifest(&self, host: Option<&str>) -> String {
        let name = host.map_or_else(|| ".lnk".to_string(), |h| format!(".lnk.{h}"));
        std::fs::read_to_string(self.repo().join(name)).unwrap_or_default()
    }

    /// Commit summaries on `HEAD`, newest first.  Empty before the first
    /// commit.
    pub fn commit_messages(&self) -> Vec<String> {
        let repo = Repository::open(self.repo()).expect("open repository");
        if repo.head().is_err() {
            return Vec::new();
        }
        let mut walk = repo.revwalk().expect("revwalk");
        walk.push_head().expect("push head");
        walk.map(|oid| {
            let commit = repo.find_commit(oid.expect("oid")).expect("commit");
            commit.summary().unwrap_or_default().to_string()
        })
        .collect()
    }

    /// Snapshot of everything under home except the repository's `.git`:
    /// `(relative path, symlink target or file bytes)`, sorted.
    pub fn tree(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(&self.home)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1)
        {
            let entry = entry.expect("walk home");
            let path = entry.path();
            if path.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }
            let rel = path
                .strip_prefix(&self.home)
                .expect("under home")
                .to_string_lossy()
                .into_owned();
            let ft = entry.file_type();
            let value = if ft.is_symlink() {
                format!(
                    "-> {}",
                    std::fs::read_link(path).expect("read link").display()
                )
            } else if ft.is_file() {
                std::fs::read_to_string(path).expect("read file")
            } else {
                "/".to_string()
            };
            out.push((rel, value));
        }
        out
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
    init: bool,
    remote: bool,
}

impl TestContextBuilder {
    /// Begin building an empty home.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
            init: false,
            remote: false,
        }
    }

    /// Write `~/<rel>` before the repository is created.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        self.ctx.write_home(rel, content);
        self
    }

    /// Initialize the repository.
    pub fn initialized(mut self) -> Self {
        self.init = true;
        self
    }

    /// Initialize the repository and attach a bare `origin`.
    pub fn with_remote(mut self) -> Self {
        self.init = true;
        self.remote = true;
        self
    }

    /// Finalise and return the context.
    pub fn build(self) -> IntegrationTestContext {
        if self.init {
            self.ctx.init();
        }
        if self.remote {
            self.ctx.attach_remote();
        }
        self.ctx
    }
}
