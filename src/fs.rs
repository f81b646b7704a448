//! Filesystem primitives: adoption checks, moves, relative symlinks and
//! directory walks.
use std::io;
use std::os::unix::fs::{DirBuilderExt as _, PermissionsExt as _};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{LnkError, Result};

/// Mode used for directories created on the way to a payload or symlink.
const DIR_MODE: u32 = 0o755;

/// Kind of an adoptable filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory (adopted as a single unit).
    Directory,
}

/// Returns `true` if something (including a dangling symlink) exists at `path`.
#[must_use]
pub fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Returns `true` if `path` is a symlink, dangling or not.
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink())
}

/// Check that `path` can be adopted and report its kind.
///
/// Symlinks are not followed.
///
/// # Errors
///
/// Returns [`LnkError::FileNotFound`] if nothing exists at `path` and
/// [`LnkError::UnsupportedType`] for symlinks, sockets, devices and FIFOs.
pub fn validate_for_add(path: &Path) -> Result<EntryKind> {
    let meta = path.symlink_metadata().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            LnkError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LnkError::fs("stat", path, e)
        }
    })?;
    let ft = meta.file_type();
    if ft.is_file() {
        Ok(EntryKind::File)
    } else if ft.is_dir() {
        Ok(EntryKind::Directory)
    } else {
        Err(LnkError::UnsupportedType {
            path: path.to_path_buf(),
        })
    }
}

/// Check that `path` is an lnk-created symlink and return the absolute
/// location it points to.  The target itself may be missing.
///
/// # Errors
///
/// Returns [`LnkError::FileNotFound`] if nothing exists at `path`, or
/// [`LnkError::NotManaged`] if it is not a symlink into `repo_root`.
pub fn validate_for_release(path: &Path, repo_root: &Path) -> Result<PathBuf> {
    let meta = path.symlink_metadata().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            LnkError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LnkError::fs("stat", path, e)
        }
    })?;
    let not_managed = || LnkError::NotManaged {
        path: path.to_path_buf(),
    };
    if !meta.file_type().is_symlink() {
        return Err(not_managed());
    }
    let target = resolve_link(path).map_err(|e| LnkError::fs("read symlink", path, e))?;
    if target.starts_with(repo_root) && target != repo_root {
        Ok(target)
    } else {
        Err(not_managed())
    }
}

/// Read the symlink at `link` and return its target as an absolute,
/// lexically normalized path.  Relative targets are resolved against the
/// canonical parent directory of `link`.
///
/// # Errors
///
/// Returns an error if `link` is not a symlink or its parent cannot be
/// canonicalized.
pub fn resolve_link(link: &Path) -> io::Result<PathBuf> {
    let target = std::fs::read_link(link)?;
    if target.is_absolute() {
        return Ok(normalize_lexically(&target));
    }
    let parent = link.parent().unwrap_or_else(|| Path::new("."));
    let parent = dunce::canonicalize(parent)?;
    Ok(normalize_lexically(&parent.join(target)))
}

/// Returns `true` if `link` is a symlink whose target resolves to the same
/// location as `expected`.
#[must_use]
pub fn is_valid_symlink(link: &Path, expected: &Path) -> bool {
    if !is_symlink(link) {
        return false;
    }
    let (Ok(resolved), Ok(expected)) = (resolve_link(link), dunce::canonicalize(expected))
    else {
        return false;
    };
    dunce::canonicalize(&resolved).is_ok_and(|actual| actual == expected)
}

/// Remove `.` components and fold `..` without touching the filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Relative path from directory `base` to `path`.  Both must be absolute
/// and normalized.
#[must_use]
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<Component<'_>> = path.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();
    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in path.iter().skip(common) {
        out.push(component);
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Create the missing ancestors of `path` with mode 0755.
///
/// Returns the directories that were created, outermost first, so a caller
/// can remove them again.
///
/// # Errors
///
/// Returns an error if a directory cannot be created.
pub fn create_parent_dirs(path: &Path) -> Result<Vec<PathBuf>> {
    let Some(parent) = path.parent() else {
        return Ok(Vec::new());
    };
    let mut missing = Vec::new();
    let mut cursor = parent;
    while !cursor.as_os_str().is_empty() && !exists(cursor) {
        missing.push(cursor.to_path_buf());
        match cursor.parent() {
            Some(p) => cursor = p,
            None => break,
        }
    }
    missing.reverse();
    if !missing.is_empty() {
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(DIR_MODE)
            .create(parent)
            .map_err(|e| LnkError::fs("create directory", parent, e))?;
    }
    Ok(missing)
}

/// Remove directories previously returned by [`create_parent_dirs`], innermost
/// first, stopping at the first one that is not empty.
pub fn remove_created_dirs(dirs: &[PathBuf]) {
    for dir in dirs.iter().rev() {
        if std::fs::remove_dir(dir).is_err() {
            break;
        }
    }
}

/// Move `src` to `dst`, creating `dst`'s parent directories.
///
/// Uses an atomic rename where possible and falls back to copy-then-delete
/// across filesystems.  If the copy fails the partial destination is removed
/// and `src` is left untouched.
///
/// # Errors
///
/// Returns an error if `dst` already exists or the move fails.
pub fn move_path(src: &Path, dst: &Path) -> Result<()> {
    if exists(dst) {
        return Err(LnkError::fs(
            "move",
            dst,
            io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"),
        ));
    }
    create_parent_dirs(dst)?;
    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                "{} and {} are on different filesystems, copying",
                src.display(),
                dst.display()
            );
            copy_then_remove(src, dst)
        }
        Err(e) => Err(LnkError::fs("move", src, e)),
    }
}

/// Copy `src` to `dst`, then delete `src`.  A failed copy removes whatever
/// part of `dst` was written and leaves `src` alone.
fn copy_then_remove(src: &Path, dst: &Path) -> Result<()> {
    if let Err(e) = copy_recursive(src, dst) {
        if let Err(cleanup) = remove_any(dst) {
            tracing::warn!("could not remove partial copy: {cleanup}");
        }
        return Err(LnkError::fs("copy", src, e));
    }
    remove_any(src)
}

/// Copy a file, directory tree or symlink, preserving permissions and
/// keeping symlinks as links.
fn copy_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = src.symlink_metadata()?;
    let ft = meta.file_type();
    if ft.is_symlink() {
        std::os::unix::fs::symlink(std::fs::read_link(src)?, dst)
    } else if ft.is_dir() {
        std::fs::create_dir(dst)?;
        for entry in std::fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
        std::fs::set_permissions(dst, meta.permissions())
    } else {
        std::fs::copy(src, dst).map(|_| ())
    }
}

/// Create a symlink at `link` pointing to `target` via a relative path.
///
/// The relative path is computed between the canonical parent of `link`
/// and the canonical `target`, so the pair survives relocation of a common
/// ancestor.
///
/// # Errors
///
/// Returns an error if `target` does not exist, the parent directories
/// cannot be created, or the link cannot be written.
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    create_parent_dirs(link)?;
    let parent = link.parent().unwrap_or_else(|| Path::new("/"));
    let parent = dunce::canonicalize(parent).map_err(|e| LnkError::fs("resolve", parent, e))?;
    let target_abs =
        dunce::canonicalize(target).map_err(|e| LnkError::fs("resolve", target, e))?;
    let relative = relative_path(&target_abs, &parent);
    std::os::unix::fs::symlink(&relative, link)
        .map_err(|e| LnkError::fs("create symlink", link, e))
}

/// Remove whatever exists at `path`: file, symlink or directory tree.  A
/// missing path is not an error.
///
/// # Errors
///
/// Returns an error if the entry exists but cannot be removed.
pub fn remove_any(path: &Path) -> Result<()> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| LnkError::fs("remove", path, e))
}

/// Make `path` executable (mode 0755).
///
/// # Errors
///
/// Returns an error if the permissions cannot be changed.
pub fn make_executable(path: &Path) -> Result<()> {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| LnkError::fs("chmod", path, e))
}

/// Result of expanding a directory for recursive adoption.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Walk {
    /// Regular files, sorted by full path.
    pub files: Vec<PathBuf>,
    /// Symlinks that were encountered and left alone.
    pub skipped_symlinks: Vec<PathBuf>,
}

/// Enumerate every regular file below `dir` without following symlinks.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn walk_files(dir: &Path) -> Result<Walk> {
    let mut walk = Walk::default();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            LnkError::fs("walk", path, e.into())
        })?;
        let ft = entry.file_type();
        if ft.is_symlink() {
            walk.skipped_symlinks.push(entry.into_path());
        } else if ft.is_file() {
            walk.files.push(entry.into_path());
        }
    }
    walk.files.sort();
    Ok(walk)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn validate_for_add_reports_kind() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(validate_for_add(&file).unwrap(), EntryKind::File);
        assert_eq!(validate_for_add(dir.path()).unwrap(), EntryKind::Directory);
    }

    #[test]
    fn validate_for_add_rejects_missing_and_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            validate_for_add(&missing),
            Err(LnkError::FileNotFound { .. })
        ));

        let link = dir.path().join("link");
        symlink("/etc/hostname", &link).unwrap();
        assert!(matches!(
            validate_for_add(&link),
            Err(LnkError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn relative_path_walks_up_and_down() {
        assert_eq!(
            relative_path(Path::new("/h/.config/lnk/.bashrc"), Path::new("/h")),
            PathBuf::from(".config/lnk/.bashrc")
        );
        assert_eq!(
            relative_path(
                Path::new("/h/.config/lnk/.config/nvim/init.lua"),
                Path::new("/h/.config/nvim")
            ),
            PathBuf::from("../lnk/.config/nvim/init.lua")
        );
    }

    #[test]
    fn create_symlink_is_relative_and_valid() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("repo").join("a.txt");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "a").unwrap();
        let link = dir.path().join("home").join("sub").join("a.txt");

        create_symlink(&target, &link).unwrap();

        let raw = std::fs::read_link(&link).unwrap();
        assert!(raw.is_relative());
        assert_eq!(raw, PathBuf::from("../../repo/a.txt"));
        assert!(is_valid_symlink(&link, &target));
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "a");
    }

    #[test]
    fn is_valid_symlink_detects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();
        let link = dir.path().join("link");
        symlink("a", &link).unwrap();

        assert!(is_valid_symlink(&link, &a));
        assert!(!is_valid_symlink(&link, &b));
        assert!(!is_valid_symlink(&a, &a), "regular file is not a symlink");
    }

    #[test]
    fn validate_for_release_requires_link_into_repo() {
        let dir = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        let repo = root.join("repo");
        std::fs::create_dir(&repo).unwrap();
        std::fs::write(repo.join("f"), "x").unwrap();
        std::fs::write(root.join("outside"), "x").unwrap();

        let managed = root.join("managed");
        symlink("repo/f", &managed).unwrap();
        assert_eq!(validate_for_release(&managed, &repo).unwrap(), repo.join("f"));

        let foreign = root.join("foreign");
        symlink("outside", &foreign).unwrap();
        assert!(matches!(
            validate_for_release(&foreign, &repo),
            Err(LnkError::NotManaged { .. })
        ));
        assert!(matches!(
            validate_for_release(&root.join("outside"), &repo),
            Err(LnkError::NotManaged { .. })
        ));
    }

    #[test]
    fn validate_for_release_accepts_dangling_link() {
        let dir = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        let repo = root.join("repo");
        std::fs::create_dir(&repo).unwrap();
        let link = root.join("gone");
        symlink("repo/missing", &link).unwrap();
        assert_eq!(
            validate_for_release(&link, &repo).unwrap(),
            repo.join("missing")
        );
    }

    #[test]
    fn move_path_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::write(&src, "s").unwrap();
        std::fs::write(&dst, "d").unwrap();
        assert!(move_path(&src, &dst).is_err());
        assert_eq!(std::fs::read_to_string(&src).unwrap(), "s");
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "d");
    }

    #[test]
    fn failed_copy_removes_partial_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("kept"), "k").unwrap();
        let _listener = std::os::unix::net::UnixListener::bind(src.join("sock")).unwrap();
        let dst = dir.path().join("dst");

        assert!(matches!(
            copy_then_remove(&src, &dst),
            Err(LnkError::Filesystem { .. })
        ));
        assert!(!exists(&dst));
        assert_eq!(std::fs::read_to_string(src.join("kept")).unwrap(), "k");
    }

    #[test]
    fn move_path_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("inner"), "i").unwrap();
        let dst = dir.path().join("a").join("b").join("dst");
        move_path(&src, &dst).unwrap();
        assert!(!exists(&src));
        assert_eq!(std::fs::read_to_string(dst.join("inner")).unwrap(), "i");
    }

    #[test]
    fn copy_recursive_preserves_mode_and_links() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        let script = src.join("run.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o750)).unwrap();
        symlink("run.sh", src.join("alias")).unwrap();

        let dst = dir.path().join("dst");
        copy_recursive(&src, &dst).unwrap();

        let mode = std::fs::metadata(dst.join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o750);
        assert_eq!(
            std::fs::read_link(dst.join("alias")).unwrap(),
            PathBuf::from("run.sh")
        );
    }

    #[test]
    fn create_parent_dirs_reports_created() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a").join("b").join("f");
        let created = create_parent_dirs(&file).unwrap();
        assert_eq!(
            created,
            vec![dir.path().join("a"), dir.path().join("a").join("b")]
        );
        remove_created_dirs(&created);
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn remove_any_handles_every_kind() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        std::fs::create_dir_all(tree.join("x")).unwrap();
        std::fs::write(tree.join("x").join("f"), "f").unwrap();
        let dangling = dir.path().join("dangling");
        symlink("nowhere", &dangling).unwrap();

        remove_any(&tree).unwrap();
        remove_any(&dangling).unwrap();
        remove_any(&dir.path().join("absent")).unwrap();
        assert!(!exists(&tree));
        assert!(!exists(&dangling));
    }

    #[test]
    fn walk_files_sorts_and_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("a")).unwrap();
        std::fs::write(root.join("a.txt"), "").unwrap();
        std::fs::write(root.join("a").join("b.txt"), "").unwrap();
        std::fs::write(root.join("z"), "").unwrap();
        symlink("z", root.join("link")).unwrap();

        let walk = walk_files(root).unwrap();
        assert_eq!(
            walk.files,
            vec![root.join("a").join("b.txt"), root.join("a.txt"), root.join("z")]
        );
        assert_eq!(walk.skipped_symlinks, vec![root.join("link")]);
    }

    #[test]
    fn normalize_lexically_folds_parent() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }
}
