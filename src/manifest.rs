//! Manifest store.
//!
//! A manifest is a UTF-8 text file with one home-relative path per line,
//! kept sorted and free of duplicates.  Writes go through a temporary file
//! in the same directory followed by a rename.
use std::collections::BTreeSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{LnkError, Result};
use crate::paths::{Host, Layout};

/// Parse manifest text into entries, skipping blank lines.
#[must_use]
pub fn parse(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Render entries as sorted, de-duplicated manifest text.  An empty list
/// renders as an empty string.
#[must_use]
pub fn render<I, S>(entries: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: BTreeSet<String> = entries.into_iter().map(Into::into).collect();
    set.into_iter().fold(String::new(), |mut out, entry| {
        out.push_str(&entry);
        out.push('\n');
        out
    })
}

/// Manifest file for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    /// Manifest stored at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Manifest for `host` inside `layout`'s repository.
    #[must_use]
    pub fn for_host(layout: &Layout, host: &Host) -> Self {
        Self::new(layout.manifest_path(host))
    }

    /// Location of the manifest file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries.  A missing file yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(LnkError::fs("read manifest", &self.path, e)),
        }
    }

    /// Returns `true` if `rel` is listed.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read.
    pub fn contains(&self, rel: &str) -> Result<bool> {
        Ok(self.read()?.iter().any(|entry| entry == rel))
    }

    /// Add `rel`.  Returns `false` if it was already listed.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or written.
    pub fn add(&self, rel: &str) -> Result<bool> {
        let mut entries = self.read()?;
        if entries.iter().any(|entry| entry == rel) {
            return Ok(false);
        }
        entries.push(rel.to_string());
        self.write(entries)?;
        Ok(true)
    }

    /// Remove `rel`.  Returns `false` if it was not listed.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or written.
    pub fn remove(&self, rel: &str) -> Result<bool> {
        let mut entries = self.read()?;
        let before = entries.len();
        entries.retain(|entry| entry != rel);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(entries)?;
        Ok(true)
    }

    /// Atomically replace the manifest with `entries`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed.
    pub fn write<I, S>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_bytes(render(entries).as_bytes())
    }

    /// Capture the current on-disk state so it can be put back later.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let content = match std::fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(LnkError::fs("read manifest", &self.path, e)),
        };
        Ok(Snapshot {
            manifest: self.clone(),
            content,
        })
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| LnkError::fs("create temporary manifest in", dir, e))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| LnkError::fs("write manifest", tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| LnkError::fs("replace manifest", &self.path, e.error))?;
        Ok(())
    }
}

/// Byte-exact copy of a manifest taken before a mutation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    manifest: Manifest,
    content: Option<Vec<u8>>,
}

impl Snapshot {
    /// Put the manifest back exactly as it was, deleting it if it did not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or removed.
    pub fn restore(&self) -> Result<()> {
        match &self.content {
            Some(bytes) => self.manifest.write_bytes(bytes),
            None => match std::fs::remove_file(&self.manifest.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(LnkError::fs("remove manifest", &self.manifest.path, e)),
            },
        }
    }
}

/// Every manifest at the repository root, common first, then hosts by name.
///
/// # Errors
///
/// Returns an error if the repository root cannot be listed.
pub fn discover(layout: &Layout) -> Result<Vec<(Host, Manifest)>> {
    let root = layout.repo_root();
    let entries = std::fs::read_dir(root).map_err(|e| LnkError::fs("list", root, e))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LnkError::fs("list", root, e))?;
        let name = entry.file_name();
        let Some(host) = name.to_str().and_then(Host::from_manifest_file_name) else {
            continue;
        };
        if entry.file_type().is_ok_and(|ft| ft.is_file()) {
            found.push((host, Manifest::new(entry.path())));
        }
    }
    found.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(found)
}
