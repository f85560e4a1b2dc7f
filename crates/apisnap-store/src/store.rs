//! Schema store - the filesystem boundary
//!
//! Provides the only operations that touch the schema root:
//! - Snapshot of existing files (before a run)
//! - Conditional canonical writes
//! - Stale file deletion with upward directory pruning

use crate::canonical;
use crate::error::{StoreError, StoreResult};
use crate::layout::SchemaLayout;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// File did not exist and was written
    Created,
    /// File existed with different content and was rewritten
    Updated,
    /// File already held the canonical content; nothing was touched
    Unchanged,
}

impl WriteOutcome {
    /// Whether the file on disk changed
    #[inline]
    #[must_use]
    pub fn is_change(self) -> bool {
        !matches!(self, WriteOutcome::Unchanged)
    }
}

/// Canonical on-disk schema tree
///
/// All paths handed to this type must lie inside the layout's root.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    layout: SchemaLayout,
}

impl SchemaStore {
    /// Open store at `root`, creating the directory if missing
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the root cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let layout = SchemaLayout::new(root);
        fs::create_dir_all(layout.root()).map_err(|e| StoreError::io(layout.root(), e))?;
        Ok(Self { layout })
    }

    /// Path naming for this store
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &SchemaLayout {
        &self.layout
    }

    /// Schema root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// All file paths currently under the root
    ///
    /// Directories are walked but not listed. Symlinks are reported as files
    /// and never followed.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if any directory cannot be read.
    pub fn snapshot(&self) -> StoreResult<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();

        for entry in WalkDir::new(self.root()).follow_links(false) {
            let entry = entry.map_err(|e| self.walk_error(e))?;
            if !entry.file_type().is_dir() {
                files.insert(entry.into_path());
            }
        }

        tracing::debug!("Snapshot of {} holds {} files", self.root().display(), files.len());
        Ok(files)
    }

    /// Write `value` to `path` in canonical form if the bytes differ
    ///
    /// Parent directories are created as needed. An unchanged file is not
    /// reopened for writing, so its modification time is preserved.
    ///
    /// # Errors
    /// - [`StoreError::OutsideRoot`] if `path` is not under the root
    /// - [`StoreError::Encode`] if rendering fails
    /// - [`StoreError::Io`] on any filesystem failure
    pub fn write_if_changed(&self, path: &Path, value: &Value) -> StoreResult<WriteOutcome> {
        self.ensure_inside(path)?;

        let rendered = canonical::render(value).map_err(|e| StoreError::encode(path, e))?;

        let previous = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(StoreError::io(path, e)),
        };

        if previous.as_deref() == Some(rendered.as_slice()) {
            tracing::debug!("Schema matches in {}", path.display());
            return Ok(WriteOutcome::Unchanged);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        tracing::debug!("Writing schema to {}", path.display());
        fs::write(path, &rendered).map_err(|e| StoreError::io(path, e))?;

        Ok(if previous.is_some() {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        })
    }

    /// Remove stale files and prune directories they leave empty
    ///
    /// Pruning walks upward from each removed file and stops at the first
    /// non-empty directory. The root itself is never removed.
    ///
    /// # Returns
    /// Removed file paths, in the order given.
    ///
    /// # Errors
    /// - [`StoreError::OutsideRoot`] if a path is not under the root
    /// - [`StoreError::Io`] on any filesystem failure
    pub fn delete_stale<'a, I>(&self, paths: I) -> StoreResult<Vec<PathBuf>>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut removed = Vec::new();

        for path in paths {
            self.ensure_inside(path)?;
            fs::remove_file(path).map_err(|e| StoreError::io(path, e))?;
            tracing::debug!("Removed stale schema {}", path.display());
            self.prune_empty_ancestors(path)?;
            removed.push(path.to_path_buf());
        }

        Ok(removed)
    }

    fn prune_empty_ancestors(&self, path: &Path) -> StoreResult<()> {
        let mut current = path.parent();

        while let Some(dir) = current {
            if !self.layout.contains(dir) {
                break;
            }
            let mut entries = fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
            if entries.next().is_some() {
                break;
            }
            fs::remove_dir(dir).map_err(|e| StoreError::io(dir, e))?;
            tracing::debug!("Pruned empty directory {}", dir.display());
            current = dir.parent();
        }

        Ok(())
    }

    fn walk_error(&self, err: walkdir::Error) -> StoreError {
        let path = err.path().unwrap_or(self.root()).to_path_buf();
        StoreError::io(path, err.into())
    }

    fn ensure_inside(&self, path: &Path) -> StoreResult<()> {
        if self.layout.contains(path) {
            Ok(())
        } else {
            Err(StoreError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.root().to_path_buf(),
            })
        }
    }
}
