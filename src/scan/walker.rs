use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::clock::to_wire;
use crate::config::{ScanSettings, DATA_DIR};
use crate::error::Result;
use crate::models::FileRecord;
use crate::scan::hasher;

/// A file observed on disk during a folder walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Path relative to the walked folder (forward slashes).
    pub relative_path: String,
    pub filename: String,
    pub size: u64,
    /// Modification time in wire format.
    pub last_modified: String,
    pub hash: Option<String>,
}

impl WalkedFile {
    #[must_use]
    pub fn to_record(&self) -> FileRecord {
        let mut record = FileRecord::new(
            self.relative_path.clone(),
            self.filename.clone(),
            self.size,
            self.last_modified.clone(),
        );
        record.file_hash.clone_from(&self.hash);
        record
    }
}

/// Recursive folder walker configured from the scan settings.
pub struct FolderWalker<'a> {
    settings: &'a ScanSettings,
}

impl<'a> FolderWalker<'a> {
    pub fn new(settings: &'a ScanSettings) -> Self {
        Self { settings }
    }

    /// Walk `root` and describe every tracked file, sorted by relative path.
    ///
    /// Unreadable files are logged and skipped.
    pub fn walk(&self, root: &Path) -> Result<Vec<WalkedFile>> {
        let entries: Vec<PathBuf> = WalkBuilder::new(root)
            .hidden(!self.settings.scan_hidden)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .follow_links(false)
            .filter_entry(|e| e.file_name() != DATA_DIR)
            .build()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    tracing::warn!("walk error under {}: {err}", root.display());
                    None
                }
            })
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .filter(|e| !self.settings.is_excluded(e.path()))
            .map(ignore::DirEntry::into_path)
            .collect();

        let hash_files = self.settings.hash_files;
        let mut files: Vec<WalkedFile> = entries
            .par_iter()
            .filter_map(|path| match self.describe(root, path, hash_files) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!("skipping {}: {e}", path.display());
                    None
                }
            })
            .collect();

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    fn describe(&self, root: &Path, path: &Path, hash_files: bool) -> Result<Option<WalkedFile>> {
        let meta = path.metadata()?;
        let size = meta.len();
        if self.settings.is_file_too_large(size) {
            tracing::debug!("skipping {} ({size} bytes, too large)", path.display());
            return Ok(None);
        }
        let modified: DateTime<Utc> = meta.modified()?.into();
        let hash = if hash_files {
            Some(hasher::hash_file(path)?)
        } else {
            None
        };
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Some(WalkedFile {
            relative_path,
            filename,
            size,
            last_modified: to_wire(modified),
            hash,
        }))
    }
}

/// Immediate subdirectories of `root`, sorted.
pub fn list_subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
