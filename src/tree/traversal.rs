//! Common tree traversal logic shared by TreeWalker and StreamingWalker.

use std::fs;
use std::io;
use std::path::Path;

use crate::cache::SessionCache;
use crate::error::GenerateError;

use super::config::StructureConfig;
use super::entry::{EntryKind, FileEntry};
use super::filter::{FilterPipeline, RawEntry};
use super::utils::join_relative;

/// Common base traversal functionality shared by both walker implementations.
pub struct BaseTraversal<'a> {
    pub config: &'a StructureConfig,
    cache: &'a SessionCache,
    filter: FilterPipeline<'a>,
}

impl<'a> BaseTraversal<'a> {
    pub fn new(config: &'a StructureConfig, cache: &'a SessionCache) -> Self {
        Self {
            config,
            cache,
            filter: FilterPipeline::new(config, cache),
        }
    }

    /// Check if a directory at `depth` must not be descended into
    pub fn at_max_depth(&self, depth: usize) -> bool {
        self.config.at_max_depth(depth)
    }

    pub fn should_compress(&self, child_count: usize) -> bool {
        self.config.should_compress(child_count)
    }

    /// Get the name of a path, defaulting to "." for root
    pub fn get_name(&self, path: &Path) -> String {
        path.file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string())
    }

    /// Build the decorated root entry. Its children are not read here.
    pub fn root_entry(&self, root: &Path) -> Result<FileEntry, GenerateError> {
        let mut entry = FileEntry::new(self.get_name(root), ".", EntryKind::Directory);
        if self.config.needs_stat() {
            let stat = self.cache.stat(root).ok_or_else(|| GenerateError::Io {
                path: root.to_path_buf(),
                source: io::Error::other("cannot stat root"),
            })?;
            entry.apply_stat(&stat, self.config);
        }
        Ok(entry)
    }

    /// Read a directory without filtering, sorted by file name.
    pub fn read_entries(&self, dir: &Path, relative: &str) -> io::Result<Vec<RawEntry>> {
        let mut entries: Vec<_> = fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|a| a.file_name());
        tracing::trace!(dir = %dir.display(), count = entries.len(), "read directory");

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                // file_type() does not follow symlinks
                let file_type = entry.file_type().ok()?;
                let kind = if file_type.is_symlink() {
                    EntryKind::Symlink
                } else if file_type.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                let name = entry.file_name().to_string_lossy().to_string();
                Some(RawEntry {
                    relative: join_relative(relative, &name),
                    path: entry.path(),
                    name,
                    kind,
                })
            })
            .collect())
    }

    /// Read and filter a directory listing.
    pub fn read_and_filter_entries(
        &self,
        dir: &Path,
        relative: &str,
    ) -> io::Result<Vec<RawEntry>> {
        let entries = self.read_entries(dir, relative)?;
        Ok(self.filter.apply(entries, dir))
    }

    /// Like [`read_and_filter_entries`](Self::read_and_filter_entries), but an
    /// unreadable directory is logged and reported as `None`.
    pub fn try_read_children(&self, raw: &RawEntry) -> Option<Vec<RawEntry>> {
        match self.read_and_filter_entries(&raw.path, &raw.relative) {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::debug!(path = %raw.path.display(), error = %e, "skipping unreadable directory");
                None
            }
        }
    }

    /// Turn a raw entry into a [`FileEntry`], statting it when metadata is
    /// requested. `None` means the stat failed and the entry is skipped.
    pub fn decorate(&self, raw: &RawEntry) -> Option<FileEntry> {
        let mut entry = FileEntry::new(raw.name.clone(), raw.relative.clone(), raw.kind);
        if self.config.needs_stat() {
            let stat = self.cache.stat(&raw.path)?;
            entry.apply_stat(&stat, self.config);
        }
        Some(entry)
    }

    /// Calculate the prefix for child entries
    pub fn calculate_child_prefix(&self, current_prefix: &str, is_last: bool) -> String {
        if is_last {
            format!("{}    ", current_prefix)
        } else {
            format!("{}│   ", current_prefix)
        }
    }
}

/// Map a root listing failure to a traversal error.
pub(crate) fn root_read_error(root: &Path, source: io::Error) -> GenerateError {
    GenerateError::Io {
        path: root.to_path_buf(),
        source,
    }
}
