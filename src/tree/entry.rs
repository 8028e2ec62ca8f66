//! Tree node types shared by both walkers and every formatter

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::EntryStat;

use super::config::StructureConfig;
use super::utils::format_permissions;

/// What a directory entry is. Symlinks are never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// One node of the directory tree.
///
/// `path` is relative to the traversal root with `/` separators; the root
/// itself is `"."`. Directories built by the eager walker always carry
/// `Some(children)`, empty when depth-limited or collapsed. Entries carried by
/// stream events have `children: None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    /// Nine-character `rwxr-xr-x` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    /// Number of children summarized instead of listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileEntry>>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            size: None,
            modified_at: None,
            permissions: None,
            collapsed: None,
            children: None,
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, EntryKind::File)
    }

    pub fn directory(
        name: impl Into<String>,
        path: impl Into<String>,
        children: Vec<FileEntry>,
    ) -> Self {
        Self {
            children: Some(children),
            ..Self::new(name, path, EntryKind::Directory)
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Lowercased extension of the entry name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    pub fn children(&self) -> &[FileEntry] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Copy the requested metadata fields from a stat snapshot.
    pub fn apply_stat(&mut self, stat: &EntryStat, config: &StructureConfig) {
        if config.include_size {
            self.size = Some(stat.size);
        }
        if config.include_modified_date {
            self.modified_at = stat.modified.map(DateTime::<Utc>::from);
        }
        if config.include_permissions {
            self.permissions = Some(format_permissions(stat));
        }
    }

    /// Count `(directories, files)` below this entry. Symlinks count as files.
    pub fn count_descendants(&self) -> (usize, usize) {
        self.children().iter().fold((0, 0), |(dirs, files), child| {
            let (d, f) = child.count_descendants();
            if child.is_dir() {
                (dirs + d + 1, files + f)
            } else {
                (dirs + d, files + f + 1)
            }
        })
    }

    /// Pre-order iterator over every entry below this one.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children().iter().rev().collect(),
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a FileEntry>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a FileEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        self.stack.extend(entry.children().iter().rev());
        Some(entry)
    }
}
