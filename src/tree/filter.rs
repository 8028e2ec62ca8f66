//! Entry filtering for tree walking
//!
//! Entries pass through the stages in a fixed order:
//!
//! 1. hidden entries (unless `include_hidden`)
//! 2. excluded folder names
//! 3. extension whitelist (files only)
//! 4. exclude patterns, matched against the root-relative path
//! 5. the governing `.gitignore` (when `respect_gitignore`)
//! 6. directories first, when sorting by name

use std::path::{Path, PathBuf};

use crate::cache::SessionCache;
use crate::gitignore::GitignoreResolver;
use crate::pattern::PatternMatcher;

use super::config::{SortKey, StructureConfig};
use super::entry::EntryKind;

/// One directory listing entry before metadata decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Root-relative path with `/` separators.
    pub relative: String,
    pub kind: EntryKind,
}

impl RawEntry {
    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

/// The filter stages for one traversal, with patterns compiled once.
pub struct FilterPipeline<'a> {
    config: &'a StructureConfig,
    excludes: Vec<PatternMatcher>,
    gitignore: Option<GitignoreResolver<'a>>,
}

impl<'a> FilterPipeline<'a> {
    pub fn new(config: &'a StructureConfig, cache: &'a SessionCache) -> Self {
        Self {
            config,
            excludes: config
                .exclude_patterns
                .iter()
                .map(|p| PatternMatcher::compile(p))
                .collect(),
            gitignore: config
                .respect_gitignore
                .then(|| GitignoreResolver::new(cache)),
        }
    }

    /// Filter the raw listing of `parent`, preserving relative order.
    pub fn apply(&self, entries: Vec<RawEntry>, parent: &Path) -> Vec<RawEntry> {
        let mut kept: Vec<RawEntry> = entries
            .into_iter()
            .filter(|e| self.passes_hidden(e))
            .filter(|e| self.passes_folder_exclusion(e))
            .filter(|e| self.passes_extension(e))
            .filter(|e| self.passes_patterns(e))
            .collect();

        if let Some(rules) = self.gitignore.as_ref().and_then(|r| r.resolve(parent)) {
            kept.retain(|e| !rules.is_ignored(&e.path, e.kind.is_dir()));
        }

        if self.config.sort_by == SortKey::Name {
            // Stable: false sorts before true.
            kept.sort_by_key(|e| !e.kind.is_dir());
        }

        kept
    }

    fn passes_hidden(&self, entry: &RawEntry) -> bool {
        self.config.include_hidden || !entry.name.starts_with('.')
    }

    fn passes_folder_exclusion(&self, entry: &RawEntry) -> bool {
        !(entry.kind.is_dir() && self.config.exclude_folders.iter().any(|f| *f == entry.name))
    }

    fn passes_extension(&self, entry: &RawEntry) -> bool {
        if self.config.extensions.is_empty() || entry.kind.is_dir() {
            return true;
        }
        entry
            .extension()
            .is_some_and(|ext| self.config.extensions.contains(&ext))
    }

    fn passes_patterns(&self, entry: &RawEntry) -> bool {
        !self.excludes.iter().any(|m| m.matches(&entry.relative))
    }
}
