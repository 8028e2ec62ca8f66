//! TreeWalker - builds full tree in memory

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::SessionCache;
use crate::error::GenerateError;

use super::config::StructureConfig;
use super::entry::FileEntry;
use super::filter::RawEntry;
use super::hooks::Hooks;
use super::sort::sort_entries;
use super::traversal::{BaseTraversal, root_read_error};

/// A fully materialized, filtered and sorted tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeReport {
    pub root: FileEntry,
    /// Entries below the root.
    pub total_items: usize,
    pub duration: Duration,
}

/// Tree walker that builds the full tree in memory.
/// For very large trees, use StreamingWalker instead.
pub struct TreeWalker {
    config: StructureConfig,
    cache: Arc<SessionCache>,
}

impl TreeWalker {
    pub fn new(config: StructureConfig) -> Self {
        Self {
            config,
            cache: Arc::new(SessionCache::new()),
        }
    }

    /// Share a session cache instead of using a private one.
    pub fn with_cache(mut self, cache: Arc<SessionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Walk `root`, which must be an existing directory.
    pub fn walk(&self, root: &Path, hooks: &mut Hooks) -> Result<TreeReport, GenerateError> {
        let start = Instant::now();
        let base = BaseTraversal::new(&self.config, &self.cache);

        hooks.check_cancelled()?;
        let mut root_entry = base.root_entry(root)?;
        let listing = base
            .read_and_filter_entries(root, ".")
            .map_err(|e| root_read_error(root, e))?;

        let mut processed = 0;
        let mut children = self.walk_entries(&base, listing, 1, hooks, &mut processed)?;
        sort_entries(&mut children, self.config.sort_by);
        root_entry.children = Some(children);

        let duration = start.elapsed();
        tracing::debug!(
            root = %root.display(),
            total_items = processed,
            duration_ms = duration.as_millis() as u64,
            "tree built"
        );
        Ok(TreeReport {
            root: root_entry,
            total_items: processed,
            duration,
        })
    }

    /// Build the entries of one directory. `depth` is the depth of the
    /// entries themselves.
    fn walk_entries(
        &self,
        base: &BaseTraversal<'_>,
        entries: Vec<RawEntry>,
        depth: usize,
        hooks: &mut Hooks,
        processed: &mut usize,
    ) -> Result<Vec<FileEntry>, GenerateError> {
        hooks.check_cancelled()?;

        let mut children = Vec::with_capacity(entries.len());
        for raw in entries {
            let Some(mut entry) = base.decorate(&raw) else {
                continue;
            };

            // Unreadable directories are left out entirely.
            let listing = if raw.kind.is_dir() && !base.at_max_depth(depth) {
                match base.try_read_children(&raw) {
                    Some(listing) => Some(listing),
                    None => continue,
                }
            } else {
                None
            };

            *processed += 1;
            hooks.advance(1, || format!("Processing {}", raw.relative));

            if raw.kind.is_dir() {
                entry.children = Some(match listing {
                    Some(listing) if base.should_compress(listing.len()) => {
                        entry.collapsed = Some(listing.len());
                        Vec::new()
                    }
                    Some(listing) => self.walk_entries(base, listing, depth + 1, hooks, processed)?,
                    None => Vec::new(),
                });
            }
            children.push(entry);
        }
        Ok(children)
    }
}
