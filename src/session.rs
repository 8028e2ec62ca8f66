//! Sessions: entry points that share one cache across traversals

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;

use crate::cache::SessionCache;
use crate::error::GenerateError;
use crate::output::{OutputConfig, StreamingFormatter, render_tree};
use crate::tree::{
    EventSink, EventStream, Hooks, StreamingWalker, StructureConfig, TraversalMode, TreeReport,
    TreeWalker, WalkSummary,
};

/// Formatted text produced by one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOutput {
    pub text: String,
    pub total_items: usize,
    pub duration: Duration,
}

/// Owns the caches shared by every traversal started from it.
///
/// Dropping the session clears its caches. Event streams still running keep
/// their own handle on the cache until they finish.
#[derive(Debug)]
pub struct Session {
    cache: Arc<SessionCache>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    /// Cache entries expire after `ttl`; `None` keeps them for the session.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            cache: Arc::new(SessionCache::with_ttl(ttl)),
        }
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Drop every cached stat and gitignore rule set.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Materialize the filtered, sorted tree under `root`.
    pub fn build_tree(
        &self,
        root: &Path,
        config: &StructureConfig,
        mut hooks: Hooks,
    ) -> Result<TreeReport, GenerateError> {
        let root = validate_root(root)?;
        TreeWalker::new(config.clone())
            .with_cache(Arc::clone(&self.cache))
            .walk(&root, &mut hooks)
    }

    /// Stream events for `root` into `sink` on the calling thread.
    pub fn walk<S: EventSink + ?Sized>(
        &self,
        root: &Path,
        config: &StructureConfig,
        sink: &mut S,
        mut hooks: Hooks,
    ) -> Result<WalkSummary, GenerateError> {
        let root = validate_root(root)?;
        StreamingWalker::new(config.clone())
            .with_cache(Arc::clone(&self.cache))
            .walk(&root, sink, &mut hooks)
    }

    /// Stream events for `root` from a background thread.
    pub fn stream(
        &self,
        root: &Path,
        config: &StructureConfig,
        hooks: Hooks,
    ) -> Result<EventStream, GenerateError> {
        let root = validate_root(root)?;
        StreamingWalker::new(config.clone())
            .with_cache(Arc::clone(&self.cache))
            .spawn(root, hooks)
    }

    /// Produce formatted text for `root`, eagerly or by streaming per `config.mode`.
    pub fn generate(
        &self,
        root: &Path,
        config: &StructureConfig,
        hooks: Hooks,
    ) -> Result<GenerateOutput, GenerateError> {
        let output_config = OutputConfig::new(config.clone());
        match config.mode {
            TraversalMode::Eager => {
                let report = self.build_tree(root, config, hooks)?;
                let text = render_tree(&report, &output_config)?;
                Ok(GenerateOutput {
                    text,
                    total_items: report.total_items,
                    duration: report.duration,
                })
            }
            TraversalMode::Streaming => {
                let mut formatter = StreamingFormatter::new(output_config, Vec::new());
                let summary = self.walk(root, config, &mut formatter, hooks)?;
                Ok(GenerateOutput {
                    text: String::from_utf8_lossy(&formatter.into_inner()).into_owned(),
                    total_items: summary.total_items,
                    duration: summary.duration,
                })
            }
        }
    }

    /// Generate several roots in parallel, sharing this session's cache.
    ///
    /// `jobs == 0` uses rayon's default pool. Results keep the input order.
    pub fn generate_many(
        &self,
        roots: &[PathBuf],
        config: &StructureConfig,
        jobs: usize,
    ) -> Vec<Result<GenerateOutput, GenerateError>> {
        let run = || {
            roots
                .par_iter()
                .map(|root| self.generate(root, config, Hooks::new()))
                .collect()
        };

        if jobs == 0 {
            return run();
        }
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                // Fall back to rayon's global pool if custom pool creation fails
                tracing::warn!(error = %e, "failed to build thread pool, using global pool");
                run()
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cache.clear();
    }
}

/// Check that `root` exists and is a directory, returning its canonical path.
pub fn validate_root(root: &Path) -> Result<PathBuf, GenerateError> {
    let meta = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => GenerateError::RootNotFound(root.to_path_buf()),
        _ => GenerateError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    })?;
    if !meta.is_dir() {
        return Err(GenerateError::NotADirectory(root.to_path_buf()));
    }
    fs::canonicalize(root).map_err(|e| GenerateError::Io {
        path: root.to_path_buf(),
        source: e,
    })
}

/// Generate with a fresh session.
pub fn generate(
    root: &Path,
    config: &StructureConfig,
    hooks: Hooks,
) -> Result<GenerateOutput, GenerateError> {
    Session::new().generate(root, config, hooks)
}

/// Stream with a fresh session.
pub fn stream(
    root: &Path,
    config: &StructureConfig,
    hooks: Hooks,
) -> Result<EventStream, GenerateError> {
    Session::new().stream(root, config, hooks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("README.md"), "# demo").unwrap();
        dir
    }

    #[test]
    fn test_validate_root_errors() {
        let dir = fixture();
        let missing = dir.path().join("missing");
        assert!(matches!(
            validate_root(&missing),
            Err(GenerateError::RootNotFound(p)) if p == missing
        ));
        assert!(matches!(
            validate_root(&dir.path().join("README.md")),
            Err(GenerateError::NotADirectory(_))
        ));
        assert!(validate_root(dir.path()).is_ok());
    }

    #[test]
    fn test_generate_modes_agree() {
        let dir = fixture();
        let session = Session::new();
        let eager = session
            .generate(dir.path(), &StructureConfig::default(), Hooks::new())
            .unwrap();
        let streaming = session
            .generate(
                dir.path(),
                &StructureConfig {
                    mode: TraversalMode::Streaming,
                    ..Default::default()
                },
                Hooks::new(),
            )
            .unwrap();
        assert_eq!(eager.text, streaming.text);
        assert_eq!(eager.total_items, 3);
        assert_eq!(streaming.total_items, 3);
    }

    #[test]
    fn test_session_shares_and_clears_cache() {
        let dir = fixture();
        let session = Session::new();
        let config = StructureConfig {
            include_size: true,
            ..Default::default()
        };
        session.build_tree(dir.path(), &config, Hooks::new()).unwrap();
        assert!(!session.cache().stats().is_empty());
        assert!(!session.cache().gitignore().is_empty());

        session.clear();
        assert!(session.cache().stats().is_empty());
    }

    #[test]
    fn test_generate_many_keeps_order() {
        let first = fixture();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("only.txt"), "").unwrap();

        let roots = vec![
            first.path().to_path_buf(),
            second.path().join("missing"),
            second.path().to_path_buf(),
        ];
        let results = Session::new().generate_many(&roots, &StructureConfig::default(), 2);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().total_items, 3);
        assert!(matches!(results[1], Err(GenerateError::RootNotFound(_))));
        assert!(results[2].as_ref().unwrap().text.contains("only.txt"));
    }
}
