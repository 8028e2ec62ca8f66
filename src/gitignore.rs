//! `.gitignore` discovery and matching
//!
//! The resolver walks upward from a directory to the nearest `.gitignore`,
//! compiles its lines through [`PatternMatcher`], and caches the result per
//! queried directory. Rule sets are snapshots: a `.gitignore` edited during a
//! session is not re-read until the cache is cleared.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{GitignoreLookup, SessionCache, TtlCache};
use crate::pattern::{PatternMatcher, to_slash_path};

pub const GITIGNORE_FILE: &str = ".gitignore";

#[derive(Debug, Clone)]
struct IgnoreRule {
    matcher: PatternMatcher,
    negated: bool,
    dir_only: bool,
}

impl IgnoreRule {
    fn parse(line: &str) -> Option<Self> {
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };
        let matcher = match body.strip_prefix('/') {
            Some(rest) => PatternMatcher::anchored(rest),
            None => PatternMatcher::compile(body),
        };
        if matcher.as_str().is_empty() {
            return None;
        }
        Some(Self {
            matcher,
            negated,
            dir_only,
        })
    }
}

/// Compiled rules from one `.gitignore`, bound to the directory containing it.
#[derive(Debug, Clone)]
pub struct GitignoreRuleSet {
    root: PathBuf,
    patterns: Vec<String>,
    rules: Vec<IgnoreRule>,
}

impl GitignoreRuleSet {
    /// Parse `.gitignore` contents. Blank lines and `#` comments are dropped.
    pub fn parse(root: impl Into<PathBuf>, contents: &str) -> Self {
        let patterns: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        let rules = patterns.iter().filter_map(|p| IgnoreRule::parse(p)).collect();
        Self {
            root: root.into(),
            patterns,
            rules,
        }
    }

    /// Directory containing the governing `.gitignore`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check an absolute path. Paths outside the ignore root never match.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(relative) => self.matches_relative(&to_slash_path(relative), is_dir),
            Err(_) => false,
        }
    }

    /// Check a path relative to the ignore root. The last matching rule wins.
    pub fn matches_relative(&self, relative: &str, is_dir: bool) -> bool {
        if relative.is_empty() {
            return false;
        }
        let mut ignored = false;
        for rule in &self.rules {
            if rule.dir_only && !is_dir {
                continue;
            }
            if rule.matcher.matches(relative) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

/// Finds and caches the rule set governing a directory.
pub struct GitignoreResolver<'a> {
    cache: &'a TtlCache<PathBuf, GitignoreLookup>,
}

impl<'a> GitignoreResolver<'a> {
    pub fn new(cache: &'a SessionCache) -> Self {
        Self {
            cache: cache.gitignore(),
        }
    }

    /// Resolve the nearest `.gitignore` at or above `directory`.
    ///
    /// Unreadable files are treated as absent. The result (including "none")
    /// is cached under `directory` itself.
    pub fn resolve(&self, directory: &Path) -> Option<Arc<GitignoreRuleSet>> {
        self.cache
            .get_or_insert_with(directory.to_path_buf(), || {
                find_nearest(directory).map(Arc::new)
            })
    }
}

fn find_nearest(directory: &Path) -> Option<GitignoreRuleSet> {
    for ancestor in directory.ancestors() {
        let candidate = ancestor.join(GITIGNORE_FILE);
        match fs::read_to_string(&candidate) {
            Ok(contents) => {
                tracing::trace!(path = %candidate.display(), "loaded gitignore");
                return Some(GitignoreRuleSet::parse(ancestor, &contents));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::debug!(
                    path = %candidate.display(),
                    error = %e,
                    "unreadable gitignore treated as absent"
                );
            }
        }
    }
    None
}
