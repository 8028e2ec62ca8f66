//! Session caches for filesystem metadata and gitignore rule sets
//!
//! Both caches are keyed maps with an optional time-to-live per entry. They
//! belong to a [`SessionCache`], which is created for a session and cleared
//! (or dropped) when the session ends. Entries are immutable once inserted,
//! so concurrent traversals sharing a cache can only ever cause redundant
//! work, never inconsistent results.

use std::borrow::Borrow;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;

use crate::gitignore::GitignoreRuleSet;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.duration_since(self.inserted_at) >= ttl)
    }
}

/// Hit/miss counters for a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Concurrent key/value cache with optional per-entry expiry.
#[derive(Debug)]
pub struct TtlCache<K: Eq + Hash, V> {
    entries: DashMap<K, CacheEntry<V>>,
    default_ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    /// Create a cache. `None` keeps entries until [`clear`](Self::clear).
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Look up a live entry. Expired entries are evicted on access.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        // The map guard must be released before evicting.
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Some(None) => {
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Return the cached value, computing and inserting it on a miss.
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

/// The subset of filesystem metadata a traversal consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Unix mode bits, when the platform provides them.
    pub mode: Option<u32>,
    pub readonly: bool,
}

impl EntryStat {
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
            mode: mode_bits(meta),
            readonly: meta.permissions().readonly(),
        }
    }
}

#[cfg(unix)]
fn mode_bits(meta: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode())
}

#[cfg(not(unix))]
fn mode_bits(_meta: &fs::Metadata) -> Option<u32> {
    None
}

/// Cached gitignore lookup result. `None` records that no `.gitignore` governs the directory.
pub type GitignoreLookup = Option<Arc<GitignoreRuleSet>>;

/// The stats and gitignore caches for one session.
#[derive(Debug)]
pub struct SessionCache {
    stats: TtlCache<PathBuf, EntryStat>,
    gitignore: TtlCache<PathBuf, GitignoreLookup>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            stats: TtlCache::new(ttl),
            gitignore: TtlCache::new(ttl),
        }
    }

    /// Stat a path without following symlinks. Failures are not cached.
    pub fn stat(&self, path: &Path) -> Option<EntryStat> {
        if let Some(stat) = self.stats.get(path) {
            return Some(stat);
        }
        match fs::symlink_metadata(path) {
            Ok(meta) => {
                let stat = EntryStat::from_metadata(&meta);
                self.stats.insert(path.to_path_buf(), stat);
                Some(stat)
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "stat failed");
                None
            }
        }
    }

    pub fn stats(&self) -> &TtlCache<PathBuf, EntryStat> {
        &self.stats
    }

    pub fn gitignore(&self) -> &TtlCache<PathBuf, GitignoreLookup> {
        &self.gitignore
    }

    pub fn clear(&self) {
        tracing::debug!(
            stats = self.stats.len(),
            gitignore = self.gitignore.len(),
            "clearing session caches"
        );
        self.stats.clear();
        self.gitignore.clear();
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_insert_and_get() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_entries_expire() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        cache.insert_with_ttl("short".to_string(), 1, Some(Duration::from_millis(10)));
        cache.insert("forever".to_string(), 2);

        thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("forever"), Some(2));
        assert_eq!(cache.len(), 1, "expired entry should be evicted on access");
    }

    #[test]
    fn test_get_or_insert_with_computes_once() {
        let cache: TtlCache<u32, u32> = TtlCache::new(None);
        let mut calls = 0;
        let first = cache.get_or_insert_with(7, || {
            calls += 1;
            49
        });
        let second = cache.get_or_insert_with(7, || {
            calls += 1;
            0
        });
        assert_eq!((first, second), (49, 49));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_clear() {
        let cache: TtlCache<u32, u32> = TtlCache::new(None);
        cache.insert(1, 1);
        cache.insert(2, 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_session_stat_is_cached() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        fs::write(&file, vec![0u8; 128]).unwrap();

        let cache = SessionCache::new();
        let stat = cache.stat(&file).expect("stat should succeed");
        assert_eq!(stat.size, 128);

        // Snapshot semantics: a later change is not observed until cleared.
        fs::write(&file, vec![0u8; 4]).unwrap();
        assert_eq!(cache.stat(&file).unwrap().size, 128);

        cache.clear();
        assert_eq!(cache.stat(&file).unwrap().size, 4);
    }

    #[test]
    fn test_session_stat_missing_path() {
        let cache = SessionCache::new();
        assert!(cache.stat(Path::new("/definitely/not/here")).is_none());
        assert!(cache.stats().is_empty(), "failures must not be cached");
    }
}
