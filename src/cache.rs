// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Process-lifetime transform cache
//!
//! Entries are validated by full-content comparison against the file's
//! current text, not by hashing or mtime. A touched-but-unchanged file, a
//! copied file, or clock skew can never produce a stale hit.

use crate::exports::CssExport;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::{debug, warn};

use crate::error::Result;

/// Resident-set-size threshold past which the whole cache is dropped
pub const MEMORY_PRESSURE_THRESHOLD: u64 = 250 * 1024 * 1024;

/// Everything produced by one transform of a CSS Modules source
///
/// Shared by reference between the cache entry and the value handed back to
/// the host; immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Generated JS (imports the built CSS module, exports the class mapping)
    pub js: String,
    /// Generated CSS, with the source map inlined when present
    pub css: String,
    /// Raw export table from the transform engine
    pub exports: HashMap<String, CssExport>,
    /// Directory that subsequent relative imports resolve against
    pub resolve_dir: PathBuf,
}

/// Cached transform keyed by the snapshot of its input
struct CacheEntry {
    /// Full source text the cached result was produced from
    input_snapshot: String,
    /// The transform produced from that snapshot
    result: Arc<TransformResult>,
}

/// Probe returning the current process's resident memory in bytes
pub type MemoryProbe = Box<dyn Fn() -> u64 + Send + Sync>;

/// Thread-safe transform cache keyed by absolute source path
pub struct TransformCache {
    entries: DashMap<PathBuf, CacheEntry>,
    probe: MemoryProbe,
}

impl TransformCache {
    /// Create an empty cache using the process RSS as its memory probe
    pub fn new() -> Self {
        Self::with_probe(Box::new(process_rss))
    }

    /// Create an empty cache with a custom memory probe
    pub fn with_probe(probe: MemoryProbe) -> Self {
        Self {
            entries: DashMap::new(),
            probe,
        }
    }

    /// Get the cached result for `path` if its input is still current
    ///
    /// Re-reads the file's current content and returns the cached result
    /// only on exact equality with the stored snapshot. A mismatch is a soft
    /// miss: the entry is retained so a future `set` can refresh it. Read
    /// errors propagate; a failed freshness read must not report a stale hit.
    pub async fn get(&self, path: &Path) -> Result<Option<Arc<TransformResult>>> {
        let (snapshot, result) = match self.entries.get(path) {
            Some(entry) => (entry.input_snapshot.clone(), Arc::clone(&entry.result)),
            None => return Ok(None),
        };

        let current = tokio::fs::read_to_string(path).await?;
        if current == snapshot {
            debug!("Transform cache hit for {}", path.display());
            Ok(Some(result))
        } else {
            debug!("Transform cache stale for {}", path.display());
            Ok(None)
        }
    }

    /// Store a transform result, reusing already-read source text
    ///
    /// When the process is over the memory threshold the entire cache is
    /// cleared before inserting. Coarse global backpressure, not per-entry
    /// LRU.
    pub fn set(&self, path: PathBuf, result: Arc<TransformResult>, origin_content: String) {
        let rss = (self.probe)();
        if rss > MEMORY_PRESSURE_THRESHOLD {
            warn!(
                "Process memory at {} bytes, dropping {} cached transforms",
                rss,
                self.entries.len()
            );
            self.entries.clear();
        }

        self.entries.insert(
            path,
            CacheEntry {
                input_snapshot: origin_content,
                result,
            },
        );
    }

    /// Empty all entries unconditionally
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached transforms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Current process resident set size in bytes
fn process_rss() -> u64 {
    let mut system = System::new();
    match sysinfo::get_current_pid() {
        Ok(pid) => {
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::new().with_memory(),
            );
            system.process(pid).map(|p| p.memory()).unwrap_or(0)
        }
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn dummy_result(css: &str) -> Arc<TransformResult> {
        Arc::new(TransformResult {
            js: "export default {};".to_string(),
            css: css.to_string(),
            exports: HashMap::new(),
            resolve_dir: PathBuf::from("/tmp"),
        })
    }

    #[tokio::test]
    async fn test_hit_after_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.module.css");
        tokio::fs::write(&path, ".btn { color: red; }").await.unwrap();

        let cache = TransformCache::new();
        cache.set(
            path.clone(),
            dummy_result(".btn_x { color: red; }"),
            ".btn { color: red; }".to_string(),
        );

        let hit = cache.get(&path).await.unwrap().unwrap();
        assert_eq!(hit.css, ".btn_x { color: red; }");
    }

    #[tokio::test]
    async fn test_stale_after_content_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.module.css");
        tokio::fs::write(&path, "a").await.unwrap();

        let cache = TransformCache::new();
        cache.set(path.clone(), dummy_result("a'"), "a".to_string());

        tokio::fs::write(&path, "b").await.unwrap();
        assert!(cache.get(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_miss_retains_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.module.css");
        tokio::fs::write(&path, "a").await.unwrap();

        let cache = TransformCache::new();
        cache.set(path.clone(), dummy_result("a'"), "a".to_string());

        tokio::fs::write(&path, "b").await.unwrap();
        assert!(cache.get(&path).await.unwrap().is_none());
        assert_eq!(cache.len(), 1);

        // Restoring the original content revalidates the retained entry
        tokio::fs::write(&path, "a").await.unwrap();
        let hit = cache.get(&path).await.unwrap().unwrap();
        assert_eq!(hit.css, "a'");
    }

    #[tokio::test]
    async fn test_absent_entry_is_a_miss_without_read() {
        let cache = TransformCache::new();
        let miss = cache.get(Path::new("/nonexistent/styles.module.css")).await;
        assert!(miss.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_freshness_read_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.module.css");
        tokio::fs::write(&path, "a").await.unwrap();

        let cache = TransformCache::new();
        cache.set(path.clone(), dummy_result("a'"), "a".to_string());

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(cache.get(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_pressure_clears_before_insert() {
        let rss = Arc::new(AtomicU64::new(0));
        let probe_rss = Arc::clone(&rss);
        let cache =
            TransformCache::with_probe(Box::new(move || probe_rss.load(Ordering::Relaxed)));

        for i in 0..10 {
            cache.set(
                PathBuf::from(format!("/app/styles-{i}.module.css")),
                dummy_result("x"),
                "x".to_string(),
            );
        }
        assert_eq!(cache.len(), 10);

        rss.store(MEMORY_PRESSURE_THRESHOLD + 1, Ordering::Relaxed);
        cache.set(
            PathBuf::from("/app/one-more.module.css"),
            dummy_result("y"),
            "y".to_string(),
        );
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = TransformCache::new();
        cache.set(PathBuf::from("/a"), dummy_result("a"), "a".to_string());
        cache.set(PathBuf::from("/b"), dummy_result("b"), "b".to_string());
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
    }
}
