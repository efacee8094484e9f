//! In-memory proxy cache for small, immutable assets (QR images,
//! thumbnails, generic files).
//!
//! One mutex guards the whole map: reads update recency, inserts may
//! trigger eviction, and the periodic sweep runs under the same lock. The
//! eviction policy deliberately trades hit rate for bounded memory: when
//! pressure is detected, the least-recently-accessed half of the entries is
//! dropped in one pass. The object store remains the source of truth; every
//! entry is rebuildable, nothing here is ever persisted.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

/// Resource class of a cached object; determines the per-item size ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    Qr,
    Thumbnail,
    File,
}

impl CacheCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::Qr => "qr",
            CacheCategory::Thumbnail => "thumbnail",
            CacheCategory::File => "file",
        }
    }

    /// Per-item ceiling as a fraction of the total cache budget. Objects
    /// above the ceiling are served but never cached.
    fn item_ceiling_fraction(&self) -> f64 {
        match self {
            CacheCategory::Qr => 0.10,
            CacheCategory::Thumbnail => 0.20,
            CacheCategory::File => 0.20,
        }
    }
}

/// A cached object as served to clients.
#[derive(Debug, Clone)]
pub struct CachedObject {
    pub bytes: Bytes,
    pub content_type: String,
    pub etag: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    bytes: Bytes,
    content_type: String,
    etag: String,
    last_access: Instant,
}

/// Bounded proxy cache with oldest-half eviction.
pub struct ProxyCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    budget_bytes: usize,
    max_entries: usize,
}

impl ProxyCache {
    pub fn new(budget_bytes: usize, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            budget_bytes,
            max_entries,
        }
    }

    fn cache_key(category: CacheCategory, key: &str) -> String {
        format!("{}:{}", category.as_str(), key)
    }

    /// Look up a cached object, refreshing its recency on hit.
    pub fn get(&self, category: CacheCategory, key: &str) -> Option<CachedObject> {
        let mut entries = self.entries.lock().ok()?;
        let entry = entries.get_mut(&Self::cache_key(category, key))?;
        entry.last_access = Instant::now();
        Some(CachedObject {
            bytes: entry.bytes.clone(),
            content_type: entry.content_type.clone(),
            etag: entry.etag.clone(),
        })
    }

    /// Insert an object unless it exceeds its category's item ceiling.
    /// Returns whether the object was cached. May evict under pressure.
    pub fn insert_if_cacheable(
        &self,
        category: CacheCategory,
        key: &str,
        object: CachedObject,
    ) -> bool {
        let ceiling =
            (self.budget_bytes as f64 * category.item_ceiling_fraction()) as usize;
        if object.bytes.len() > ceiling {
            tracing::debug!(
                category = category.as_str(),
                key = %key,
                size_bytes = object.bytes.len(),
                ceiling_bytes = ceiling,
                "Object exceeds cache ceiling, serving uncached"
            );
            return false;
        }

        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        entries.insert(
            Self::cache_key(category, key),
            CacheEntry {
                bytes: object.bytes,
                content_type: object.content_type,
                etag: object.etag,
                last_access: Instant::now(),
            },
        );
        if Self::over_pressure(&entries, self.budget_bytes, self.max_entries) {
            Self::evict_oldest_half(&mut entries);
        }
        true
    }

    /// Opportunistic eviction pass; also called by the periodic sweep task.
    pub fn sweep(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            if Self::over_pressure(&entries, self.budget_bytes, self.max_entries) {
                Self::evict_oldest_half(&mut entries);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn over_pressure(
        entries: &HashMap<String, CacheEntry>,
        budget_bytes: usize,
        max_entries: usize,
    ) -> bool {
        if entries.len() > max_entries {
            return true;
        }
        let total: usize = entries.values().map(|e| e.bytes.len()).sum();
        total > budget_bytes
    }

    /// Drop the least-recently-accessed half of the entries.
    fn evict_oldest_half(entries: &mut HashMap<String, CacheEntry>) {
        if entries.is_empty() {
            return;
        }
        let mut by_access: Vec<(String, Instant)> = entries
            .iter()
            .map(|(k, e)| (k.clone(), e.last_access))
            .collect();
        by_access.sort_by_key(|(_, at)| *at);

        let evict_count = (by_access.len() / 2).max(1);
        for (key, _) in by_access.into_iter().take(evict_count) {
            entries.remove(&key);
        }
        tracing::debug!(evicted = evict_count, remaining = entries.len(), "Cache eviction pass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(size: usize) -> CachedObject {
        CachedObject {
            bytes: Bytes::from(vec![0u8; size]),
            content_type: "image/png".to_string(),
            etag: "\"abc\"".to_string(),
        }
    }

    #[test]
    fn test_hit_returns_stored_object() {
        let cache = ProxyCache::new(1024 * 1024, 16);
        assert!(cache.insert_if_cacheable(CacheCategory::Qr, "k", object(100)));

        let hit = cache.get(CacheCategory::Qr, "k").unwrap();
        assert_eq!(hit.bytes.len(), 100);
        assert_eq!(hit.content_type, "image/png");
        assert!(cache.get(CacheCategory::Thumbnail, "k").is_none());
    }

    #[test]
    fn test_item_ceiling_per_category() {
        // Budget 1000: qr ceiling 100, thumbnail ceiling 200
        let cache = ProxyCache::new(1000, 16);
        assert!(!cache.insert_if_cacheable(CacheCategory::Qr, "big", object(150)));
        assert!(cache.insert_if_cacheable(CacheCategory::Thumbnail, "big", object(150)));
        assert!(cache.get(CacheCategory::Qr, "big").is_none());
        assert!(cache.get(CacheCategory::Thumbnail, "big").is_some());
    }

    #[test]
    fn test_count_pressure_evicts_oldest_half() {
        let cache = ProxyCache::new(1024 * 1024, 4);
        for i in 0..4 {
            cache.insert_if_cacheable(CacheCategory::File, &format!("k{}", i), object(10));
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        // Touch k0 so it is the most recently accessed
        cache.get(CacheCategory::File, "k0").unwrap();
        // Fifth insert crosses the threshold and halves the cache
        cache.insert_if_cacheable(CacheCategory::File, "k4", object(10));

        assert!(cache.len() <= 3);
        // Recently-touched and newest entries survive
        assert!(cache.get(CacheCategory::File, "k0").is_some());
        assert!(cache.get(CacheCategory::File, "k4").is_some());
        assert!(cache.get(CacheCategory::File, "k1").is_none());
    }

    #[test]
    fn test_size_pressure_evicts() {
        let cache = ProxyCache::new(1000, 100);
        for i in 0..6 {
            cache.insert_if_cacheable(CacheCategory::File, &format!("k{}", i), object(190));
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        // 6 * 190 > 1000 triggered an eviction pass along the way
        assert!(cache.len() < 6);
    }

    #[test]
    fn test_sweep_without_pressure_is_noop() {
        let cache = ProxyCache::new(1024 * 1024, 16);
        cache.insert_if_cacheable(CacheCategory::Qr, "k", object(10));
        cache.sweep();
        assert_eq!(cache.len(), 1);
    }
}
