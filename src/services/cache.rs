// src/services/cache.rs
// DOCUMENTATION: Keyed TTL store for memoized upstream responses
// PURPOSE: Avoid repeat geocode/details/site lookups during the process lifetime

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry {
    data: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: String, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Explicit keyed store: request key to timestamped value, with expiry
/// checked on every read. Values are JSON strings so one store serves
/// all upstream adapters.
pub struct ResponseCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Key for a Place Details memoization (keyed by the immutable
    /// external identifier).
    pub fn details_key(place_id: &str) -> String {
        format!("details:{}", place_id)
    }

    /// Key for a website event-link scan.
    pub fn links_key(website: &str) -> String {
        format!("links:{}", website)
    }

    /// Key for a geocoding lookup.
    pub fn geocode_key(query: &str) -> String {
        format!("geocode:{}", query.trim().to_lowercase())
    }

    /// Get a cached value, honoring expiry.
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;

        if let Some(entry) = store.get(key) {
            if !entry.is_expired() {
                log::debug!("Cache HIT for key: {}", key);
                return Some(entry.data.clone());
            }
            log::debug!("Cache EXPIRED for key: {}", key);
        } else {
            log::debug!("Cache MISS for key: {}", key);
        }

        None
    }

    /// Set a cached value with the default TTL.
    pub async fn set(&self, key: String, value: String) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Set a cached value with a custom TTL.
    pub async fn set_with_ttl(&self, key: String, value: String, ttl: Duration) {
        let mut store = self.store.write().await;
        store.insert(key.clone(), CacheEntry::new(value, ttl));
        log::debug!("Cache SET for key: {} (TTL: {}s)", key, ttl.as_secs());
    }

    /// Drop expired entries.
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    /// Snapshot of cache occupancy, exposed on /health.
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let total = store.len();
        let expired = store.values().filter(|e| e.is_expired()).count();

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

/// Cache statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Start background cleanup task
/// DOCUMENTATION: Periodically removes expired entries
pub fn start_cleanup_task(cache: Arc<ResponseCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_set_get() {
        tokio_test::block_on(async {
            let cache = ResponseCache::new(60);

            cache
                .set(ResponseCache::details_key("ChIJ1"), "{}".to_string())
                .await;

            assert_eq!(
                cache.get(&ResponseCache::details_key("ChIJ1")).await,
                Some("{}".to_string())
            );
            assert_eq!(cache.get(&ResponseCache::details_key("ChIJ2")).await, None);
        });
    }

    #[test]
    fn test_cache_expiration() {
        tokio_test::block_on(async {
            let cache = ResponseCache::new(60);

            cache
                .set_with_ttl(
                    "short".to_string(),
                    "value".to_string(),
                    Duration::from_millis(50),
                )
                .await;

            assert!(cache.get("short").await.is_some());
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(cache.get("short").await.is_none());

            cache.cleanup().await;
            let stats = cache.stats().await;
            assert_eq!(stats.total_entries, 0);
        });
    }

    #[test]
    fn test_key_shapes() {
        assert_eq!(ResponseCache::details_key("abc"), "details:abc");
        assert_eq!(
            ResponseCache::geocode_key("  Islamabad, Pakistan "),
            "geocode:islamabad, pakistan"
        );
        assert_ne!(
            ResponseCache::links_key("https://a.example"),
            ResponseCache::links_key("https://b.example")
        );
    }
}
