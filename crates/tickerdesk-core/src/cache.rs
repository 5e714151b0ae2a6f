//! In-memory TTL cache with single-flight refresh per key.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

/// Defines how a lookup interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a non-expired entry if present; otherwise load and store. (Default)
    #[default]
    Use,
    /// Always load, then overwrite the cached entry.
    Refresh,
    /// Always load; never read or write the cache.
    Bypass,
}

/// Value returned from a cache-gated load.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup<V> {
    pub value: V,
    pub cache_hit: bool,
}

impl<V> CacheLookup<V> {
    fn hit(value: V) -> Self {
        Self {
            value,
            cache_hit: true,
        }
    }

    fn miss(value: V) -> Self {
        Self {
            value,
            cache_hit: false,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V: Clone> CacheInner<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    /// Insert `value` and drop every entry that has already expired.
    fn put(&mut self, key: String, value: V, ttl_override: Option<Duration>) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);

        let ttl = ttl_override.unwrap_or(self.default_ttl);
        self.map.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }
}

/// Thread-safe TTL cache keyed by the caller's input-parameter set.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Arc<RwLock<CacheInner<V>>>,
    refresh_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            refresh_locks: Arc::clone(&self.refresh_locks),
        }
    }
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                map: HashMap::new(),
                default_ttl,
            })),
            refresh_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.read().await.get(key)
    }

    /// Store `value`; a no-op when the cache is disabled.
    pub async fn put(&self, key: String, value: V, ttl_override: Option<Duration>) {
        let mut store = self.inner.write().await;
        if store.default_ttl == Duration::ZERO {
            return;
        }
        store.put(key, value, ttl_override);
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.write().await.map.remove(key);
    }

    /// Drop every entry whose key starts with `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        self.inner
            .write()
            .await
            .map
            .retain(|key, _| !key.starts_with(prefix));
    }

    pub async fn clear_expired(&self) {
        let now = Instant::now();
        self.inner
            .write()
            .await
            .map
            .retain(|_, entry| entry.expires_at > now);
    }

    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
        self.refresh_locks.lock().await.clear();
    }

    /// Number of entries, including expired ones not yet cleared.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_disabled(&self) -> bool {
        self.inner.read().await.default_ttl == Duration::ZERO
    }

    /// Serve `key` from the cache or run `loader` and store its value.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        mode: CacheMode,
        loader: F,
    ) -> CacheLookup<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let result = self
            .try_get_or_refresh(key, ttl, mode, || async {
                Ok::<V, Infallible>(loader().await)
            })
            .await;

        match result {
            Ok(lookup) => lookup,
            Err(never) => match never {},
        }
    }

    /// Like [`get_or_refresh`](Self::get_or_refresh) for fallible loaders. Errors are never cached.
    ///
    /// Concurrent callers for the same key wait on one another, so at most one
    /// loader runs per key; waiters re-check the cache before loading.
    pub async fn try_get_or_refresh<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        mode: CacheMode,
        loader: F,
    ) -> Result<CacheLookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if mode == CacheMode::Bypass {
            return loader().await.map(CacheLookup::miss);
        }

        if mode == CacheMode::Use {
            if let Some(value) = self.get(key).await {
                return Ok(CacheLookup::hit(value));
            }
        }

        let key_lock = self.refresh_lock(key).await;
        let result = self.load_locked(&key_lock, key, ttl, mode, loader).await;
        self.release_refresh_lock(key, &key_lock).await;
        result
    }

    async fn load_locked<F, Fut, E>(
        &self,
        key_lock: &Mutex<()>,
        key: &str,
        ttl: Option<Duration>,
        mode: CacheMode,
        loader: F,
    ) -> Result<CacheLookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let _guard = key_lock.lock().await;

        if mode == CacheMode::Use {
            if let Some(value) = self.get(key).await {
                return Ok(CacheLookup::hit(value));
            }
        }

        let value = loader().await?;
        self.put(key.to_owned(), value.clone(), ttl).await;
        Ok(CacheLookup::miss(value))
    }

    async fn refresh_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        Arc::clone(locks.entry(key.to_owned()).or_default())
    }

    /// Forget the lock for `key` once no other caller holds or waits on it.
    async fn release_refresh_lock(&self, key: &str, key_lock: &Arc<Mutex<()>>) {
        let mut locks = self.refresh_locks.lock().await;
        let idle = locks
            .get(key)
            .is_some_and(|lock| Arc::ptr_eq(lock, key_lock) && Arc::strong_count(lock) == 2);
        if idle {
            locks.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = TtlCache::new(Duration::from_secs(1));

        assert!(cache.get("key1").await.is_none());

        cache.put("key1".to_string(), 1_u32, None).await;
        assert_eq!(cache.get("key1").await, Some(1));

        cache.put("key1".to_string(), 2, None).await;
        assert_eq!(cache.get("key1").await, Some(2));

        cache.invalidate("key1").await;
        assert!(cache.get("key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = TtlCache::new(Duration::from_millis(100));

        cache.put("key1".to_string(), "value1".to_string(), None).await;
        assert!(cache.get("key1").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("key1").await.is_none());
        cache.clear_expired().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_or_refresh_serves_second_call_from_cache() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        let first = cache
            .get_or_refresh("quotes:2330.TW", None, CacheMode::Use, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                vec![1.0_f64]
            })
            .await;
        let second = cache
            .get_or_refresh("quotes:2330.TW", None, CacheMode::Use, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                vec![2.0_f64]
            })
            .await;

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(second.value, vec![1.0]);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_mode_reloads_and_bypass_skips_storage() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("k".to_string(), 1_u8, None).await;

        let refreshed = cache
            .get_or_refresh("k", None, CacheMode::Refresh, || async { 2_u8 })
            .await;
        assert!(!refreshed.cache_hit);
        assert_eq!(cache.get("k").await, Some(2));

        let bypassed = cache
            .get_or_refresh("k", None, CacheMode::Bypass, || async { 3_u8 })
            .await;
        assert_eq!(bypassed.value, 3);
        assert_eq!(cache.get("k").await, Some(2));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));

        let failed = cache
            .try_get_or_refresh("t", None, CacheMode::Use, || async {
                Err::<String, &str>("translator down")
            })
            .await;
        assert_eq!(failed, Err("translator down"));
        assert!(cache.get("t").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_load() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let loads = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let loads = Arc::clone(&loads);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh("news", None, CacheMode::Use, || async {
                        loads.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        7_u32
                    })
                    .await
                    .value
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.expect("task should finish"), 7);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_prefix_and_disabled_cache() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("quotes:a".to_string(), 1_u8, None).await;
        cache.put("quotes:b".to_string(), 2, None).await;
        cache.put("news:all".to_string(), 3, None).await;
        cache.invalidate_prefix("quotes:").await;
        assert_eq!(cache.len().await, 1);

        let disabled: TtlCache<u8> = TtlCache::disabled();
        assert!(disabled.is_disabled().await);
        disabled.put("k".to_string(), 1, None).await;
        assert!(disabled.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_put_prunes_expired_entries_and_locks_are_released() {
        let cache = TtlCache::new(Duration::from_millis(200));
        for index in 0..20 {
            cache
                .get_or_refresh(&format!("headline-{index}"), None, CacheMode::Use, || async move {
                    index
                })
                .await;
        }
        assert_eq!(cache.len().await, 20);
        assert!(cache.refresh_locks.lock().await.is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        cache.put("fresh".to_string(), 99, None).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("fresh").await, Some(99));
    }

    #[test]
    fn test_cache_mode_default() {
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }
}
