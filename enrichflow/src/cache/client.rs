//! Namespaced, TTL-aware cache façade used by tools.

use super::{CacheCategory, CacheKey, KvStore};
use crate::config::CacheConfig;
use crate::errors::CacheError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// TTL written by [`Cache::delete`]; stores treat it as already expired.
const DELETE_TTL: Duration = Duration::ZERO;

/// Cache façade over a [`KvStore`] connector.
///
/// Payloads are opaque bytes; an empty payload is a value like any other.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KvStore>,
    config: CacheConfig,
}

impl Cache {
    /// Creates a cache with the default configuration.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_config(store, CacheConfig::default())
    }

    /// Creates a cache with an explicit configuration.
    #[must_use]
    pub fn with_config(store: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Reads raw bytes at `key`.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let value = self.store.get(key).await?;
        trace!(key, hit = value.is_some(), "Cache read");
        Ok(value)
    }

    /// Writes raw bytes at `key`, replacing any previous entry.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        trace!(key, bytes = value.len(), ttl_ms = ?ttl.map(|t| t.as_millis()), "Cache write");
        self.store.set(key, value, ttl).await
    }

    /// Returns true if `key` holds a live entry.
    pub async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Makes `key` absent by overwriting it with an immediately expiring marker.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        debug!(key, "Cache delete");
        self.store.set(key, Vec::new(), Some(DELETE_TTL)).await
    }

    /// Reads and decodes a JSON value at `key`.
    ///
    /// # Errors
    ///
    /// A payload that does not decode as `T` is [`CacheError::Decode`], not absence.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Decode {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Encodes `value` as JSON and writes it at `key`.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.set(key, bytes, ttl).await
    }

    /// Reads a JSON value at a category key.
    pub async fn fetch<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        self.get_json(key.as_str()).await
    }

    /// Writes a JSON value at a category key with that category's TTL.
    pub async fn store<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> Result<(), CacheError> {
        let ttl = self.config.ttl_for(key.category());
        self.set_json(key.as_str(), value, Some(ttl)).await
    }

    /// Returns the cached value at `key`, or runs `loader`, caches its result
    /// with the category TTL, and returns it.
    ///
    /// Loader errors are returned unchanged and nothing is cached. Cache
    /// failures are logged and fall through to the loader.
    pub async fn get_or_load<T, F, Fut>(&self, key: &CacheKey, loader: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.fetch::<T>(key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => debug!(key = %key, error = %e, "Cache read failed; loading"),
        }

        let value = loader().await?;
        if let Err(e) = self.store(key, &value).await {
            debug!(key = %key, error = %e, "Cache write failed; continuing uncached");
        }
        Ok(value)
    }

    /// Builds a key under this cache's prefix.
    pub fn key<I, S>(
        &self,
        category: CacheCategory,
        network_id: u64,
        parts: I,
    ) -> Result<CacheKey, CacheError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CacheKey::build(self.prefix(), category, network_id, parts)
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryStore, MockKvStore};
    use mockall::predicate::{always, eq};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TokenMeta {
        symbol: String,
        decimals: u8,
    }

    fn memory_cache() -> Cache {
        Cache::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_long_ttl_round_trip_is_exact() {
        let cache = memory_cache();
        let payload = vec![0u8, 159, 146, 150, 255];
        cache
            .set("k", payload.clone(), Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(payload));
        assert!(cache.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_payload_is_a_value() {
        let cache = memory_cache();
        cache
            .set("k", Vec::new(), Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(Vec::new()));
        assert!(cache.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_writes_zero_ttl() {
        let mut store = MockKvStore::new();
        store
            .expect_set()
            .with(eq("k"), eq(Vec::<u8>::new()), eq(Some(Duration::ZERO)))
            .times(1)
            .returning(|_, _, _| Ok(()));

        Cache::new(Arc::new(store)).delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_elapsed_ttl_reads_absent() {
        let cache = memory_cache();
        cache
            .set("k", b"v".to_vec(), Some(Duration::from_nanos(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_immediately_absent() {
        let cache = memory_cache();
        cache.set("k", b"v".to_vec(), None).await.unwrap();
        cache.delete("k").await.unwrap();

        assert!(!cache.has("k").await.unwrap());
        assert_eq!(cache.get_json::<String>("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_typed_store_and_fetch() {
        let cache = memory_cache();
        let key = CacheKey::metadata(cache.prefix(), 1, "0xA0b8").unwrap();
        let meta = TokenMeta {
            symbol: "USDC".into(),
            decimals: 6,
        };

        cache.store(&key, &meta).await.unwrap();
        assert_eq!(cache.fetch::<TokenMeta>(&key).await.unwrap(), Some(meta));
    }

    #[tokio::test]
    async fn test_decode_failure_is_an_error() {
        let cache = memory_cache();
        cache.set("k", b"not json".to_vec(), None).await.unwrap();

        let err = cache.get_json::<TokenMeta>("k").await.unwrap_err();
        assert!(matches!(err, CacheError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_store_uses_category_ttl() {
        let mut store = MockKvStore::new();
        store
            .expect_set()
            .with(
                eq("enrichflow:price:1:0xabc:usd"),
                always(),
                eq(Some(Duration::from_secs(3600))),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let cache = Cache::new(Arc::new(store));
        let key = cache.key(CacheCategory::Price, 1, ["0xabc", "usd"]).unwrap();
        cache.store(&key, &3120.5_f64).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_or_load_loads_once() {
        let cache = memory_cache();
        let key = CacheKey::decimals(cache.prefix(), 1, "0xabc").unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let decimals: u8 = cache
                .get_or_load(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(18)
                })
                .await
                .unwrap();
            assert_eq!(decimals, 18);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_survives_backend_failure() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .returning(|_| Err(CacheError::backend("connection refused")));
        store
            .expect_set()
            .returning(|_, _, _| Err(CacheError::backend("connection refused")));

        let cache = Cache::new(Arc::new(store));
        let key = CacheKey::name(cache.prefix(), 1, "0xabc").unwrap();
        let name: String = cache
            .get_or_load(&key, || async { Ok("vitalik.eth".to_string()) })
            .await
            .unwrap();
        assert_eq!(name, "vitalik.eth");
    }

    #[tokio::test]
    async fn test_get_or_load_propagates_loader_error() {
        let cache = memory_cache();
        let key = CacheKey::abi(cache.prefix(), 1, "0xabc").unwrap();

        let result: anyhow::Result<String> = cache
            .get_or_load(&key, || async { anyhow::bail!("explorer unavailable") })
            .await;
        assert!(result.is_err());
        assert!(!cache.has(key.as_str()).await.unwrap());
    }
}
