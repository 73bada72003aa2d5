//! The get-or-fetch protocol between cache, network, and callers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheStore};

/// Last successful fetch time per resource, persisted under `last_sync`.
///
/// Distinct from per-entry expiry: the registry drives *proactive* refresh
/// (app foreground, periodic sync) and is only ever written by successful
/// fetches.
pub type SyncRegistry = HashMap<String, DateTime<Utc>>;

/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Served from a fresh cache entry; no network call was made.
    Cache,
    /// Fetched from the network this call.
    Network,
}

/// A value plus its provenance. The provenance is informational - callers
/// may treat the data identically regardless of source.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResult<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> SyncResult<T> {
    pub fn from_cache(&self) -> bool {
        self.source == DataSource::Cache
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    /// The collaborator's fetch reported failure or threw. Any previously
    /// cached value is left untouched for the caller to fall back to.
    #[error("fetch failed for {key}: {message}")]
    FetchFailed { key: CacheKey, message: String },
}

/// One resource in a bulk refresh: a cache slot plus the fetch that fills it.
pub struct RefreshTask {
    key: CacheKey,
    fetch: Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<Value>> + Send>,
}

impl RefreshTask {
    pub fn new<F, Fut>(key: CacheKey, fetch: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            key,
            fetch: Box::new(move || fetch().boxed()),
        }
    }
}

/// Decides, per resource, whether to serve cached data or fetch fresh.
///
/// Nothing here is fatal to the host application: fetch failures surface to
/// the caller with stale data left in place, and storage failures degrade to
/// fetching. Clone is cheap; clones share the cache and the in-flight map.
#[derive(Clone)]
pub struct SyncCoordinator {
    cache: CacheStore,
    /// Per-key fetch locks for single-flight de-duplication. Bounded by the
    /// closed `CacheKey` set, so entries are never removed.
    in_flight: Arc<Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>>,
    /// Serializes registry read-modify-writes so concurrent refreshes do
    /// not lose each other's timestamps.
    registry_lock: Arc<Mutex<()>>,
}

impl SyncCoordinator {
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            registry_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Serve `key` from cache if fresh, otherwise run `fetch` and write the
    /// result through.
    ///
    /// Concurrent calls for the same key are coalesced: the first caller
    /// fetches while the rest wait, then serve its freshly written entry
    /// instead of fetching again. `force_refresh` always fetches (but still
    /// serializes behind the key lock).
    ///
    /// A successful fetch updates the sync registry; a write failure after a
    /// successful fetch is logged and the data is still returned, it just
    /// is not cached for this cycle.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
        force_refresh: bool,
    ) -> Result<SyncResult<T>, SyncError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if !force_refresh {
            if let Some(data) = self.cache.get::<T>(key).await {
                return Ok(SyncResult {
                    data,
                    source: DataSource::Cache,
                });
            }
        }

        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        // Another caller may have fetched and populated the slot while we
        // waited on the lock.
        if !force_refresh {
            if let Some(data) = self.cache.get::<T>(key).await {
                debug!(key = %key, "Coalesced with in-flight fetch");
                return Ok(SyncResult {
                    data,
                    source: DataSource::Cache,
                });
            }
        }

        debug!(key = %key, force_refresh, "Fetching fresh data");
        match fetch().await {
            Ok(data) => {
                if let Err(e) = self.cache.set(key, &data).await {
                    warn!(key = %key, error = %e, "Failed to cache fetched data");
                }
                self.record_sync(key).await;
                Ok(SyncResult {
                    data,
                    source: DataSource::Network,
                })
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Fetch failed");
                Err(SyncError::FetchFailed {
                    key,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Refresh every listed resource concurrently, tolerating partial
    /// failure. One resource's failure never cancels the others; the result
    /// maps each resource name to whether its fetch succeeded.
    pub async fn refresh_all(&self, tasks: Vec<RefreshTask>) -> HashMap<String, bool> {
        let results = join_all(tasks.into_iter().map(|task| {
            let key = task.key;
            async move {
                let ok = match self.get_or_fetch(key, task.fetch, true).await {
                    Ok(_) => true,
                    Err(e) => {
                        debug!(key = %key, error = %e, "Refresh failed");
                        false
                    }
                };
                (key.as_str().to_string(), ok)
            }
        }))
        .await;

        let succeeded = results.iter().filter(|(_, ok)| *ok).count();
        debug!(total = results.len(), succeeded, "Bulk refresh complete");
        results.into_iter().collect()
    }

    /// When the last successful fetch for `key` happened, if ever.
    pub async fn last_sync(&self, key: CacheKey) -> Option<DateTime<Utc>> {
        let registry: SyncRegistry = self.cache.get(CacheKey::LastSync).await?;
        registry.get(key.as_str()).copied()
    }

    /// Whether a proactive background refresh is due for `key`.
    /// A resource that has never synced is infinitely stale.
    pub async fn needs_refresh(&self, key: CacheKey, max_age: Duration) -> bool {
        match self.last_sync(key).await {
            Some(at) => Utc::now() - at > max_age,
            None => true,
        }
    }

    async fn key_lock(&self, key: CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.in_flight.lock().await;
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn record_sync(&self, key: CacheKey) {
        let _guard = self.registry_lock.lock().await;
        let mut registry: SyncRegistry = self
            .cache
            .get(CacheKey::LastSync)
            .await
            .unwrap_or_default();
        registry.insert(key.as_str().to_string(), Utc::now());
        // Registry write failure only delays the next background refresh
        if let Err(e) = self.cache.set(CacheKey::LastSync, &registry).await {
            warn!(key = %key, error = %e, "Failed to update sync registry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{KeyValueStore, MemoryStore};
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn coordinator() -> (Arc<MemoryStore>, CacheStore, SyncCoordinator) {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheStore::new(store.clone());
        (store, cache.clone(), SyncCoordinator::new(cache))
    }

    fn counting_fetch(
        count: Arc<AtomicUsize>,
        result: anyhow::Result<String>,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<String>> {
        move || {
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                result
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_hit_skips_fetch() {
        let (_, cache, sync) = coordinator();
        cache.set(CacheKey::Tournaments, &"cached").await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let result: SyncResult<String> = sync
            .get_or_fetch(
                CacheKey::Tournaments,
                counting_fetch(calls.clone(), Ok("fresh".to_string())),
                false,
            )
            .await
            .unwrap();

        assert_eq!(result.data, "cached");
        assert!(result.from_cache());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cold_key_fetches_and_populates() {
        let (_, cache, sync) = coordinator();

        let calls = Arc::new(AtomicUsize::new(0));
        let result: SyncResult<String> = sync
            .get_or_fetch(
                CacheKey::UserProfile,
                counting_fetch(calls.clone(), Ok("fetched".to_string())),
                false,
            )
            .await
            .unwrap();

        assert_eq!(result.data, "fetched");
        assert!(!result.from_cache());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Written through: a direct cache read now hits
        let cached: String = cache.get(CacheKey::UserProfile).await.unwrap();
        assert_eq!(cached, "fetched");

        // Successful fetch recorded in the registry
        assert!(sync.last_sync(CacheKey::UserProfile).await.is_some());
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_fresh_cache() {
        let (_, cache, sync) = coordinator();
        cache.set(CacheKey::Tournaments, &"old").await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let result: SyncResult<String> = sync
            .get_or_fetch(
                CacheKey::Tournaments,
                counting_fetch(calls.clone(), Ok("new".to_string())),
                true,
            )
            .await
            .unwrap();

        assert_eq!(result.data, "new");
        assert!(!result.from_cache());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let cached: String = cache.get(CacheKey::Tournaments).await.unwrap();
        assert_eq!(cached, "new");
    }

    #[tokio::test]
    async fn test_failed_fetch_surfaces_error_and_skips_registry() {
        let (_, _, sync) = coordinator();

        let calls = Arc::new(AtomicUsize::new(0));
        let result: Result<SyncResult<String>, _> = sync
            .get_or_fetch(
                CacheKey::Messages,
                counting_fetch(calls.clone(), Err(anyhow!("connection refused"))),
                false,
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        // Failed fetches never touch the registry
        assert!(sync.last_sync(CacheKey::Messages).await.is_none());
        assert!(sync.needs_refresh(CacheKey::Messages, Duration::hours(1)).await);
    }

    #[tokio::test]
    async fn test_failed_refresh_after_expiry_leaves_key_absent() {
        let (store, cache, sync) = coordinator();

        // Pre-populate with an immediately expired entry
        cache
            .set_with_expiry(CacheKey::Tournaments, &"stale", Duration::zero())
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let result: Result<SyncResult<String>, _> = sync
            .get_or_fetch(
                CacheKey::Tournaments,
                counting_fetch(calls.clone(), Err(anyhow!("offline"))),
                false,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Eager eviction already removed the expired entry; the failed
        // fetch does not resurrect it
        assert_eq!(store.get("tournaments").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_forced_refresh_preserves_fresh_value() {
        let (_, cache, sync) = coordinator();
        cache.set(CacheKey::Tournaments, &"good").await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let result: Result<SyncResult<String>, _> = sync
            .get_or_fetch(
                CacheKey::Tournaments,
                counting_fetch(calls.clone(), Err(anyhow!("timeout"))),
                true,
            )
            .await;

        assert!(result.is_err());
        // A failed refresh never evicts a previously good value
        let cached: String = cache.get(CacheKey::Tournaments).await.unwrap();
        assert_eq!(cached, "good");
    }

    #[tokio::test]
    async fn test_concurrent_cold_fetches_are_coalesced() {
        let (_, _, sync) = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            sync.get_or_fetch::<String, _, _>(
                CacheKey::UpcomingTournaments,
                counting_fetch(calls.clone(), Ok("winner".to_string())),
                false,
            ),
            sync.get_or_fetch::<String, _, _>(
                CacheKey::UpcomingTournaments,
                counting_fetch(calls.clone(), Ok("loser".to_string())),
                false,
            ),
        );

        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(a.data, "winner");
        assert_eq!(b.data, "winner");
        // Exactly one fetch ran; the other call served the winner's write
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_ne!(a.from_cache(), b.from_cache());
    }

    #[tokio::test]
    async fn test_needs_refresh_uses_registry_age() {
        let (_, cache, sync) = coordinator();

        let mut registry = SyncRegistry::new();
        registry.insert(
            CacheKey::Tournaments.as_str().to_string(),
            Utc::now() - Duration::hours(2),
        );
        cache.set(CacheKey::LastSync, &registry).await.unwrap();

        assert!(sync.needs_refresh(CacheKey::Tournaments, Duration::hours(1)).await);
        assert!(!sync.needs_refresh(CacheKey::Tournaments, Duration::hours(3)).await);
        // Unknown resource is infinitely stale
        assert!(sync.needs_refresh(CacheKey::Messages, Duration::days(365)).await);
    }

    #[tokio::test]
    async fn test_refresh_all_tolerates_partial_failure() {
        let (_, cache, sync) = coordinator();

        let tasks = vec![
            RefreshTask::new(CacheKey::Tournaments, || async {
                Ok(serde_json::json!(["t1", "t2"]))
            }),
            RefreshTask::new(CacheKey::Messages, || async {
                Err(anyhow!("server error"))
            }),
            RefreshTask::new(CacheKey::UserProfile, || async {
                Ok(serde_json::json!({"id": 1}))
            }),
        ];

        let results = sync.refresh_all(tasks).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results["tournaments"], true);
        assert_eq!(results["messages"], false);
        assert_eq!(results["user_profile"], true);

        // Successful fetches were written through; the failure was not
        let t: Option<Value> = cache.get(CacheKey::Tournaments).await;
        assert!(t.is_some());
        let m: Option<Value> = cache.get(CacheKey::Messages).await;
        assert!(m.is_none());
    }

    #[tokio::test]
    async fn test_refresh_all_updates_registry_for_successes_only() {
        let (_, _, sync) = coordinator();

        let tasks = vec![
            RefreshTask::new(CacheKey::Tournaments, || async {
                Ok(serde_json::json!([]))
            }),
            RefreshTask::new(CacheKey::Messages, || async {
                Err(anyhow!("nope"))
            }),
        ];
        sync.refresh_all(tasks).await;

        assert!(sync.last_sync(CacheKey::Tournaments).await.is_some());
        assert!(sync.last_sync(CacheKey::Messages).await.is_none());
    }
}
