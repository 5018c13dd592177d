//! Time-boxed memoization with single-flight computation and stale fallback

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{CacheCategory, CacheKey, CacheValue, Cacheable};
use crate::shared::config::CacheCfg;
use crate::shared::errors::RiskError;
use crate::shared::types::{Address, AssetPairKey, PoolId};

type SharedCompute = Shared<BoxFuture<'static, Result<CacheValue, RiskError>>>;

/// What a failed computation resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnFailure {
    /// Return the previous entry when there is one
    ServeStale,
    /// Always return the error
    Propagate,
}

/// TTL per cache category
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    pub price: Duration,
    pub position: Duration,
    pub pool_risk: Duration,
    pub analytics: Duration,
    pub pool_metadata: Duration,
}

impl TtlPolicy {
    pub fn from_config(cfg: &CacheCfg) -> Self {
        Self {
            price: Duration::from_secs(cfg.price_ttl_secs),
            position: Duration::from_secs(cfg.position_ttl_secs),
            pool_risk: Duration::from_secs(cfg.pool_risk_ttl_secs),
            analytics: Duration::from_secs(cfg.analytics_ttl_secs),
            pool_metadata: Duration::from_secs(cfg.pool_metadata_ttl_secs),
        }
    }

    pub fn ttl(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::Price => self.price,
            CacheCategory::Position => self.position,
            CacheCategory::PoolRisk => self.pool_risk,
            CacheCategory::Analytics => self.analytics,
            CacheCategory::PoolMetadata => self.pool_metadata,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::from_config(&CacheCfg::default())
    }
}

/// Cache introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub count: usize,
    pub per_category: BTreeMap<CacheCategory, usize>,
}

struct CacheEntry {
    value: CacheValue,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Shared cache handle. Clones point at the same entries.
#[derive(Clone)]
pub struct RiskCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    inflight: Arc<Mutex<HashMap<(CacheKey, OnFailure), SharedCompute>>>,
    ttls: TtlPolicy,
}

impl Default for RiskCache {
    fn default() -> Self {
        Self::new(TtlPolicy::default())
    }
}

impl RiskCache {
    pub fn new(ttls: TtlPolicy) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            ttls,
        }
    }

    /// [`Self::get_or_compute_with_ttl`] with the key category's default TTL
    pub async fn get_or_compute<T, F, Fut>(&self, key: CacheKey, compute: F) -> Result<T, RiskError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RiskError>> + Send + 'static,
    {
        let ttl = self.ttls.ttl(key.category());
        self.get_or_compute_with_ttl(key, ttl, compute).await
    }

    /// Returns the entry for `key` while it is younger than `ttl`, otherwise
    /// runs `compute` and stores its result.
    ///
    /// Concurrent misses on one key share a single computation. It runs on
    /// its own task, so the entry is populated even when every caller has
    /// stopped waiting. When `compute` fails, a stale entry is returned if
    /// one exists; only a key that was never computed surfaces the error.
    pub async fn get_or_compute_with_ttl<T, F, Fut>(&self, key: CacheKey, ttl: Duration, compute: F) -> Result<T, RiskError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RiskError>> + Send + 'static,
    {
        self.get_or_compute_with(key, ttl, OnFailure::ServeStale, compute).await
    }

    /// [`Self::get_or_compute`] with an explicit failure policy. Under
    /// [`OnFailure::Propagate`] a caller gets a fresh entry or a successful
    /// computation, never a stale entry.
    pub async fn get_or_compute_on<T, F, Fut>(&self, key: CacheKey, on_failure: OnFailure, compute: F) -> Result<T, RiskError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RiskError>> + Send + 'static,
    {
        let ttl = self.ttls.ttl(key.category());
        self.get_or_compute_with(key, ttl, on_failure, compute).await
    }

    /// A NotFound failure evicts the entry and propagates under either
    /// policy. Callers with different policies never share a computation.
    async fn get_or_compute_with<T, F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        on_failure: OnFailure,
        compute: F,
    ) -> Result<T, RiskError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RiskError>> + Send + 'static,
    {
        if let Some(value) = self.get_fresh::<T>(&key, ttl).await {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        let pending = {
            let mut inflight = self.inflight.lock().await;

            // Another caller may have filled the entry while we waited
            if let Some(value) = self.get_fresh::<T>(&key, ttl).await {
                return Ok(value);
            }

            let slot = (key.clone(), on_failure);
            match inflight.get(&slot) {
                Some(existing) => {
                    debug!(key = %key, "Joining in-flight computation");
                    existing.clone()
                }
                None => {
                    debug!(key = %key, "Cache miss, computing");
                    let pending = self.spawn_compute(key.clone(), on_failure, compute());
                    inflight.insert(slot, pending.clone());
                    pending
                }
            }
        };

        let value = pending.await?;
        T::from_value(&value).ok_or_else(|| RiskError::ComputeFault(format!("unexpected cached value type for {}", key)))
    }

    fn spawn_compute<T, Fut>(&self, key: CacheKey, on_failure: OnFailure, compute: Fut) -> SharedCompute
    where
        T: Cacheable,
        Fut: Future<Output = Result<T, RiskError>> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        let inflight = Arc::clone(&self.inflight);

        let handle = tokio::spawn(async move {
            let outcome = match compute.await {
                Ok(value) => {
                    let value = value.into_value();
                    entries.write().await.insert(
                        key.clone(),
                        CacheEntry {
                            value: value.clone(),
                            stored_at: Instant::now(),
                        },
                    );
                    Ok(value)
                }
                Err(err) if err.is_not_found() => {
                    if entries.write().await.remove(&key).is_some() {
                        debug!(key = %key, "Entry evicted, upstream reports it gone");
                    }
                    Err(err)
                }
                Err(err) if on_failure == OnFailure::Propagate => Err(err),
                Err(err) => match entries.read().await.get(&key) {
                    Some(stale) => {
                        warn!(key = %key, error = %err, "Compute failed, serving stale entry");
                        Ok(stale.value.clone())
                    }
                    None => Err(err),
                },
            };
            inflight.lock().await.remove(&(key, on_failure));
            outcome
        });

        handle
            .map(|joined| {
                joined.unwrap_or_else(|e| Err(RiskError::ComputeFault(format!("cache computation aborted: {}", e))))
            })
            .boxed()
            .shared()
    }

    /// Recomputes `key` regardless of freshness
    pub async fn refresh<T, F, Fut>(&self, key: CacheKey, compute: F) -> Result<T, RiskError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RiskError>> + Send + 'static,
    {
        self.get_or_compute_with_ttl(key, Duration::ZERO, compute).await
    }

    /// Fresh value under the category TTL
    pub async fn get<T: Cacheable>(&self, key: &CacheKey) -> Option<T> {
        self.get_fresh(key, self.ttls.ttl(key.category())).await
    }

    async fn get_fresh<T: Cacheable>(&self, key: &CacheKey, ttl: Duration) -> Option<T> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(ttl))
            .and_then(|entry| T::from_value(&entry.value))
    }

    pub async fn insert<T: Cacheable>(&self, key: CacheKey, value: T) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value: value.into_value(),
                stored_at: Instant::now(),
            },
        );
    }

    /// Every stored value of type `T` whose key matches, stale ones included
    pub async fn collect<T, P>(&self, predicate: P) -> Vec<T>
    where
        T: Cacheable,
        P: Fn(&CacheKey) -> bool,
    {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(key, _)| predicate(key))
            .filter_map(|(_, entry)| T::from_value(&entry.value))
            .collect()
    }

    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Removes every entry whose key matches, returning how many went
    pub async fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&CacheKey) -> bool,
    {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    pub async fn invalidate_pool(&self, pool_id: PoolId) -> usize {
        self.invalidate_where(|key| key.relates_to_pool(pool_id)).await
    }

    pub async fn invalidate_pair(&self, pair: &AssetPairKey) -> usize {
        self.invalidate_where(|key| key.relates_to_pair(pair)).await
    }

    pub async fn invalidate_user(&self, user: &Address) -> usize {
        self.invalidate_where(|key| key.relates_to_user(user)).await
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let mut per_category: BTreeMap<CacheCategory, usize> =
            CacheCategory::ALL.iter().map(|category| (*category, 0)).collect();
        for key in entries.keys() {
            *per_category.entry(key.category()).or_insert(0) += 1;
        }
        CacheStats {
            count: entries.len(),
            per_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{BasisPoints, Wad};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pair() -> AssetPairKey {
        AssetPairKey::new(Address::repeat_byte(1), Address::repeat_byte(2))
    }

    fn counted(calls: &Arc<AtomicUsize>, value: u32) -> impl Future<Output = Result<BasisPoints, RiskError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(BasisPoints::new(value))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_computes_once_within_ttl_and_again_after() {
        let cache = RiskCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::Volatility(pair());
        let ttl = Duration::from_secs(60);

        let first: BasisPoints = cache.get_or_compute_with_ttl(key.clone(), ttl, || counted(&calls, 100)).await.unwrap();
        let second: BasisPoints = cache.get_or_compute_with_ttl(key.clone(), ttl, || counted(&calls, 200)).await.unwrap();
        assert_eq!(first.value(), 100);
        assert_eq!(second.value(), 100);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(ttl).await;
        let third: BasisPoints = cache.get_or_compute_with_ttl(key, ttl, || counted(&calls, 300)).await.unwrap();
        assert_eq!(third.value(), 300);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_serves_stale_value() {
        let cache = RiskCache::default();
        let key = CacheKey::Price(pair());
        let ttl = Duration::from_secs(30);

        let _: Wad = cache
            .get_or_compute_with_ttl(key.clone(), ttl, || async { Ok::<_, RiskError>(Wad::from_units(2_000)) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        let stale: Wad = cache
            .get_or_compute_with_ttl(key, ttl, || async {
                Err::<Wad, _>(RiskError::UpstreamUnavailable("rpc down".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(stale, Wad::from_units(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_propagate_policy_skips_stale_value() {
        let cache = RiskCache::default();
        let key = CacheKey::Strategies;
        let _: Wad = cache
            .get_or_compute(key.clone(), || async { Ok::<_, RiskError>(Wad::from_units(5)) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        let result: Result<Wad, _> = cache
            .get_or_compute_on(key.clone(), OnFailure::Propagate, || async {
                Err::<Wad, _>(RiskError::UpstreamUnavailable("rpc down".to_string()))
            })
            .await;
        assert!(matches!(result, Err(RiskError::UpstreamUnavailable(_))));

        // the old entry survives for lenient readers
        let stale: Wad = cache
            .get_or_compute(key, || async { Err::<Wad, _>(RiskError::UpstreamUnavailable("rpc down".to_string())) })
            .await
            .unwrap();
        assert_eq!(stale, Wad::from_units(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_evicts_stale_value() {
        let cache = RiskCache::default();
        let key = CacheKey::PoolInfo(PoolId(3));
        let _: Wad = cache
            .get_or_compute(key.clone(), || async { Ok::<_, RiskError>(Wad::from_units(5)) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        let result: Result<Wad, _> = cache
            .get_or_compute(key.clone(), || async { Err::<Wad, _>(RiskError::NotFound("pool 3".to_string())) })
            .await;
        assert_eq!(result, Err(RiskError::NotFound("pool 3".to_string())));
        assert_eq!(cache.get::<Wad>(&key).await, None);
        assert_eq!(cache.stats().await.count, 0);
    }

    #[tokio::test]
    async fn test_failure_without_prior_entry_propagates() {
        let cache = RiskCache::default();
        let result: Result<Wad, _> = cache
            .get_or_compute(CacheKey::PoolInfo(PoolId(9)), || async {
                Err::<Wad, _>(RiskError::NotFound("pool 9".to_string()))
            })
            .await;
        assert_eq!(result, Err(RiskError::NotFound("pool 9".to_string())));
        assert_eq!(cache.stats().await.count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_computation() {
        let cache = RiskCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::Volatility(pair());

        let slow = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, RiskError>(BasisPoints::new(42))
        };

        let (a, b) = tokio::join!(
            cache.get_or_compute::<BasisPoints, _, _>(key.clone(), || slow(Arc::clone(&calls))),
            cache.get_or_compute::<BasisPoints, _, _>(key.clone(), || slow(Arc::clone(&calls))),
        );
        assert_eq!(a.unwrap().value(), 42);
        assert_eq!(b.unwrap().value(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abandoned_caller_still_populates() {
        let cache = RiskCache::default();
        let key = CacheKey::Volatility(pair());

        let attempt = tokio::time::timeout(
            Duration::from_millis(5),
            cache.get_or_compute::<BasisPoints, _, _>(key.clone(), || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, RiskError>(BasisPoints::new(77))
            }),
        )
        .await;
        assert!(attempt.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.get::<BasisPoints>(&key).await, Some(BasisPoints::new(77)));
    }

    #[tokio::test]
    async fn test_invalidation_and_stats() {
        let cache = RiskCache::default();
        let user = Address::repeat_byte(9);
        cache.insert(CacheKey::Price(pair()), Wad::from_units(1)).await;
        cache.insert(CacheKey::PoolInfo(PoolId(1)), Wad::from_units(1)).await;
        cache.insert(CacheKey::PoolRisk(PoolId(1)), BasisPoints::new(1)).await;
        cache.insert(CacheKey::AccountHealth { user, asset: Address::repeat_byte(1) }, Wad::from_units(1)).await;
        cache.insert(CacheKey::AccountHealth { user, asset: Address::repeat_byte(2) }, Wad::from_units(1)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.count, 5);
        assert_eq!(stats.per_category[&CacheCategory::Position], 2);
        assert_eq!(stats.per_category[&CacheCategory::Analytics], 0);

        assert_eq!(cache.invalidate_user(&user).await, 2);
        assert_eq!(cache.invalidate_pool(PoolId(1)).await, 2);
        assert!(cache.invalidate(&CacheKey::Price(pair())).await);
        assert!(!cache.invalidate(&CacheKey::Price(pair())).await);

        let other = AssetPairKey::new(Address::repeat_byte(3), Address::repeat_byte(2));
        cache.insert(CacheKey::Volatility(pair()), BasisPoints::new(1)).await;
        cache.insert(CacheKey::Volatility(other), BasisPoints::new(1)).await;
        cache.insert(CacheKey::correlation(other, pair()), BasisPoints::new(1)).await;
        assert_eq!(cache.invalidate_pair(&pair()).await, 2);
        assert_eq!(cache.get::<BasisPoints>(&CacheKey::Volatility(other)).await, Some(BasisPoints::new(1)));

        cache.insert(CacheKey::Strategies, Wad::from_units(1)).await;
        cache.clear().await;
        assert_eq!(cache.stats().await.count, 0);
    }
}
