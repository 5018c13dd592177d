//! Risk Query interface: cached pool risk, history, recommendations and
//! market conditions on top of a [`ChainReader`]

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::history::RiskHistoryStore;
use super::notifier::{RiskEvent, RiskNotifier, Subscription};
use crate::domain::pool::{AccountHealth, PoolAnalyzer, PoolInfo};
use crate::domain::price::{PriceObservation, PriceSampler, PRICE_HISTORY_CAPACITY};
use crate::domain::recommendation::{Recommendation, RecommendationEngine, Strategy};
use crate::domain::risk::{
    CompositeRiskScorer, CorrelationEstimator, Estimate, ImpermanentLossEstimator, MarketConditions, RiskComponents,
    RiskSnapshot, TimedComponents, VolatilityEstimator,
};
use crate::infrastructure::cache::{AnalyticsKey, CacheKey, CacheStats, OnFailure, RiskCache, TtlPolicy};
use crate::infrastructure::chain::ChainReader;
use crate::shared::config::EngineConfig;
use crate::shared::errors::RiskError;
use crate::shared::types::{Address, AssetPairKey, BasisPoints, PoolId, Timeframe, Wad};
use crate::shared::utils::now_millis;

/// Cheap to clone; clones share the cache, price windows and history
#[derive(Clone)]
pub struct RiskEngine {
    reader: Arc<dyn ChainReader>,
    cache: RiskCache,
    sampler: PriceSampler,
    history: RiskHistoryStore,
    notifier: RiskNotifier,
    scorer: Arc<CompositeRiskScorer>,
    recommender: Arc<RecommendationEngine>,
    config: Arc<EngineConfig>,
}

impl RiskEngine {
    pub fn new(reader: Arc<dyn ChainReader>, cache: RiskCache, config: EngineConfig) -> Self {
        Self {
            reader,
            cache,
            sampler: PriceSampler::new(),
            history: RiskHistoryStore::new(config.risk.history_capacity),
            notifier: RiskNotifier::default(),
            scorer: Arc::new(CompositeRiskScorer::new(config.risk.weights)),
            recommender: Arc::new(RecommendationEngine::new(config.risk.hedge_cost())),
            config: Arc::new(config),
        }
    }

    /// Engine with a cache built from the configured TTLs
    pub fn from_config(reader: Arc<dyn ChainReader>, config: EngineConfig) -> Self {
        let cache = RiskCache::new(TtlPolicy::from_config(&config.cache));
        Self::new(reader, cache, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sampler(&self) -> &PriceSampler {
        &self.sampler
    }

    // ---- Risk Query interface ----

    /// Snapshot of the pool, recomputed once the pool risk TTL has passed
    pub async fn get_pool_risk(&self, pool_id: PoolId) -> Result<RiskSnapshot, RiskError> {
        let engine = self.clone();
        self.cache
            .get_or_compute(CacheKey::PoolRisk(pool_id), move || async move { engine.compute_pool_risk(pool_id).await })
            .await
    }

    /// [`Self::get_pool_risk`] bounded by `deadline`. Giving up does not
    /// cancel the computation; a later call finds its result in the cache.
    pub async fn get_pool_risk_within(&self, pool_id: PoolId, deadline: Duration) -> Result<RiskSnapshot, RiskError> {
        tokio::time::timeout(deadline, self.get_pool_risk(pool_id))
            .await
            .map_err(|_| RiskError::UpstreamUnavailable("deadline exceeded".to_string()))?
    }

    pub async fn get_pool_risk_history(&self, pool_id: PoolId, timeframe: Timeframe) -> Result<Vec<TimedComponents>, RiskError> {
        // Makes sure the pool exists and has at least one record
        self.get_pool_risk(pool_id).await?;

        let history = self.history.clone();
        self.cache
            .get_or_compute(CacheKey::Analytics(AnalyticsKey::RiskHistory(pool_id, timeframe)), move || async move {
                Ok::<_, RiskError>(history.series(pool_id, timeframe, Utc::now()).await)
            })
            .await
    }

    pub async fn get_recommendations(&self, pool_id: PoolId) -> Result<Vec<Recommendation>, RiskError> {
        Ok(self.get_pool_risk(pool_id).await?.recommendations)
    }

    /// Aggregated over the volatility and correlation statistics currently
    /// held in the cache
    pub async fn get_market_conditions(&self) -> Result<MarketConditions, RiskError> {
        let cache = self.cache.clone();
        self.cache
            .get_or_compute(CacheKey::Analytics(AnalyticsKey::MarketConditions), move || async move {
                let volatilities: Vec<BasisPoints> = cache.collect(|key| matches!(key, CacheKey::Volatility(_))).await;
                let correlations: Vec<BasisPoints> = cache.collect(|key| matches!(key, CacheKey::Correlation(..))).await;
                let conditions = MarketConditions::aggregate(&volatilities, &correlations);
                debug!(
                    volatility_index = %conditions.volatility_index,
                    correlation_index = %conditions.correlation_index,
                    sentiment = conditions.sentiment.as_str(),
                    "Market conditions aggregated"
                );
                Ok::<_, RiskError>(conditions)
            })
            .await
    }

    pub async fn get_account_health(&self, user: Address, asset: Address) -> Result<AccountHealth, RiskError> {
        let reader = Arc::clone(&self.reader);
        self.cache
            .get_or_compute(CacheKey::AccountHealth { user, asset }, move || async move {
                Ok::<_, RiskError>(reader.account_health(user, asset).await?)
            })
            .await
    }

    pub async fn invalidate_pool(&self, pool_id: PoolId) -> usize {
        let removed = self.cache.invalidate_pool(pool_id).await;
        debug!(pool = %pool_id, removed, "Pool cache invalidated");
        removed
    }

    pub async fn invalidate_user(&self, user: Address) -> usize {
        let removed = self.cache.invalidate_user(&user).await;
        debug!(user = %user, removed, "User cache invalidated");
        removed
    }

    /// Drops the price, volatility and correlation entries of `pair`
    pub async fn invalidate_pair(&self, pair: AssetPairKey) -> usize {
        let removed = self.cache.invalidate_pair(&pair).await;
        debug!(pair = %pair, removed, "Pair cache invalidated");
        removed
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("🧹 Risk cache cleared");
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    // ---- Refresh entry points used by the scheduler ----

    /// Recomputes the pool snapshot regardless of its age
    pub async fn refresh_pool_risk(&self, pool_id: PoolId) -> Result<RiskSnapshot, RiskError> {
        let engine = self.clone();
        self.cache
            .refresh(CacheKey::PoolRisk(pool_id), move || async move { engine.compute_pool_risk(pool_id).await })
            .await
    }

    /// Samples a fresh price and recomputes the pair volatility
    pub async fn refresh_volatility(&self, pair: AssetPairKey) -> Result<BasisPoints, RiskError> {
        if let Err(e) = self.sample_price(pair).await {
            warn!(pair = %pair, error = %e, "Price sample failed, estimating from existing window");
        }
        let engine = self.clone();
        self.cache
            .refresh(CacheKey::Volatility(pair), move || async move {
                Ok::<_, RiskError>(engine.compute_volatility(pair).await.value)
            })
            .await
    }

    /// Ids of every registered pool
    pub async fn pool_ids(&self) -> Result<Vec<PoolId>, RiskError> {
        let count = self.reader.pool_count().await?;
        Ok((0..count).map(PoolId).collect())
    }

    /// Pairs swept by the volatility refresh
    pub fn common_pairs(&self) -> Vec<AssetPairKey> {
        self.config
            .common_pairs
            .iter()
            .map(|p| AssetPairKey::new(p.base, p.quote))
            .collect()
    }

    // ---- Estimators ----

    /// Oracle value when available, otherwise annualized volatility of the
    /// sampled window. Never fails.
    pub async fn estimate_volatility(&self, pair: AssetPairKey) -> BasisPoints {
        let engine = self.clone();
        self.cache
            .get_or_compute(CacheKey::Volatility(pair), move || async move {
                Ok::<_, RiskError>(engine.compute_volatility(pair).await.value)
            })
            .await
            .unwrap_or_else(|e| {
                warn!(pair = %pair, error = %e, "Volatility unavailable, using zero");
                BasisPoints::ZERO
            })
    }

    /// Oracle value when available, otherwise Pearson correlation of the two
    /// sampled windows. Never fails.
    pub async fn estimate_correlation(&self, a: AssetPairKey, b: AssetPairKey) -> BasisPoints {
        let engine = self.clone();
        self.cache
            .get_or_compute(CacheKey::correlation(a, b), move || async move {
                Ok::<_, RiskError>(engine.compute_correlation(a, b).await.value)
            })
            .await
            .unwrap_or_else(|e| {
                warn!(a = %a, b = %b, error = %e, "Correlation unavailable, using neutral");
                BasisPoints::NEUTRAL
            })
    }

    /// Pool calculator when available, otherwise the closed form
    pub async fn estimate_impermanent_loss(&self, pool_id: PoolId, price_change_percent: f64) -> Estimate<BasisPoints> {
        let primary = self.reader.impermanent_loss_calculator(pool_id, price_change_percent).await;
        Estimate::primary_or_else("impermanent loss", primary, || ImpermanentLossEstimator::estimate(price_change_percent))
    }

    /// Current price of `pair`, recorded into its window. Cached for the
    /// price TTL so bursts of requests add one observation.
    pub async fn sample_price(&self, pair: AssetPairKey) -> Result<Wad, RiskError> {
        let engine = self.clone();
        self.cache
            .get_or_compute(CacheKey::Price(pair), move || async move { engine.fetch_price(pair).await })
            .await
    }

    /// Deposits summed over every active pool. Pools that cannot be read are
    /// left out.
    pub async fn protocol_deposits(&self) -> Result<Wad, RiskError> {
        self.read_protocol_deposits(OnFailure::ServeStale).await
    }

    pub async fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo, RiskError> {
        self.read_pool_info(pool_id, OnFailure::ServeStale).await
    }

    pub async fn strategies(&self) -> Result<Vec<Strategy>, RiskError> {
        self.read_strategies(OnFailure::ServeStale).await
    }

    async fn read_protocol_deposits(&self, on_failure: OnFailure) -> Result<Wad, RiskError> {
        let engine = self.clone();
        self.cache
            .get_or_compute_on(CacheKey::Analytics(AnalyticsKey::ProtocolDeposits), on_failure, move || async move {
                engine.compute_protocol_deposits(on_failure).await
            })
            .await
    }

    async fn read_pool_info(&self, pool_id: PoolId, on_failure: OnFailure) -> Result<PoolInfo, RiskError> {
        let reader = Arc::clone(&self.reader);
        self.cache
            .get_or_compute_on(CacheKey::PoolInfo(pool_id), on_failure, move || async move {
                Ok::<_, RiskError>(reader.pool_info(pool_id).await?)
            })
            .await
    }

    async fn read_strategies(&self, on_failure: OnFailure) -> Result<Vec<Strategy>, RiskError> {
        let reader = Arc::clone(&self.reader);
        self.cache
            .get_or_compute_on(CacheKey::Strategies, on_failure, move || async move {
                Ok::<_, RiskError>(reader.strategies().await?)
            })
            .await
    }

    // ---- Computations run by the cache ----

    /// Inputs are read without stale fallback. When the chain cannot be
    /// read the failure reaches the `PoolRisk` key, which keeps serving the
    /// previous snapshot untouched: no new timestamp, event or history
    /// record. A pool removed on chain surfaces NotFound.
    async fn compute_pool_risk(&self, pool_id: PoolId) -> Result<RiskSnapshot, RiskError> {
        let pool = self.read_pool_info(pool_id, OnFailure::Propagate).await?;
        let protocol_deposits = self.read_protocol_deposits(OnFailure::Propagate).await?;
        let strategies = self.read_strategies(OnFailure::Propagate).await?;
        let components = self.pool_components(&pool).await;

        let snapshot = self.scorer.score_pool(
            &pool,
            components,
            protocol_deposits,
            &strategies,
            &self.recommender,
            Utc::now(),
        );

        self.history
            .record(
                pool_id,
                TimedComponents {
                    timestamp: snapshot.timestamp,
                    components: snapshot.components,
                },
            )
            .await;
        self.notifier.publish(RiskEvent::SnapshotUpdated {
            pool_id,
            composite_score: snapshot.composite_score,
            level: snapshot.level,
        });

        info!(
            pool = %pool_id,
            score = %snapshot.composite_score,
            level = snapshot.level.as_str(),
            utilization = snapshot.utilization,
            hedge_ratio = snapshot.hedge_ratio,
            "📊 Pool risk computed"
        );
        Ok(snapshot)
    }

    /// Volatility and impermanent loss come from the pool's own pair.
    /// Correlation compares each token against the quote asset, so it stays
    /// neutral when either token is the quote asset itself.
    async fn pool_components(&self, pool: &PoolInfo) -> RiskComponents {
        let pool_pair = AssetPairKey::new(pool.token0, pool.token1);
        let quote = self.config.risk.quote_asset;
        let quoted_pairs = (pool.token0 != quote && pool.token1 != quote)
            .then(|| (AssetPairKey::new(pool.token0, quote), AssetPairKey::new(pool.token1, quote)));

        let mut pairs = vec![pool_pair];
        if let Some((a, b)) = quoted_pairs {
            pairs.extend([a, b]);
        }
        let samples = join_all(pairs.iter().map(|pair| self.sample_price(*pair))).await;
        for (pair, outcome) in pairs.iter().zip(samples) {
            if let Err(e) = outcome {
                warn!(pool = %pool.id, pair = %pair, error = %e, "Price sample failed");
            }
        }

        let volatility = self.estimate_volatility(pool_pair).await;
        let price_change = self.sampler.change_percent(&pool_pair).await;
        let impermanent_loss = self.estimate_impermanent_loss(pool.id, price_change).await.value;
        let correlation_risk = match quoted_pairs {
            Some((a, b)) => self.estimate_correlation(a, b).await,
            None => BasisPoints::NEUTRAL,
        };

        RiskComponents {
            volatility,
            impermanent_loss,
            correlation_risk,
            liquidity_risk: CompositeRiskScorer::liquidity_risk(PoolAnalyzer::utilization(pool)),
        }
    }

    async fn compute_volatility(&self, pair: AssetPairKey) -> Estimate<BasisPoints> {
        let primary = self.reader.volatility_oracle(&pair).await;
        let returns = match primary {
            Ok(_) => Vec::new(),
            Err(_) => self.sampler.compute_returns(&pair).await,
        };
        let estimate = Estimate::primary_or_else("volatility", primary, || VolatilityEstimator::estimate_local(&returns));
        debug!(pair = %pair, value = %estimate.value, source = ?estimate.source, "Volatility estimated");
        estimate
    }

    async fn compute_correlation(&self, a: AssetPairKey, b: AssetPairKey) -> Estimate<BasisPoints> {
        let primary = self.reader.correlation_oracle(&a, &b).await;
        let local = match primary {
            Ok(_) => None,
            Err(_) => Some((
                self.sampler.compute_returns(&a).await,
                self.sampler.observation_count(&a).await,
                self.sampler.compute_returns(&b).await,
                self.sampler.observation_count(&b).await,
            )),
        };
        let estimate = Estimate::primary_or_else("correlation", primary, || match &local {
            Some((returns_a, obs_a, returns_b, obs_b)) => {
                CorrelationEstimator::estimate_local(returns_a, *obs_a, returns_b, *obs_b)
            }
            None => BasisPoints::NEUTRAL,
        });
        debug!(a = %a, b = %b, value = %estimate.value, source = ?estimate.source, "Correlation estimated");
        estimate
    }

    async fn fetch_price(&self, pair: AssetPairKey) -> Result<Wad, RiskError> {
        if self.sampler.observation_count(&pair).await == 0 {
            match self.reader.historical_prices(&pair, PRICE_HISTORY_CAPACITY).await {
                Ok(observations) if !observations.is_empty() => {
                    let seeded = self.sampler.seed(pair, observations).await;
                    debug!(pair = %pair, seeded, "Price window warmed from history");
                }
                Ok(_) => {}
                Err(e) => debug!(pair = %pair, error = %e, "No price history available"),
            }
        }

        let price = self.reader.current_price(&pair).await?;
        self.sampler
            .record_price(pair, PriceObservation::new(now_millis(), price))
            .await;
        Ok(price)
    }

    async fn compute_protocol_deposits(&self, on_failure: OnFailure) -> Result<Wad, RiskError> {
        let ids = self.pool_ids().await?;
        let reads = join_all(ids.iter().map(|id| self.read_pool_info(*id, on_failure))).await;

        let pools: Vec<PoolInfo> = ids
            .iter()
            .zip(reads)
            .filter_map(|(id, read)| match read {
                Ok(pool) => Some(pool),
                Err(e) if e.is_not_found() => None,
                Err(e) => {
                    warn!(pool = %id, error = %e, "Pool left out of protocol deposits");
                    None
                }
            })
            .collect();

        Ok(PoolAnalyzer::protocol_deposits(&pools))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::chain::InMemoryChainReader;

    fn pool(id: u64, total: u64, available: u64, hedged: u64, score: Option<u32>) -> PoolInfo {
        PoolInfo {
            id: PoolId(id),
            token0: Address::repeat_byte(0xc0),
            token1: Address::repeat_byte(0x11),
            total_deposits: Wad::from_units(total),
            available_liquidity: Wad::from_units(available),
            hedged_amount: Wad::from_units(hedged),
            risk_score: score.map(BasisPoints::new),
            active: true,
        }
    }

    async fn engine_with(pools: Vec<PoolInfo>) -> (RiskEngine, Arc<InMemoryChainReader>) {
        let reader = Arc::new(InMemoryChainReader::new());
        for p in pools {
            reader.set_pool(p).await;
        }
        let engine = RiskEngine::from_config(reader.clone(), EngineConfig::default());
        (engine, reader)
    }

    #[tokio::test]
    async fn test_snapshot_ratios_and_concentration() {
        let (engine, _) = engine_with(vec![pool(0, 100, 20, 10, Some(4_000)), pool(1, 900, 900, 0, None)]).await;

        let snapshot = engine.get_pool_risk(PoolId(0)).await.unwrap();
        assert_eq!(snapshot.utilization, 80.0);
        assert_eq!(snapshot.hedge_ratio, 10.0);
        assert_eq!(snapshot.composite_score.value(), 4_000);
        // 100 of 1000 deposited is a 10% share
        assert_eq!(snapshot.concentration_risk.value(), 1_000);
        assert_eq!(snapshot.components.liquidity_risk.value(), 8_000);
    }

    #[tokio::test]
    async fn test_snapshot_cached_within_ttl() {
        let (engine, reader) = engine_with(vec![pool(0, 100, 20, 10, None)]).await;

        let first = engine.get_pool_risk(PoolId(0)).await.unwrap();
        let calls = reader.pool_info_calls();
        let second = engine.get_pool_risk(PoolId(0)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(reader.pool_info_calls(), calls);
    }

    #[tokio::test]
    async fn test_unknown_pool_is_not_found() {
        let (engine, _) = engine_with(vec![pool(0, 100, 20, 10, None)]).await;
        let err = engine.get_pool_risk(PoolId(42)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_volatility_prefers_oracle() {
        let (engine, reader) = engine_with(vec![]).await;
        let pair = AssetPairKey::new(Address::repeat_byte(1), Address::repeat_byte(2));
        reader.set_volatility_oracle(pair, BasisPoints::new(4_321)).await;
        assert_eq!(engine.estimate_volatility(pair).await.value(), 4_321);
    }

    #[tokio::test]
    async fn test_volatility_local_without_data_is_zero() {
        let (engine, reader) = engine_with(vec![]).await;
        reader.set_offline(true);
        let pair = AssetPairKey::new(Address::repeat_byte(1), Address::repeat_byte(2));
        assert_eq!(engine.estimate_volatility(pair).await, BasisPoints::ZERO);
    }

    #[tokio::test]
    async fn test_invalidate_pair_forces_new_estimate() {
        let (engine, reader) = engine_with(vec![]).await;
        let pair = AssetPairKey::new(Address::repeat_byte(1), Address::repeat_byte(2));
        reader.set_price(pair, Wad::from_units(10)).await;
        reader.set_volatility_oracle(pair, BasisPoints::new(1_000)).await;
        engine.sample_price(pair).await.unwrap();
        assert_eq!(engine.estimate_volatility(pair).await.value(), 1_000);

        reader.set_volatility_oracle(pair, BasisPoints::new(2_000)).await;
        assert_eq!(engine.estimate_volatility(pair).await.value(), 1_000);

        assert_eq!(engine.invalidate_pair(pair).await, 2);
        assert_eq!(engine.estimate_volatility(pair).await.value(), 2_000);
    }

    #[tokio::test]
    async fn test_correlation_neutral_with_few_observations() {
        let (engine, _) = engine_with(vec![]).await;
        let a = AssetPairKey::new(Address::repeat_byte(1), Address::repeat_byte(9));
        let b = AssetPairKey::new(Address::repeat_byte(2), Address::repeat_byte(9));
        assert_eq!(engine.estimate_correlation(a, b).await, BasisPoints::NEUTRAL);
    }

    #[tokio::test]
    async fn test_impermanent_loss_prefers_calculator() {
        let (engine, reader) = engine_with(vec![]).await;
        let local = engine.estimate_impermanent_loss(PoolId(0), 50.0).await;
        assert!(local.value.value() > 0);

        reader.set_il_calculator(PoolId(0), BasisPoints::new(77)).await;
        let on_chain = engine.estimate_impermanent_loss(PoolId(0), 50.0).await;
        assert_eq!(on_chain, Estimate::on_chain(BasisPoints::new(77)));
    }

    #[tokio::test]
    async fn test_sample_price_warms_window_from_history() {
        let (engine, reader) = engine_with(vec![]).await;
        let pair = AssetPairKey::new(Address::repeat_byte(1), Address::repeat_byte(2));
        let history = (1..=5u64).map(|i| PriceObservation::new(i * 1_000, Wad::from_units(100 + i))).collect();
        reader.set_price_history(pair, history).await;
        reader.set_price(pair, Wad::from_units(110)).await;

        assert_eq!(engine.sample_price(pair).await.unwrap(), Wad::from_units(110));
        assert_eq!(engine.sampler().observation_count(&pair).await, 6);

        // cached for the price TTL
        engine.sample_price(pair).await.unwrap();
        assert_eq!(reader.price_calls(), 1);
    }

    #[tokio::test]
    async fn test_account_health_cached_per_user() {
        let reader = Arc::new(InMemoryChainReader::new());
        let engine = RiskEngine::from_config(reader.clone(), EngineConfig::default());
        let user = Address::repeat_byte(7);
        let asset = Address::repeat_byte(8);

        assert!(engine.get_account_health(user, asset).await.unwrap_err().is_not_found());

        reader
            .set_account(AccountHealth {
                user,
                asset,
                collateral_value: Wad::from_units(150),
                liability_value: Wad::from_units(100),
            })
            .await;
        let health = engine.get_account_health(user, asset).await.unwrap();
        assert_eq!(health.health_factor(), Some(1.5));

        assert_eq!(engine.invalidate_user(user).await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_publishes_event_and_history() {
        let (engine, _) = engine_with(vec![pool(0, 100, 20, 10, Some(6_000))]).await;
        let mut events = engine.subscribe();

        engine.get_pool_risk(PoolId(0)).await.unwrap();
        let event = events.next_event().await.unwrap();
        assert_eq!(
            event,
            RiskEvent::SnapshotUpdated {
                pool_id: PoolId(0),
                composite_score: BasisPoints::new(6_000),
                level: crate::domain::risk::RiskLevel::High,
            }
        );

        let series = engine.get_pool_risk_history(PoolId(0), Timeframe::Week).await.unwrap();
        assert_eq!(series.len(), 7);
    }
}
