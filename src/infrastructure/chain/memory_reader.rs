//! In-memory Chain Reader for demo mode and tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::ChainReader;
use crate::domain::pool::{AccountHealth, PoolInfo};
use crate::domain::price::PriceObservation;
use crate::domain::recommendation::Strategy;
use crate::shared::config::EngineConfig;
use crate::shared::errors::ChainError;
use crate::shared::types::{Address, AssetPairKey, BasisPoints, PoolId, Wad};
use crate::shared::utils::now_millis;

/// Chain state held in maps. Oracles answer only for entries that were set,
/// everything else reports them as unsupported.
#[derive(Default)]
pub struct InMemoryChainReader {
    pools: RwLock<HashMap<PoolId, PoolInfo>>,
    prices: RwLock<HashMap<AssetPairKey, Wad>>,
    price_history: RwLock<HashMap<AssetPairKey, Vec<PriceObservation>>>,
    strategies: RwLock<Vec<Strategy>>,
    accounts: RwLock<HashMap<(Address, Address), AccountHealth>>,
    volatility_oracle: RwLock<HashMap<AssetPairKey, BasisPoints>>,
    correlation_oracle: RwLock<HashMap<(AssetPairKey, AssetPairKey), BasisPoints>>,
    il_calculator: RwLock<HashMap<PoolId, BasisPoints>>,
    offline: AtomicBool,
    pool_info_calls: AtomicUsize,
    price_calls: AtomicUsize,
}

impl InMemoryChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader serving the demo pools and price series of the configuration
    pub async fn from_config(config: &EngineConfig) -> Self {
        let reader = Self::new();
        for demo in &config.demo_pools {
            reader
                .set_pool(PoolInfo {
                    id: demo.id,
                    token0: demo.token0,
                    token1: demo.token1,
                    total_deposits: demo.total_deposits,
                    available_liquidity: demo.available_liquidity,
                    hedged_amount: demo.hedged_amount,
                    risk_score: demo.risk_score.map(|s| BasisPoints::new(s as u32)),
                    active: demo.active,
                })
                .await;
        }
        for demo in &config.demo_prices {
            let Some((current, history)) = demo.prices.split_last() else {
                continue;
            };
            let pair = AssetPairKey::new(demo.base, demo.quote);
            let interval_ms = demo.interval_secs.saturating_mul(1_000);
            let now = now_millis();
            let observations = history
                .iter()
                .enumerate()
                .map(|(i, price)| {
                    let age = (history.len() - i) as u64;
                    PriceObservation::new(now.saturating_sub(age * interval_ms), Wad::from_f64(*price))
                })
                .collect();
            reader.set_price_history(pair, observations).await;
            reader.set_price(pair, Wad::from_f64(*current)).await;
        }
        reader
    }

    pub async fn set_pool(&self, pool: PoolInfo) {
        self.pools.write().await.insert(pool.id, pool);
    }

    pub async fn remove_pool(&self, pool_id: PoolId) -> Option<PoolInfo> {
        self.pools.write().await.remove(&pool_id)
    }

    pub async fn set_price(&self, pair: AssetPairKey, price: Wad) {
        self.prices.write().await.insert(pair, price);
    }

    pub async fn set_price_history(&self, pair: AssetPairKey, observations: Vec<PriceObservation>) {
        self.price_history.write().await.insert(pair, observations);
    }

    pub async fn set_strategies(&self, strategies: Vec<Strategy>) {
        *self.strategies.write().await = strategies;
    }

    pub async fn set_account(&self, account: AccountHealth) {
        self.accounts.write().await.insert((account.user, account.asset), account);
    }

    pub async fn set_volatility_oracle(&self, pair: AssetPairKey, value: BasisPoints) {
        self.volatility_oracle.write().await.insert(pair, value);
    }

    pub async fn set_correlation_oracle(&self, a: AssetPairKey, b: AssetPairKey, value: BasisPoints) {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.correlation_oracle.write().await.insert(key, value);
    }

    pub async fn set_il_calculator(&self, pool_id: PoolId, value: BasisPoints) {
        self.il_calculator.write().await.insert(pool_id, value);
    }

    /// While offline every call fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn pool_info_calls(&self) -> usize {
        self.pool_info_calls.load(Ordering::SeqCst)
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), ChainError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ChainError::Unavailable("chain reader offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for InMemoryChainReader {
    async fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo, ChainError> {
        self.pool_info_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        self.pools
            .read()
            .await
            .get(&pool_id)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("pool {}", pool_id)))
    }

    async fn pool_count(&self) -> Result<u64, ChainError> {
        self.ensure_online()?;
        let pools = self.pools.read().await;
        Ok(pools.keys().map(|id| id.0 + 1).max().unwrap_or(0))
    }

    async fn current_price(&self, pair: &AssetPairKey) -> Result<Wad, ChainError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        self.prices
            .read()
            .await
            .get(pair)
            .copied()
            .ok_or_else(|| ChainError::NotFound(format!("price {}", pair)))
    }

    async fn historical_prices(&self, pair: &AssetPairKey, limit: usize) -> Result<Vec<PriceObservation>, ChainError> {
        self.ensure_online()?;
        let history = self.price_history.read().await;
        let observations = history.get(pair).map(Vec::as_slice).unwrap_or_default();
        let skip = observations.len().saturating_sub(limit);
        Ok(observations[skip..].to_vec())
    }

    async fn strategies(&self) -> Result<Vec<Strategy>, ChainError> {
        self.ensure_online()?;
        Ok(self.strategies.read().await.clone())
    }

    async fn account_health(&self, user: Address, asset: Address) -> Result<AccountHealth, ChainError> {
        self.ensure_online()?;
        self.accounts
            .read()
            .await
            .get(&(user, asset))
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("account {} in {}", user, asset)))
    }

    async fn volatility_oracle(&self, pair: &AssetPairKey) -> Result<BasisPoints, ChainError> {
        self.ensure_online()?;
        self.volatility_oracle
            .read()
            .await
            .get(pair)
            .copied()
            .ok_or(ChainError::Unsupported("volatility oracle"))
    }

    async fn correlation_oracle(&self, a: &AssetPairKey, b: &AssetPairKey) -> Result<BasisPoints, ChainError> {
        self.ensure_online()?;
        let key = if a <= b { (*a, *b) } else { (*b, *a) };
        self.correlation_oracle
            .read()
            .await
            .get(&key)
            .copied()
            .ok_or(ChainError::Unsupported("correlation oracle"))
    }

    async fn impermanent_loss_calculator(&self, pool_id: PoolId, _price_change_percent: f64) -> Result<BasisPoints, ChainError> {
        self.ensure_online()?;
        self.il_calculator
            .read()
            .await
            .get(&pool_id)
            .copied()
            .ok_or(ChainError::Unsupported("impermanent loss calculator"))
    }
}
