//! Background sweeps keeping pool risk and pair volatility warm

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::risk_engine::RiskEngine;
use crate::shared::config::SchedulerCfg;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub refreshed: usize,
    pub failed: usize,
}

pub struct RiskScheduler {
    engine: RiskEngine,
    config: SchedulerCfg,
}

/// Stops the sweeps started by [`RiskScheduler::start`]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signals both sweeps and waits for them to finish their current pass
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Sweep task ended abnormally: {}", e);
            }
        }
        info!("🛑 Risk scheduler stopped");
    }
}

impl RiskScheduler {
    pub fn new(engine: RiskEngine, config: SchedulerCfg) -> Self {
        Self { engine, config }
    }

    /// Spawns the pool-risk and volatility sweeps. Each fires immediately,
    /// then on its period.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, signal) = watch::channel(false);
        info!(
            pool_sweep_secs = self.config.pool_sweep_secs,
            volatility_sweep_secs = self.config.volatility_sweep_secs,
            "⏱️  Starting risk scheduler"
        );

        let pool_engine = self.engine.clone();
        let pool_task = Self::spawn_loop("pool-risk", self.config.pool_sweep_period(), signal.clone(), move || {
            let engine = pool_engine.clone();
            async move { Self::sweep_pools(&engine).await }
        });

        let volatility_engine = self.engine.clone();
        let volatility_task = Self::spawn_loop("volatility", self.config.volatility_sweep_period(), signal, move || {
            let engine = volatility_engine.clone();
            async move { Self::sweep_volatility(&engine).await }
        });

        SchedulerHandle {
            shutdown,
            tasks: vec![pool_task, volatility_task],
        }
    }

    fn spawn_loop<F, Fut>(name: &'static str, period: std::time::Duration, mut signal: watch::Receiver<bool>, mut sweep: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = SweepReport> + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = sweep().await;
                        debug!(sweep = name, refreshed = report.refreshed, failed = report.failed, "Sweep finished");
                    }
                    changed = signal.changed() => {
                        if changed.is_err() || *signal.borrow() {
                            debug!(sweep = name, "Sweep loop exiting");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Recomputes every registered pool. A failing pool does not stop the
    /// others.
    pub async fn sweep_pools(engine: &RiskEngine) -> SweepReport {
        let ids = match engine.pool_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Pool sweep skipped, pool count unavailable: {}", e);
                return SweepReport { refreshed: 0, failed: 1 };
            }
        };

        let results = join_all(ids.iter().map(|id| engine.refresh_pool_risk(*id))).await;
        let mut report = SweepReport::default();
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(_) => report.refreshed += 1,
                Err(e) if e.is_not_found() => debug!(pool = %id, "Pool not found during sweep"),
                Err(e) => {
                    warn!(pool = %id, error = %e, "Pool risk refresh failed");
                    report.failed += 1;
                }
            }
        }

        info!("🔄 Pool sweep: {} refreshed, {} failed", report.refreshed, report.failed);
        report
    }

    /// Recomputes volatility of the configured common pairs
    pub async fn sweep_volatility(engine: &RiskEngine) -> SweepReport {
        let pairs = engine.common_pairs();
        let results = join_all(pairs.iter().map(|pair| engine.refresh_volatility(*pair))).await;

        let mut report = SweepReport::default();
        for (pair, result) in pairs.iter().zip(results) {
            match result {
                Ok(_) => report.refreshed += 1,
                Err(e) => {
                    warn!(pair = %pair, error = %e, "Volatility refresh failed");
                    report.failed += 1;
                }
            }
        }

        debug!("Volatility sweep: {} refreshed, {} failed", report.refreshed, report.failed);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::PoolInfo;
    use crate::infrastructure::cache::CacheCategory;
    use crate::infrastructure::chain::InMemoryChainReader;
    use crate::shared::config::{EngineConfig, PairCfg};
    use crate::shared::types::{Address, AssetPairKey, PoolId, Wad};
    use std::sync::Arc;
    use std::time::Duration;

    fn pool(id: u64) -> PoolInfo {
        PoolInfo {
            id: PoolId(id),
            token0: Address::repeat_byte(0xc0),
            token1: Address::repeat_byte(0x11),
            total_deposits: Wad::from_units(100),
            available_liquidity: Wad::from_units(50),
            hedged_amount: Wad::ZERO,
            risk_score: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_sweep_isolates_missing_pools() {
        let reader = Arc::new(InMemoryChainReader::new());
        reader.set_pool(pool(0)).await;
        reader.set_pool(pool(2)).await;
        let engine = RiskEngine::from_config(reader, EngineConfig::default());

        let report = RiskScheduler::sweep_pools(&engine).await;
        assert_eq!(report, SweepReport { refreshed: 2, failed: 0 });
    }

    #[tokio::test]
    async fn test_volatility_sweep_counts_pairs() {
        let base = Address::repeat_byte(0xc0);
        let quote = Address::repeat_byte(0xa0);
        let reader = Arc::new(InMemoryChainReader::new());
        reader.set_price(AssetPairKey::new(base, quote), Wad::from_units(2_000)).await;

        let mut config = EngineConfig::default();
        config.common_pairs.push(PairCfg { base, quote, label: None });
        let engine = RiskEngine::from_config(reader, config);

        let report = RiskScheduler::sweep_volatility(&engine).await;
        assert_eq!(report, SweepReport { refreshed: 1, failed: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_populates_cache_and_stops() {
        let reader = Arc::new(InMemoryChainReader::new());
        reader.set_pool(pool(0)).await;
        let engine = RiskEngine::from_config(reader, EngineConfig::default());

        let handle = RiskScheduler::new(engine.clone(), SchedulerCfg::default()).start();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let stats = engine.cache_stats().await;
        assert_eq!(stats.per_category[&CacheCategory::PoolRisk], 1);

        handle.shutdown().await;
    }
}
