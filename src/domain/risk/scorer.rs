//! Composite pool risk: utilization, hedge ratio, concentration and level

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RiskComponents, RiskLevel, RiskSnapshot};
use crate::domain::pool::{PoolAnalyzer, PoolInfo};
use crate::domain::recommendation::{RecommendationEngine, Strategy};
use crate::shared::config::CompositeWeights;
use crate::shared::types::{BasisPoints, Wad};
use crate::shared::utils::share_bps;

/// Everything the recommendation rules look at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub composite_score: BasisPoints,
    pub level: RiskLevel,
    pub components: RiskComponents,
    pub utilization: f64,
    pub hedge_ratio: f64,
    pub concentration_risk: BasisPoints,
}

pub struct CompositeRiskScorer {
    weights: CompositeWeights,
}

impl Default for CompositeRiskScorer {
    fn default() -> Self {
        Self::new(CompositeWeights::default())
    }
}

impl CompositeRiskScorer {
    pub fn new(weights: CompositeWeights) -> Self {
        Self { weights }
    }

    /// Bucketed by the pool's share of protocol-wide deposits
    pub fn concentration_risk(pool_deposits: Wad, protocol_deposits: Wad) -> BasisPoints {
        if protocol_deposits.is_zero() {
            return BasisPoints::ZERO;
        }
        let share = share_bps(pool_deposits, protocol_deposits);
        let bucket = match share {
            s if s > 5_000 => 8_000,
            s if s > 2_000 => 5_000,
            s if s > 1_000 => 3_000,
            _ => 1_000,
        };
        BasisPoints::new(bucket)
    }

    /// Utilization percent expressed on the basis-point scale
    pub fn liquidity_risk(utilization: f64) -> BasisPoints {
        BasisPoints::from_f64(utilization * 100.0)
    }

    /// Weighted blend of the local components, used when no on-chain score
    /// is published
    pub fn blended_score(&self, components: &RiskComponents) -> BasisPoints {
        let w = &self.weights;
        let total = w.volatility + w.impermanent_loss + w.correlation + w.liquidity;
        if !(total > 0.0) {
            return BasisPoints::ZERO;
        }
        let weighted = components.volatility.value() as f64 * w.volatility
            + components.impermanent_loss.value() as f64 * w.impermanent_loss
            + components.correlation_risk.value() as f64 * w.correlation
            + components.liquidity_risk.value() as f64 * w.liquidity;
        BasisPoints::from_f64(weighted / total)
    }

    /// Derives the pool metrics. The on-chain score stays authoritative when
    /// present; the local components only drive recommendations then.
    pub fn assess(&self, pool: &PoolInfo, components: RiskComponents, protocol_deposits: Wad) -> RiskMetrics {
        let composite_score = pool.risk_score.unwrap_or_else(|| self.blended_score(&components));

        RiskMetrics {
            composite_score,
            level: RiskLevel::from_score(composite_score),
            components,
            utilization: PoolAnalyzer::utilization(pool),
            hedge_ratio: PoolAnalyzer::hedge_ratio(pool),
            concentration_risk: Self::concentration_risk(pool.total_deposits, protocol_deposits),
        }
    }

    pub fn score_pool(
        &self,
        pool: &PoolInfo,
        components: RiskComponents,
        protocol_deposits: Wad,
        strategies: &[Strategy],
        recommender: &RecommendationEngine,
        timestamp: DateTime<Utc>,
    ) -> RiskSnapshot {
        let metrics = self.assess(pool, components, protocol_deposits);
        let recommendations = recommender.recommend(pool, &metrics, strategies);

        RiskSnapshot {
            pool_id: pool.id,
            timestamp,
            composite_score: metrics.composite_score,
            level: metrics.level,
            components: metrics.components,
            utilization: metrics.utilization,
            hedge_ratio: metrics.hedge_ratio,
            concentration_risk: metrics.concentration_risk,
            recommendations,
        }
    }
}
