//! Risk domain - estimators, composite scoring and snapshots

mod correlation;
mod estimate;
mod impermanent_loss;
mod market;
mod scorer;
mod volatility;

pub use correlation::{CorrelationEstimator, MIN_OBSERVATIONS_FOR_CORRELATION};
pub use estimate::{Estimate, EstimateSource};
pub use impermanent_loss::ImpermanentLossEstimator;
pub use market::{MarketConditions, MarketSentiment};
pub use scorer::{CompositeRiskScorer, RiskMetrics};
pub use volatility::VolatilityEstimator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::recommendation::Recommendation;
use crate::shared::types::{BasisPoints, PoolId};

/// Risk classification of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Strict cutoffs: a score sitting on a threshold falls into the lower tier
    pub fn from_score(score: BasisPoints) -> Self {
        match score.value() {
            s if s > 7_000 => RiskLevel::Critical,
            s if s > 5_000 => RiskLevel::High,
            s if s > 3_000 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Locally derived risk signals of a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskComponents {
    pub volatility: BasisPoints,
    pub impermanent_loss: BasisPoints,
    pub correlation_risk: BasisPoints,
    pub liquidity_risk: BasisPoints,
}

/// Components at a point in time, as returned by history queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedComponents {
    pub timestamp: DateTime<Utc>,
    pub components: RiskComponents,
}

/// Full risk picture of one pool. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSnapshot {
    pub pool_id: PoolId,
    pub timestamp: DateTime<Utc>,
    pub composite_score: BasisPoints,
    pub level: RiskLevel,
    pub components: RiskComponents,
    pub utilization: f64,
    pub hedge_ratio: f64,
    pub concentration_risk: BasisPoints,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RiskLevel::from_score(BasisPoints::new(7_001)), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(BasisPoints::new(7_000)), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(BasisPoints::new(5_001)), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(BasisPoints::new(5_000)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(BasisPoints::new(3_001)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(BasisPoints::new(3_000)), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(BasisPoints::new(0)), RiskLevel::Low);
    }
}
