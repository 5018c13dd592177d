//! Rule-based recommendations for a scored pool

use super::{select_strategy, HedgeAdjustment, HedgeDirection, Priority, Recommendation, RecommendationKind, Strategy};
use crate::domain::pool::PoolInfo;
use crate::domain::risk::RiskMetrics;
use crate::shared::types::{BasisPoints, Wad};
use crate::shared::utils::format_wad;

const CRITICAL_SCORE: u16 = 7_000;
const WARNING_SCORE: u16 = 5_000;
const UTILIZATION_LIMIT: f64 = 90.0;
const HIGH_VOLATILITY: u16 = 6_000;
const HIGH_CORRELATION: u16 = 7_000;
const UNDER_HEDGED: f64 = 0.8;
const OVER_HEDGED: f64 = 1.2;

/// Generates guidance in a fixed rule order; callers re-sort by priority if
/// they need to.
pub struct RecommendationEngine {
    hedge_cost: BasisPoints,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(BasisPoints::new(30))
    }
}

impl RecommendationEngine {
    pub fn new(hedge_cost: BasisPoints) -> Self {
        Self { hedge_cost }
    }

    pub fn recommend(&self, pool: &PoolInfo, metrics: &RiskMetrics, strategies: &[Strategy]) -> Vec<Recommendation> {
        let mut out = Vec::new();
        let score = metrics.composite_score.value();

        if score > CRITICAL_SCORE {
            out.push(
                Recommendation::new(
                    RecommendationKind::Critical,
                    Priority::Critical,
                    format!("Critical risk level ({:.1}%): reduce exposure immediately", metrics.composite_score.as_percent()),
                )
                .with_actions(["Reduce open positions", "Increase hedging coverage", "Pause new deposits"]),
            );
        } else if score > WARNING_SCORE {
            out.push(
                Recommendation::new(
                    RecommendationKind::Warning,
                    Priority::High,
                    format!("Elevated risk level ({:.1}%): review hedging", metrics.composite_score.as_percent()),
                )
                .with_actions(["Review hedge ratio against strategy", "Monitor pool closely"]),
            );
        }

        if metrics.utilization > UTILIZATION_LIMIT {
            out.push(
                Recommendation::new(
                    RecommendationKind::Liquidity,
                    Priority::High,
                    format!("Utilization at {:.1}%: withdrawal capacity is limited", metrics.utilization),
                )
                .with_actions(["Attract additional liquidity", "Plan withdrawals ahead"]),
            );
        }

        if let Some(strategy) = select_strategy(strategies, metrics.composite_score) {
            out.push(self.hedge_recommendation(pool, metrics.hedge_ratio, strategy));
        }

        if metrics.components.volatility.value() > HIGH_VOLATILITY {
            out.push(
                Recommendation::new(
                    RecommendationKind::Volatility,
                    Priority::Medium,
                    format!("High volatility ({:.1}% annualized)", metrics.components.volatility.as_percent()),
                )
                .with_actions(["Widen hedging bands", "Consider shorter rebalancing intervals"]),
            );
        }

        if metrics.components.correlation_risk.value() > HIGH_CORRELATION {
            out.push(
                Recommendation::new(
                    RecommendationKind::Correlation,
                    Priority::Low,
                    "Pool assets move together: diversification would lower risk",
                )
                .with_actions(["Diversify into less correlated pairs"]),
            );
        }

        out
    }

    fn hedge_recommendation(&self, pool: &PoolInfo, current: f64, strategy: &Strategy) -> Recommendation {
        let optimal = strategy.hedge_ratio_bp.as_percent();
        let mut hedge = HedgeAdjustment {
            direction: HedgeDirection::Maintain,
            strategy_id: strategy.id,
            current_ratio: current,
            target_ratio: optimal,
            estimated_cost: None,
        };

        if current < optimal * UNDER_HEDGED {
            let cost = self.estimated_cost(pool.total_deposits, optimal - current);
            hedge.direction = HedgeDirection::IncreaseHedge;
            hedge.estimated_cost = Some(cost);
            Recommendation::new(
                RecommendationKind::Hedging,
                Priority::High,
                format!(
                    "Increase hedge ratio from {:.1}% to {:.1}% ({}), estimated cost {}",
                    current,
                    optimal,
                    strategy.name,
                    format_wad(cost)
                ),
            )
            .with_actions(["Open additional hedge positions"])
            .with_hedge(hedge)
        } else if current > optimal * OVER_HEDGED {
            hedge.direction = HedgeDirection::ReduceHedge;
            Recommendation::new(
                RecommendationKind::Hedging,
                Priority::Medium,
                format!("Reduce hedge ratio from {:.1}% to {:.1}% ({})", current, optimal, strategy.name),
            )
            .with_actions(["Close part of the hedge to recover capital"])
            .with_hedge(hedge)
        } else {
            Recommendation::new(
                RecommendationKind::Maintain,
                Priority::Low,
                format!("Hedge ratio {:.1}% is on target for {}", current, strategy.name),
            )
            .with_actions(["Maintain current hedge"])
            .with_hedge(hedge)
        }
    }

    /// Cost of hedging an extra `gap_percent` of deposits
    fn estimated_cost(&self, total_deposits: Wad, gap_percent: f64) -> Wad {
        let notional = total_deposits.to_f64() * gap_percent / 100.0;
        Wad::from_f64(notional * self.hedge_cost.as_fraction())
    }
}
