//! Pool-level ratios feeding the risk scorer

use super::PoolInfo;
use crate::shared::types::Wad;
use crate::shared::utils::ratio_percent;

/// Analyzes pool balances
pub struct PoolAnalyzer;

impl PoolAnalyzer {
    /// Borrowed share of deposits, in percent
    pub fn utilization(pool: &PoolInfo) -> f64 {
        let borrowed = pool.total_deposits.saturating_sub(pool.available_liquidity);
        ratio_percent(borrowed, pool.total_deposits).min(100.0)
    }

    /// Hedged share of deposits, in percent
    pub fn hedge_ratio(pool: &PoolInfo) -> f64 {
        ratio_percent(pool.hedged_amount, pool.total_deposits).min(100.0)
    }

    /// Deposits summed over active pools
    pub fn protocol_deposits<'a, I>(pools: I) -> Wad
    where
        I: IntoIterator<Item = &'a PoolInfo>,
    {
        pools
            .into_iter()
            .filter(|p| p.active)
            .fold(Wad::ZERO, |acc, p| acc.saturating_add(p.total_deposits))
    }
}
