//! Pool domain - hedged liquidity pools and account positions

mod pool_analyzer;

pub use pool_analyzer::PoolAnalyzer;

use serde::{Deserialize, Serialize};

use crate::shared::types::{Address, BasisPoints, PoolId, Wad};

/// Pool state as read from the pool registry contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    pub id: PoolId,
    pub token0: Address,
    pub token1: Address,
    pub total_deposits: Wad,
    pub available_liquidity: Wad,
    pub hedged_amount: Wad,
    /// Authoritative composite score maintained on chain, when published
    #[serde(default)]
    pub risk_score: Option<BasisPoints>,
    pub active: bool,
}

/// Collateral and debt of one account in one asset vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHealth {
    pub user: Address,
    pub asset: Address,
    pub collateral_value: Wad,
    pub liability_value: Wad,
}

impl AccountHealth {
    /// Collateral over liabilities; `None` for an account without debt
    pub fn health_factor(&self) -> Option<f64> {
        if self.liability_value.is_zero() {
            return None;
        }
        Some(self.collateral_value.to_f64() / self.liability_value.to_f64())
    }

    pub fn is_liquidatable(&self) -> bool {
        self.health_factor().map(|hf| hf < 1.0).unwrap_or(false)
    }
}
