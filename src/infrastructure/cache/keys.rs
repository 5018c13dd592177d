//! Structured cache keys

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::types::{Address, AssetPairKey, PoolId, Timeframe};

/// TTL class of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    /// Prices and liquidity quotes
    Price,
    /// Account and position health
    Position,
    PoolRisk,
    /// Aggregates and derived statistics
    Analytics,
    PoolMetadata,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 5] = [
        CacheCategory::Price,
        CacheCategory::Position,
        CacheCategory::PoolRisk,
        CacheCategory::Analytics,
        CacheCategory::PoolMetadata,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnalyticsKey {
    MarketConditions,
    ProtocolDeposits,
    RiskHistory(PoolId, Timeframe),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Price(AssetPairKey),
    Volatility(AssetPairKey),
    /// Always built through [`CacheKey::correlation`] so both orders share an entry
    Correlation(AssetPairKey, AssetPairKey),
    PoolInfo(PoolId),
    PoolRisk(PoolId),
    Strategies,
    AccountHealth { user: Address, asset: Address },
    Analytics(AnalyticsKey),
}

impl CacheKey {
    pub fn correlation(a: AssetPairKey, b: AssetPairKey) -> Self {
        if a <= b {
            CacheKey::Correlation(a, b)
        } else {
            CacheKey::Correlation(b, a)
        }
    }

    pub fn category(&self) -> CacheCategory {
        match self {
            CacheKey::Price(_) => CacheCategory::Price,
            CacheKey::AccountHealth { .. } => CacheCategory::Position,
            CacheKey::PoolRisk(_) => CacheCategory::PoolRisk,
            CacheKey::Volatility(_) | CacheKey::Correlation(..) | CacheKey::Analytics(_) => CacheCategory::Analytics,
            CacheKey::PoolInfo(_) | CacheKey::Strategies => CacheCategory::PoolMetadata,
        }
    }

    /// Entries that go stale when the pool's state changes
    pub fn relates_to_pool(&self, pool_id: PoolId) -> bool {
        match self {
            CacheKey::PoolInfo(id) | CacheKey::PoolRisk(id) => *id == pool_id,
            CacheKey::Analytics(AnalyticsKey::RiskHistory(id, _)) => *id == pool_id,
            CacheKey::Analytics(AnalyticsKey::ProtocolDeposits) => true,
            _ => false,
        }
    }

    pub fn relates_to_pair(&self, pair: &AssetPairKey) -> bool {
        match self {
            CacheKey::Price(p) | CacheKey::Volatility(p) => p == pair,
            CacheKey::Correlation(a, b) => a == pair || b == pair,
            _ => false,
        }
    }

    pub fn relates_to_user(&self, user: &Address) -> bool {
        matches!(self, CacheKey::AccountHealth { user: u, .. } if u == user)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Price(pair) => write!(f, "price:{}", pair),
            CacheKey::Volatility(pair) => write!(f, "volatility:{}", pair),
            CacheKey::Correlation(a, b) => write!(f, "correlation:{}|{}", a, b),
            CacheKey::PoolInfo(id) => write!(f, "pool:{}", id),
            CacheKey::PoolRisk(id) => write!(f, "pool-risk:{}", id),
            CacheKey::Strategies => write!(f, "strategies"),
            CacheKey::AccountHealth { user, asset } => write!(f, "account:{}:{}", user, asset),
            CacheKey::Analytics(AnalyticsKey::MarketConditions) => write!(f, "analytics:market"),
            CacheKey::Analytics(AnalyticsKey::ProtocolDeposits) => write!(f, "analytics:protocol-deposits"),
            CacheKey::Analytics(AnalyticsKey::RiskHistory(id, tf)) => write!(f, "analytics:history:{}:{}", id, tf),
        }
    }
}
