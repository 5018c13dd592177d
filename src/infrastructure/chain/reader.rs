//! Chain Reader capability consumed by the risk engine

use async_trait::async_trait;

use crate::domain::pool::{AccountHealth, PoolInfo};
use crate::domain::price::PriceObservation;
use crate::domain::recommendation::Strategy;
use crate::shared::errors::ChainError;
use crate::shared::types::{Address, AssetPairKey, BasisPoints, PoolId, Wad};

/// Read-only view of the on-chain contracts.
///
/// Prices are quoted as units of `pair.quote()` per unit of `pair.base()`,
/// 18-decimal fixed point. The oracle methods are optional; the default
/// implementations report them as unsupported so callers fall back to local
/// estimation.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo, ChainError>;

    /// Number of registered pools; ids run from 0 to count - 1
    async fn pool_count(&self) -> Result<u64, ChainError>;

    async fn current_price(&self, pair: &AssetPairKey) -> Result<Wad, ChainError>;

    /// Up to `limit` most recent prices, oldest first
    async fn historical_prices(&self, _pair: &AssetPairKey, _limit: usize) -> Result<Vec<PriceObservation>, ChainError> {
        Ok(Vec::new())
    }

    async fn strategies(&self) -> Result<Vec<Strategy>, ChainError>;

    async fn account_health(&self, _user: Address, _asset: Address) -> Result<AccountHealth, ChainError> {
        Err(ChainError::Unsupported("account health"))
    }

    async fn volatility_oracle(&self, _pair: &AssetPairKey) -> Result<BasisPoints, ChainError> {
        Err(ChainError::Unsupported("volatility oracle"))
    }

    async fn correlation_oracle(&self, _a: &AssetPairKey, _b: &AssetPairKey) -> Result<BasisPoints, ChainError> {
        Err(ChainError::Unsupported("correlation oracle"))
    }

    async fn impermanent_loss_calculator(&self, _pool_id: PoolId, _price_change_percent: f64) -> Result<BasisPoints, ChainError> {
        Err(ChainError::Unsupported("impermanent loss calculator"))
    }
}
