//! Chain Reader backed by a JSON indexer gateway in front of the contracts

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::ChainReader;
use crate::domain::pool::{AccountHealth, PoolInfo};
use crate::domain::price::PriceObservation;
use crate::domain::recommendation::Strategy;
use crate::shared::config::ChainCfg;
use crate::shared::errors::ChainError;
use crate::shared::types::{Address, AssetPairKey, BasisPoints, PoolId, Wad};

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: Wad,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    value: BasisPoints,
}

/// Gateway client
pub struct HttpChainReader {
    http_client: Client,
    base_url: String,
}

impl HttpChainReader {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &ChainCfg) -> Result<Self, ChainError> {
        Self::new(cfg.gateway_url.clone(), Duration::from_millis(cfg.timeout_ms))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChainError> {
        let url = self.endpoint(path);
        debug!("🔍 Fetching {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::Unavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ChainError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(ChainError::Unavailable(format!("{} returned {}", url, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ChainError::InvalidResponse(format!("{}: {}", url, e)))
    }

    /// Oracles the gateway does not expose answer 404
    async fn get_score(&self, path: &str, capability: &'static str) -> Result<BasisPoints, ChainError> {
        match self.get_json::<ScoreResponse>(path).await {
            Ok(response) => Ok(response.value),
            Err(ChainError::NotFound(_)) => Err(ChainError::Unsupported(capability)),
            Err(e) => Err(e),
        }
    }

    fn pair_path(pair: &AssetPairKey) -> String {
        format!("{}/{}", pair.base(), pair.quote())
    }
}

#[async_trait]
impl ChainReader for HttpChainReader {
    async fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo, ChainError> {
        self.get_json(&format!("pools/{}", pool_id)).await
    }

    async fn pool_count(&self) -> Result<u64, ChainError> {
        let response: CountResponse = self.get_json("pools/count").await?;
        Ok(response.count)
    }

    async fn current_price(&self, pair: &AssetPairKey) -> Result<Wad, ChainError> {
        let response: PriceResponse = self.get_json(&format!("prices/{}", Self::pair_path(pair))).await?;
        Ok(response.price)
    }

    async fn historical_prices(&self, pair: &AssetPairKey, limit: usize) -> Result<Vec<PriceObservation>, ChainError> {
        self.get_json(&format!("prices/{}/history?limit={}", Self::pair_path(pair), limit)).await
    }

    async fn strategies(&self) -> Result<Vec<Strategy>, ChainError> {
        self.get_json("strategies").await
    }

    async fn account_health(&self, user: Address, asset: Address) -> Result<AccountHealth, ChainError> {
        self.get_json(&format!("accounts/{}/{}", user, asset)).await
    }

    async fn volatility_oracle(&self, pair: &AssetPairKey) -> Result<BasisPoints, ChainError> {
        self.get_score(&format!("oracles/volatility/{}", Self::pair_path(pair)), "volatility oracle").await
    }

    async fn correlation_oracle(&self, a: &AssetPairKey, b: &AssetPairKey) -> Result<BasisPoints, ChainError> {
        let path = format!("oracles/correlation/{}/{}", Self::pair_path(a), Self::pair_path(b));
        self.get_score(&path, "correlation oracle").await
    }

    async fn impermanent_loss_calculator(&self, pool_id: PoolId, price_change_percent: f64) -> Result<BasisPoints, ChainError> {
        let path = format!("pools/{}/impermanent-loss?priceChange={}", pool_id, price_change_percent);
        self.get_score(&path, "impermanent loss calculator").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let reader = HttpChainReader::new("http://localhost:8080/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(reader.endpoint("/pools/3"), "http://localhost:8080/api/pools/3");
        assert_eq!(reader.endpoint("strategies"), "http://localhost:8080/api/strategies");
    }

    #[test]
    fn test_pool_payload_parses() {
        let json = r#"{
            "id": 3,
            "token0": "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
            "token1": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "totalDeposits": "100000000000000000000",
            "availableLiquidity": "20000000000000000000",
            "hedgedAmount": "10000000000000000000",
            "riskScore": 4200,
            "active": true
        }"#;
        let pool: PoolInfo = serde_json::from_str(json).unwrap();
        assert_eq!(pool.id, PoolId(3));
        assert_eq!(pool.total_deposits, Wad::from_units(100));
        assert_eq!(pool.risk_score, Some(BasisPoints::new(4_200)));

        let out_of_range = json.replace("4200", "20000");
        let pool: PoolInfo = serde_json::from_str(&out_of_range).unwrap();
        assert_eq!(pool.risk_score, Some(BasisPoints::MAX));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_unavailable() {
        let reader = HttpChainReader::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = reader.pool_count().await.unwrap_err();
        assert!(matches!(err, ChainError::Unavailable(_)));
    }
}
