use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::shared::errors::AppError;
use crate::shared::types::{Address, BasisPoints, PoolId, Wad};

/// Chain gateway connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainCfg {
    pub gateway_url: String,
    pub timeout_ms: u64,
}

impl Default for ChainCfg {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8545/api".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Per-category cache TTLs, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCfg {
    pub price_ttl_secs: u64,
    pub position_ttl_secs: u64,
    pub pool_risk_ttl_secs: u64,
    pub analytics_ttl_secs: u64,
    pub pool_metadata_ttl_secs: u64,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self {
            price_ttl_secs: 30,
            position_ttl_secs: 10,
            pool_risk_ttl_secs: 300,
            analytics_ttl_secs: 60,
            pool_metadata_ttl_secs: 30,
        }
    }
}

/// Background sweep periods
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerCfg {
    pub enabled: bool,
    pub pool_sweep_secs: u64,
    pub volatility_sweep_secs: u64,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            pool_sweep_secs: 120,
            volatility_sweep_secs: 300,
        }
    }
}

impl SchedulerCfg {
    pub fn pool_sweep_period(&self) -> Duration {
        Duration::from_secs(self.pool_sweep_secs.max(1))
    }

    pub fn volatility_sweep_period(&self) -> Duration {
        Duration::from_secs(self.volatility_sweep_secs.max(1))
    }
}

/// Weights of the local composite score, used only when a pool carries no
/// on-chain risk score
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub volatility: f64,
    pub impermanent_loss: f64,
    pub correlation: f64,
    pub liquidity: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            volatility: 0.30,
            impermanent_loss: 0.25,
            correlation: 0.20,
            liquidity: 0.25,
        }
    }
}

/// Risk model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskCfg {
    /// Asset every token is priced against for correlation analysis
    pub quote_asset: Address,
    /// Hedging cost as a rate on the additional hedged notional
    pub hedge_cost_bps: u16,
    pub weights: CompositeWeights,
    /// Snapshots retained per pool for history queries
    pub history_capacity: usize,
}

impl Default for RiskCfg {
    fn default() -> Self {
        Self {
            // USDC on mainnet
            quote_asset: Address::new([
                0xa0, 0xb8, 0x69, 0x91, 0xc6, 0x21, 0x8b, 0x36, 0xc1, 0xd1, 0x9d, 0x4a, 0x2e, 0x9e,
                0xb0, 0xce, 0x36, 0x06, 0xeb, 0x48,
            ]),
            hedge_cost_bps: 30,
            weights: CompositeWeights::default(),
            history_capacity: 2_160,
        }
    }
}

impl RiskCfg {
    pub fn hedge_cost(&self) -> BasisPoints {
        BasisPoints::new(self.hedge_cost_bps as u32)
    }
}

/// Pair swept by the volatility refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairCfg {
    pub base: Address,
    pub quote: Address,
    pub label: Option<String>,
}

/// Pool fixture served by the in-memory reader in demo mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoPoolCfg {
    pub id: PoolId,
    pub token0: Address,
    pub token1: Address,
    pub total_deposits: Wad,
    pub available_liquidity: Wad,
    pub hedged_amount: Wad,
    pub risk_score: Option<u16>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Price series served for a pair in demo mode. The last price is the
/// current one; earlier prices are history spaced `interval_secs` apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoPriceCfg {
    pub base: Address,
    pub quote: Address,
    /// Oldest first, in whole units
    pub prices: Vec<f64>,
    #[serde(default = "default_demo_interval")]
    pub interval_secs: u64,
}

fn default_demo_interval() -> u64 {
    3_600
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub chain: ChainCfg,
    pub cache: CacheCfg,
    pub scheduler: SchedulerCfg,
    pub risk: RiskCfg,
    pub common_pairs: Vec<PairCfg>,
    pub demo_pools: Vec<DemoPoolCfg>,
    pub demo_prices: Vec<DemoPriceCfg>,
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from Config.toml in the working directory
    pub fn load_config() -> Result<EngineConfig, AppError> {
        Self::load_from("Config.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<EngineConfig, AppError> {
        let config_content = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;

        Self::parse(&config_content)
    }

    pub fn parse(content: &str) -> Result<EngineConfig, AppError> {
        toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))
    }
}
