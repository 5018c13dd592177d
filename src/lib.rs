//! Riskpools - risk analytics and caching for hedged liquidity pools
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod shared;

// Re-export main types for convenience
pub use application::{RiskEngine, RiskScheduler};
pub use domain::risk::{RiskLevel, RiskSnapshot};
pub use infrastructure::cache::{CacheKey, RiskCache};
pub use infrastructure::chain::{ChainReader, HttpChainReader, InMemoryChainReader};
pub use shared::config::{ConfigLoader, EngineConfig};
pub use shared::errors::{AppError, RiskError};
