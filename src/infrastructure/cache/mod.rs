//! Typed TTL cache for chain reads and derived risk data

mod keys;
mod risk_cache;
mod value;

pub use keys::{AnalyticsKey, CacheCategory, CacheKey};
pub use risk_cache::{CacheStats, OnFailure, RiskCache, TtlPolicy};
pub use value::{CacheValue, Cacheable};
