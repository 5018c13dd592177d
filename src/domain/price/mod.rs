//! Price domain - rolling price windows and return series

mod price_analyzer;
mod price_history;
mod price_sampler;

pub use price_analyzer::PriceAnalyzer;
pub use price_history::{PriceHistory, RecordOutcome, PRICE_HISTORY_CAPACITY};
pub use price_sampler::PriceSampler;

use serde::{Deserialize, Serialize};

use crate::shared::types::Wad;

/// Single price point of an asset pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub price: Wad,
}

impl PriceObservation {
    pub fn new(timestamp: u64, price: Wad) -> Self {
        Self { timestamp, price }
    }
}
