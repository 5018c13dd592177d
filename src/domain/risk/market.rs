//! Market-wide conditions aggregated from per-pair statistics

use serde::{Deserialize, Serialize};

use crate::shared::types::BasisPoints;

const HIGH_VOLATILITY_INDEX: u16 = 6_000;
const LOW_VOLATILITY_INDEX: u16 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSentiment {
    HighVolatility,
    LowVolatility,
    Neutral,
}

impl MarketSentiment {
    pub fn from_volatility_index(index: BasisPoints) -> Self {
        match index.value() {
            v if v > HIGH_VOLATILITY_INDEX => MarketSentiment::HighVolatility,
            v if v < LOW_VOLATILITY_INDEX => MarketSentiment::LowVolatility,
            _ => MarketSentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSentiment::HighVolatility => "high_volatility",
            MarketSentiment::LowVolatility => "low_volatility",
            MarketSentiment::Neutral => "neutral",
        }
    }

    pub fn recommendation_text(&self) -> &'static str {
        match self {
            MarketSentiment::HighVolatility => "Markets are volatile: favour higher hedge ratios and smaller positions",
            MarketSentiment::LowVolatility => "Markets are calm: hedge ratios can be relaxed towards strategy minimums",
            MarketSentiment::Neutral => "Market conditions are normal: keep hedges at strategy targets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketConditions {
    pub volatility_index: BasisPoints,
    pub correlation_index: BasisPoints,
    pub sentiment: MarketSentiment,
    pub recommendation_text: String,
    /// Pairs the volatility index was averaged over
    pub sample_size: usize,
}

impl MarketConditions {
    /// Averages the given statistics. With no correlation samples the index is
    /// neutral; with no volatility samples it is zero.
    pub fn aggregate(volatilities: &[BasisPoints], correlations: &[BasisPoints]) -> Self {
        let volatility_index = average(volatilities).unwrap_or(BasisPoints::ZERO);
        let correlation_index = average(correlations).unwrap_or(BasisPoints::NEUTRAL);
        let sentiment = MarketSentiment::from_volatility_index(volatility_index);

        Self {
            volatility_index,
            correlation_index,
            sentiment,
            recommendation_text: sentiment.recommendation_text().to_string(),
            sample_size: volatilities.len(),
        }
    }
}

fn average(values: &[BasisPoints]) -> Option<BasisPoints> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|v| v.value() as u64).sum();
    Some(BasisPoints::new((sum / values.len() as u64) as u32))
}
