//! Shared rolling price windows keyed by asset pair

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{PriceHistory, PriceObservation, RecordOutcome};
use crate::shared::types::AssetPairKey;

/// Holds one [`PriceHistory`] per asset pair
#[derive(Clone, Default)]
pub struct PriceSampler {
    windows: Arc<RwLock<HashMap<AssetPairKey, PriceHistory>>>,
}

impl PriceSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_price(&self, pair: AssetPairKey, observation: PriceObservation) -> RecordOutcome {
        let mut windows = self.windows.write().await;
        let outcome = windows.entry(pair).or_default().record(observation);
        if outcome == RecordOutcome::Dropped {
            debug!(pair = %pair, timestamp = observation.timestamp, "Dropped out-of-order price observation");
        }
        outcome
    }

    /// Records a batch, typically historical prices used to warm a window
    pub async fn seed(&self, pair: AssetPairKey, mut observations: Vec<PriceObservation>) -> usize {
        observations.sort_by_key(|o| o.timestamp);
        let mut windows = self.windows.write().await;
        let window = windows.entry(pair).or_default();
        observations
            .into_iter()
            .map(|o| window.record(o))
            .filter(|outcome| *outcome != RecordOutcome::Dropped)
            .count()
    }

    /// Log returns of the pair's window; empty when the pair is unknown
    pub async fn compute_returns(&self, pair: &AssetPairKey) -> Vec<f64> {
        let windows = self.windows.read().await;
        windows.get(pair).map(|w| w.returns()).unwrap_or_default()
    }

    pub async fn observation_count(&self, pair: &AssetPairKey) -> usize {
        let windows = self.windows.read().await;
        windows.get(pair).map(|w| w.len()).unwrap_or(0)
    }

    pub async fn change_percent(&self, pair: &AssetPairKey) -> f64 {
        let windows = self.windows.read().await;
        windows.get(pair).map(|w| w.change_percent()).unwrap_or(0.0)
    }

    pub async fn latest(&self, pair: &AssetPairKey) -> Option<PriceObservation> {
        let windows = self.windows.read().await;
        windows.get(pair).and_then(|w| w.latest().copied())
    }
}
