//! Bounded per-pair price window

use std::collections::VecDeque;

use super::{PriceAnalyzer, PriceObservation};

/// Observations kept per asset pair
pub const PRICE_HISTORY_CAPACITY: usize = 30;

/// What happened to an observation handed to [`PriceHistory::record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Appended,
    /// Appended after evicting the oldest observation
    Evicted,
    /// Replaced the newest observation carrying the same timestamp
    Overwritten,
    /// Older than the newest observation
    Dropped,
}

/// FIFO ring buffer of observations, sorted ascending by unique timestamp
#[derive(Debug, Clone)]
pub struct PriceHistory {
    observations: VecDeque<PriceObservation>,
    capacity: usize,
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::with_capacity(PRICE_HISTORY_CAPACITY)
    }
}

impl PriceHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            observations: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, observation: PriceObservation) -> RecordOutcome {
        if let Some(last) = self.observations.back_mut() {
            if observation.timestamp == last.timestamp {
                *last = observation;
                return RecordOutcome::Overwritten;
            }
            if observation.timestamp < last.timestamp {
                return RecordOutcome::Dropped;
            }
        }

        let evicted = if self.observations.len() == self.capacity {
            self.observations.pop_front();
            true
        } else {
            false
        };
        self.observations.push_back(observation);

        if evicted {
            RecordOutcome::Evicted
        } else {
            RecordOutcome::Appended
        }
    }

    pub fn returns(&self) -> Vec<f64> {
        PriceAnalyzer::log_returns(self.observations.iter())
    }

    /// Percentage change across the window, zero with fewer than 2 points
    pub fn change_percent(&self) -> f64 {
        match (self.observations.front(), self.observations.back()) {
            (Some(first), Some(last)) if self.observations.len() >= 2 => {
                PriceAnalyzer::window_change_percent(first, last)
            }
            _ => 0.0,
        }
    }

    pub fn latest(&self) -> Option<&PriceObservation> {
        self.observations.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceObservation> {
        self.observations.iter()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Wad;

    fn obs(ts: u64, units: u64) -> PriceObservation {
        PriceObservation::new(ts, Wad::from_units(units))
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut history = PriceHistory::default();
        for ts in 0..PRICE_HISTORY_CAPACITY as u64 {
            assert_eq!(history.record(obs(ts, 100 + ts)), RecordOutcome::Appended);
        }
        assert_eq!(history.record(obs(1_000, 1)), RecordOutcome::Evicted);
        assert_eq!(history.len(), PRICE_HISTORY_CAPACITY);
        assert_eq!(history.iter().next().map(|o| o.timestamp), Some(1));
        assert_eq!(history.latest().map(|o| o.timestamp), Some(1_000));
    }

    #[test]
    fn test_same_timestamp_overwrites() {
        let mut history = PriceHistory::default();
        history.record(obs(10, 100));
        assert_eq!(history.record(obs(10, 105)), RecordOutcome::Overwritten);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().map(|o| o.price), Some(Wad::from_units(105)));
    }

    #[test]
    fn test_out_of_order_is_dropped() {
        let mut history = PriceHistory::default();
        history.record(obs(10, 100));
        history.record(obs(20, 101));
        assert_eq!(history.record(obs(15, 99)), RecordOutcome::Dropped);
        let timestamps: Vec<u64> = history.iter().map(|o| o.timestamp).collect();
        assert_eq!(timestamps, vec![10, 20]);
    }

    #[test]
    fn test_returns_are_recomputed_each_call() {
        let mut history = PriceHistory::default();
        history.record(obs(1, 100));
        assert!(history.returns().is_empty());
        history.record(obs(2, 200));
        assert_eq!(history.returns(), history.returns());
        assert!((history.returns()[0] - 2f64.ln()).abs() < 1e-12);
        assert!((history.change_percent() - 100.0).abs() < 1e-9);
    }
}
