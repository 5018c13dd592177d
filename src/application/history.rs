//! Per-pool record of computed risk components, resampled for history queries

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::risk::{RiskComponents, TimedComponents};
use crate::shared::types::{PoolId, Timeframe};

/// Bounded store of [`TimedComponents`] per pool, oldest first
#[derive(Clone)]
pub struct RiskHistoryStore {
    capacity: usize,
    records: Arc<RwLock<HashMap<PoolId, VecDeque<TimedComponents>>>>,
}

impl RiskHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Appends a record. Records older than the newest one are ignored.
    pub async fn record(&self, pool_id: PoolId, entry: TimedComponents) {
        let mut records = self.records.write().await;
        let series = records.entry(pool_id).or_default();

        if let Some(last) = series.back_mut() {
            if entry.timestamp < last.timestamp {
                return;
            }
            if entry.timestamp == last.timestamp {
                *last = entry;
                return;
            }
        }

        if series.len() == self.capacity {
            series.pop_front();
        }
        series.push_back(entry);
    }

    pub async fn len(&self, pool_id: PoolId) -> usize {
        self.records.read().await.get(&pool_id).map(VecDeque::len).unwrap_or(0)
    }

    /// `timeframe.points()` points ending at `now`, spaced by
    /// `timeframe.spacing()`, ascending.
    ///
    /// Each point carries the latest record at or before its time. Points
    /// before the first record repeat the first record; a pool with no
    /// records yields zeroed components.
    pub async fn series(&self, pool_id: PoolId, timeframe: Timeframe, now: DateTime<Utc>) -> Vec<TimedComponents> {
        let records = self.records.read().await;
        let series = records.get(&pool_id);
        let points = timeframe.points();
        let spacing = timeframe.spacing();

        (0..points)
            .map(|i| {
                let timestamp = now - spacing * (points - 1 - i) as i32;
                let components = series
                    .and_then(|s| Self::components_at(s, timestamp))
                    .unwrap_or_default();
                TimedComponents { timestamp, components }
            })
            .collect()
    }

    fn components_at(series: &VecDeque<TimedComponents>, at: DateTime<Utc>) -> Option<RiskComponents> {
        series
            .iter()
            .rev()
            .find(|r| r.timestamp <= at)
            .or_else(|| series.front())
            .map(|r| r.components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::BasisPoints;
    use chrono::Duration;

    fn components(volatility: u32) -> RiskComponents {
        RiskComponents {
            volatility: BasisPoints::new(volatility),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_series_has_timeframe_grid() {
        let store = RiskHistoryStore::new(16);
        let now = Utc::now();
        store
            .record(PoolId(1), TimedComponents { timestamp: now, components: components(100) })
            .await;

        for timeframe in [Timeframe::Day, Timeframe::Week, Timeframe::Month, Timeframe::Quarter] {
            let series = store.series(PoolId(1), timeframe, now).await;
            assert_eq!(series.len(), timeframe.points());
            assert!(series.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            assert_eq!(series.last().unwrap().timestamp, now);
        }
    }

    #[tokio::test]
    async fn test_points_take_latest_record_before_them() {
        let store = RiskHistoryStore::new(16);
        let now = Utc::now();
        store
            .record(PoolId(1), TimedComponents { timestamp: now - Duration::hours(5), components: components(100) })
            .await;
        store
            .record(PoolId(1), TimedComponents { timestamp: now - Duration::minutes(90), components: components(200) })
            .await;

        let series = store.series(PoolId(1), Timeframe::Day, now).await;
        // backfilled from the first record
        assert_eq!(series[0].components.volatility.value(), 100);
        // two hours ago only the older record existed
        assert_eq!(series[21].components.volatility.value(), 100);
        assert_eq!(series[22].components.volatility.value(), 200);
        assert_eq!(series[23].components.volatility.value(), 200);
    }

    #[tokio::test]
    async fn test_capacity_and_ordering() {
        let store = RiskHistoryStore::new(2);
        let now = Utc::now();
        for (offset, value) in [(3, 1), (2, 2), (1, 3)] {
            store
                .record(PoolId(4), TimedComponents { timestamp: now - Duration::hours(offset), components: components(value) })
                .await;
        }
        assert_eq!(store.len(PoolId(4)).await, 2);

        store
            .record(PoolId(4), TimedComponents { timestamp: now - Duration::hours(10), components: components(9) })
            .await;
        assert_eq!(store.len(PoolId(4)).await, 2);
        assert!(store.series(PoolId(5), Timeframe::Week, now).await.iter().all(|p| p.components == RiskComponents::default()));
    }
}
