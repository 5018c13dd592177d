//! Hedging strategies published by the strategy registry

use serde::{Deserialize, Serialize};

use crate::shared::types::BasisPoints;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub id: u64,
    pub name: String,
    /// Lowest composite score this strategy is meant for
    pub risk_threshold_bp: BasisPoints,
    /// Target share of deposits to keep hedged
    pub hedge_ratio_bp: BasisPoints,
    pub active: bool,
}

/// Tightest-fitting active strategy whose threshold sits at or below
/// `current_risk`. The first strategy wins a tie.
pub fn select_strategy(strategies: &[Strategy], current_risk: BasisPoints) -> Option<&Strategy> {
    strategies
        .iter()
        .filter(|s| s.active && s.risk_threshold_bp <= current_risk)
        .min_by_key(|s| current_risk.value() - s.risk_threshold_bp.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(id: u64, threshold: u32, active: bool) -> Strategy {
        Strategy {
            id,
            name: format!("strategy-{}", id),
            risk_threshold_bp: BasisPoints::new(threshold),
            hedge_ratio_bp: BasisPoints::new(5_000),
            active,
        }
    }

    #[test]
    fn test_selects_tightest_threshold_from_below() {
        let strategies = vec![strategy(1, 2_000, true), strategy(2, 6_000, true), strategy(3, 9_000, true)];
        let selected = select_strategy(&strategies, BasisPoints::new(7_500)).map(|s| s.id);
        assert_eq!(selected, Some(2));
    }

    #[test]
    fn test_threshold_equal_to_risk_matches() {
        let strategies = vec![strategy(1, 2_000, true), strategy(2, 7_500, true)];
        assert_eq!(select_strategy(&strategies, BasisPoints::new(7_500)).map(|s| s.id), Some(2));
    }

    #[test]
    fn test_inactive_and_higher_thresholds_ignored() {
        let strategies = vec![strategy(1, 1_000, false), strategy(2, 8_000, true)];
        assert!(select_strategy(&strategies, BasisPoints::new(5_000)).is_none());
    }

    #[test]
    fn test_tie_keeps_first() {
        let strategies = vec![strategy(4, 3_000, true), strategy(5, 3_000, true)];
        assert_eq!(select_strategy(&strategies, BasisPoints::new(3_500)).map(|s| s.id), Some(4));
    }
}
