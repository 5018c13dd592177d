//! Utility functions and helpers

use chrono::{DateTime, Utc};

use crate::shared::types::Wad;

/// Format a fixed-point amount with 4 decimals
pub fn format_wad(amount: Wad) -> String {
    format!("{:.4}", amount.to_f64())
}

/// Calculate percentage change
pub fn calculate_percentage_change(old_value: f64, new_value: f64) -> f64 {
    if old_value > 0.0 {
        ((new_value - old_value) / old_value) * 100.0
    } else {
        0.0
    }
}

/// `part / whole * 100`, zero when `whole` is zero.
///
/// Works in integer space first (hundredths of a percent) so 18-decimal
/// amounts keep their precision.
pub fn ratio_percent(part: Wad, whole: Wad) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    match part.raw().checked_mul(10_000) {
        Some(scaled) => (scaled / whole.raw()) as f64 / 100.0,
        None => part.to_f64() / whole.to_f64() * 100.0,
    }
}

/// `part * 10000 / whole` in basis points, zero when `whole` is zero
pub fn share_bps(part: Wad, whole: Wad) -> u128 {
    if whole.is_zero() {
        return 0;
    }
    match part.raw().checked_mul(10_000) {
        Some(scaled) => scaled / whole.raw(),
        None => (part.to_f64() / whole.to_f64() * 10_000.0) as u128,
    }
}

/// Milliseconds since the Unix epoch
pub fn unix_millis(at: DateTime<Utc>) -> u64 {
    at.timestamp_millis().max(0) as u64
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    unix_millis(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_percent() {
        assert_eq!(ratio_percent(Wad::from_units(80), Wad::from_units(100)), 80.0);
        assert_eq!(ratio_percent(Wad::from_units(1), Wad::ZERO), 0.0);
    }

    #[test]
    fn test_share_bps() {
        assert_eq!(share_bps(Wad::from_units(60), Wad::from_units(100)), 6_000);
        assert_eq!(share_bps(Wad::from_units(5), Wad::from_units(1_000)), 50);
        assert_eq!(share_bps(Wad::from_units(5), Wad::ZERO), 0);
    }

    #[test]
    fn test_percentage_change() {
        assert_eq!(calculate_percentage_change(100.0, 110.0), 10.0);
        assert_eq!(calculate_percentage_change(0.0, 110.0), 0.0);
    }
}
