//! Closed-form impermanent loss of a constant-product position

use crate::shared::types::BasisPoints;

pub struct ImpermanentLossEstimator;

impl ImpermanentLossEstimator {
    /// Loss versus holding, as a fraction, for a relative price move of
    /// `price_change_percent`. Zero for a non-positive price ratio.
    pub fn loss_fraction(price_change_percent: f64) -> f64 {
        let ratio = (100.0 + price_change_percent) / 100.0;
        if !ratio.is_finite() || ratio <= 0.0 {
            return 0.0;
        }
        let il = 2.0 * ratio.sqrt() / (1.0 + ratio) - 1.0;
        (-il).max(0.0)
    }

    pub fn estimate(price_change_percent: f64) -> BasisPoints {
        BasisPoints::from_f64(Self::loss_fraction(price_change_percent) * 10_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_price_change_no_loss() {
        assert_eq!(ImpermanentLossEstimator::estimate(0.0), BasisPoints::ZERO);
    }

    #[test]
    fn test_price_doubling() {
        // 2*sqrt(2)/3 - 1 = -5.72%
        assert_eq!(ImpermanentLossEstimator::estimate(100.0).value(), 572);
    }

    #[test]
    fn test_roughly_symmetric_for_small_moves() {
        for x in [0.5, 1.0, 2.0, 5.0] {
            let up = ImpermanentLossEstimator::loss_fraction(x);
            let down = ImpermanentLossEstimator::loss_fraction(-x);
            assert!((up - down).abs() < 1e-4, "x={} up={} down={}", x, up, down);
            assert!(ImpermanentLossEstimator::estimate(x).value().abs_diff(ImpermanentLossEstimator::estimate(-x).value()) <= 1);
        }
    }

    #[test]
    fn test_total_wipeout_is_guarded() {
        assert_eq!(ImpermanentLossEstimator::estimate(-100.0), BasisPoints::ZERO);
        assert_eq!(ImpermanentLossEstimator::estimate(-150.0), BasisPoints::ZERO);
        assert_eq!(ImpermanentLossEstimator::estimate(f64::NAN), BasisPoints::ZERO);
    }
}
