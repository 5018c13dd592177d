//! Annualized volatility from a log-return series

use tracing::debug;

use crate::shared::types::BasisPoints;

const DAYS_PER_YEAR: f64 = 365.0;

pub struct VolatilityEstimator;

impl VolatilityEstimator {
    /// Population standard deviation of `returns`, annualized over 365 days.
    ///
    /// Fewer than two returns, or any non-finite intermediate, is "no signal"
    /// and resolves to zero.
    pub fn estimate_local(returns: &[f64]) -> BasisPoints {
        if returns.len() < 2 {
            debug!(returns = returns.len(), "Insufficient data for volatility");
            return BasisPoints::ZERO;
        }

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let sigma = variance.sqrt();
        let annualized_pct = sigma * DAYS_PER_YEAR.sqrt() * 100.0;

        if !annualized_pct.is_finite() {
            return BasisPoints::ZERO;
        }
        BasisPoints::from_f64(annualized_pct * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fewer_than_two_returns_is_zero() {
        assert_eq!(VolatilityEstimator::estimate_local(&[]), BasisPoints::ZERO);
        assert_eq!(VolatilityEstimator::estimate_local(&[0.25]), BasisPoints::ZERO);
    }

    #[test]
    fn test_constant_price_is_zero() {
        assert_eq!(VolatilityEstimator::estimate_local(&[0.0; 12]), BasisPoints::ZERO);
    }

    #[test]
    fn test_annualization() {
        // sigma = 0.01 -> 0.01 * sqrt(365) * 100 = 19.1049...% -> 1910bp
        let returns = [0.01, -0.01, 0.01, -0.01];
        assert_eq!(VolatilityEstimator::estimate_local(&returns).value(), 1_910);
    }

    #[test]
    fn test_caps_at_one_hundred_percent() {
        let returns = [0.5, -0.5, 0.5, -0.5];
        assert_eq!(VolatilityEstimator::estimate_local(&returns), BasisPoints::MAX);
    }

    #[test]
    fn test_nan_resolves_to_zero() {
        assert_eq!(VolatilityEstimator::estimate_local(&[f64::NAN, 0.1]), BasisPoints::ZERO);
    }
}
