//! Price analysis and calculations

use super::PriceObservation;
use crate::shared::utils::calculate_percentage_change;

/// Derives return series and price changes from observation windows
pub struct PriceAnalyzer;

impl PriceAnalyzer {
    /// Natural-log returns between consecutive observations.
    ///
    /// Steps whose prior price is zero contribute nothing; a zero current
    /// price is skipped as well since `ln(0)` has no finite value.
    pub fn log_returns<'a, I>(observations: I) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a PriceObservation>,
    {
        let mut returns = Vec::new();
        let mut prior: Option<f64> = None;

        for observation in observations {
            let price = observation.price.to_f64();
            if let Some(prev) = prior {
                if prev > 0.0 && price > 0.0 {
                    let r = (price / prev).ln();
                    if r.is_finite() {
                        returns.push(r);
                    }
                }
            }
            prior = Some(price);
        }

        returns
    }

    /// Percentage move between the first and last observation of a window
    pub fn window_change_percent(first: &PriceObservation, last: &PriceObservation) -> f64 {
        calculate_percentage_change(first.price.to_f64(), last.price.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Wad;

    fn obs(ts: u64, price: f64) -> PriceObservation {
        PriceObservation::new(ts, Wad::from_f64(price))
    }

    #[test]
    fn test_log_returns() {
        let window = vec![obs(1, 100.0), obs(2, 110.0), obs(3, 99.0)];
        let returns = PriceAnalyzer::log_returns(&window);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - (1.1f64).ln()).abs() < 1e-9);
        assert!((returns[1] - (0.9f64).ln()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_prior_price_is_skipped() {
        let window = vec![obs(1, 0.0), obs(2, 100.0), obs(3, 100.0)];
        let returns = PriceAnalyzer::log_returns(&window);
        assert_eq!(returns, vec![0.0]);
    }

    #[test]
    fn test_too_few_observations() {
        assert!(PriceAnalyzer::log_returns(&[obs(1, 100.0)]).is_empty());
        assert!(PriceAnalyzer::log_returns(Vec::<PriceObservation>::new().iter()).is_empty());
    }

    #[test]
    fn test_window_change() {
        let change = PriceAnalyzer::window_change_percent(&obs(1, 100.0), &obs(9, 125.0));
        assert!((change - 25.0).abs() < 1e-9);
    }
}
