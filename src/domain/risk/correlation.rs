//! Pearson correlation between two return series

use tracing::debug;

use crate::shared::types::BasisPoints;

/// Price observations required on each side before correlating
pub const MIN_OBSERVATIONS_FOR_CORRELATION: usize = 10;

pub struct CorrelationEstimator;

impl CorrelationEstimator {
    /// Correlation mapped from [-1, 1] onto [0, 10000]; neutral 5000 when
    /// either side has too few observations or the statistic is undefined.
    pub fn estimate_local(
        returns_a: &[f64],
        observations_a: usize,
        returns_b: &[f64],
        observations_b: usize,
    ) -> BasisPoints {
        if observations_a < MIN_OBSERVATIONS_FOR_CORRELATION || observations_b < MIN_OBSERVATIONS_FOR_CORRELATION {
            debug!(observations_a, observations_b, "Insufficient data for correlation");
            return BasisPoints::NEUTRAL;
        }

        match Self::pearson(returns_a, returns_b) {
            Some(r) => Self::to_basis_points(r),
            None => BasisPoints::NEUTRAL,
        }
    }

    /// Pearson coefficient over the trailing `min(len)` returns of each
    /// series. Zero when either series has no variance; `None` when there is
    /// nothing to align or the result is not finite.
    pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
        let n = x.len().min(y.len());
        if n < 2 {
            return None;
        }
        let x = &x[x.len() - n..];
        let y = &y[y.len() - n..];

        let (mut sx, mut sy, mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (a, b) in x.iter().zip(y) {
            sx += a;
            sy += b;
            sxy += a * b;
            sxx += a * a;
            syy += b * b;
        }

        let nf = n as f64;
        let numerator = nf * sxy - sx * sy;
        let denominator = ((nf * sxx - sx * sx) * (nf * syy - sy * sy)).sqrt();

        if denominator == 0.0 {
            return Some(0.0);
        }
        let r = numerator / denominator;
        r.is_finite().then(|| r.clamp(-1.0, 1.0))
    }

    pub fn to_basis_points(r: f64) -> BasisPoints {
        BasisPoints::from_f64((r + 1.0) * 5_000.0)
    }
}
