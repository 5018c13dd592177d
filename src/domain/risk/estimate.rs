//! Two-step estimation: on-chain source first, local computation second

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shared::errors::ChainError;

/// Where an estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimateSource {
    OnChain,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate<T> {
    pub value: T,
    pub source: EstimateSource,
}

impl<T> Estimate<T> {
    pub fn on_chain(value: T) -> Self {
        Self { value, source: EstimateSource::OnChain }
    }

    pub fn local(value: T) -> Self {
        Self { value, source: EstimateSource::Local }
    }

    /// Keeps the primary value when it arrived, otherwise runs `fallback`.
    /// Unsupported oracles are the common case and are not worth a log line.
    pub fn primary_or_else<F>(what: &str, primary: Result<T, ChainError>, fallback: F) -> Self
    where
        F: FnOnce() -> T,
    {
        match primary {
            Ok(value) => Self::on_chain(value),
            Err(ChainError::Unsupported(_)) => Self::local(fallback()),
            Err(e) => {
                debug!(estimate = what, error = %e, "On-chain source failed, using local estimation");
                Self::local(fallback())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_wins() {
        let est = Estimate::primary_or_else("volatility", Ok(42u16), || 7);
        assert_eq!(est, Estimate::on_chain(42));
    }

    #[test]
    fn test_fallback_on_any_failure() {
        let est = Estimate::primary_or_else("volatility", Err(ChainError::Unavailable("boom".into())), || 7u16);
        assert_eq!(est, Estimate::local(7));
        let est = Estimate::primary_or_else("volatility", Err(ChainError::Unsupported("oracle")), || 9u16);
        assert_eq!(est.source, EstimateSource::Local);
    }
}
