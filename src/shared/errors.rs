//! Error handling for the application

use thiserror::Error;

/// Chain Reader errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Chain request failed: {0}")]
    Unavailable(String),

    #[error("Not found on chain: {0}")]
    NotFound(String),

    #[error("Capability not supported by reader: {0}")]
    Unsupported(&'static str),

    #[error("Invalid chain response: {0}")]
    InvalidResponse(String),
}

/// Risk engine errors surfaced through the Risk Query interface.
///
/// Insufficient data is deliberately absent: estimators resolve it to their
/// documented defaults instead of failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Computation fault: {0}")]
    ComputeFault(String),
}

impl RiskError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RiskError::NotFound(_))
    }
}

/// Address and key parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Invalid fixed-point amount: {0}")]
    InvalidAmount(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Risk error: {0}")]
    RiskError(#[from] RiskError),

    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<ChainError> for RiskError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NotFound(what) => RiskError::NotFound(what),
            other => RiskError::UpstreamUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_not_found_stays_distinct() {
        let err: RiskError = ChainError::NotFound("pool 7".to_string()).into();
        assert_eq!(err, RiskError::NotFound("pool 7".to_string()));
        assert!(err.is_not_found());

        let err: RiskError = ChainError::Unavailable("timeout".to_string()).into();
        assert!(matches!(err, RiskError::UpstreamUnavailable(_)));
    }
}
