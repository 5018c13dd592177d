//! Recommendation domain - hedging strategies and risk guidance

mod engine;
mod strategy;

pub use engine::RecommendationEngine;
pub use strategy::{select_strategy, Strategy};

use serde::{Deserialize, Serialize};

use crate::shared::types::Wad;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationKind {
    Critical,
    Warning,
    Hedging,
    Volatility,
    Correlation,
    Liquidity,
    Maintain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HedgeDirection {
    IncreaseHedge,
    ReduceHedge,
    Maintain,
}

/// Structured part of a hedge-ratio recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HedgeAdjustment {
    pub direction: HedgeDirection,
    pub strategy_id: u64,
    /// Percent of deposits currently hedged
    pub current_ratio: f64,
    /// Percent of deposits the matched strategy targets
    pub target_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<Wad>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: String,
    pub suggested_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hedge: Option<HedgeAdjustment>,
}

impl Recommendation {
    pub fn new(kind: RecommendationKind, priority: Priority, message: impl Into<String>) -> Self {
        Self {
            kind,
            priority,
            message: message.into(),
            suggested_actions: Vec::new(),
            hedge: None,
        }
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggested_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hedge(mut self, hedge: HedgeAdjustment) -> Self {
        self.hedge = Some(hedge);
        self
    }

    pub fn hedge_direction(&self) -> Option<HedgeDirection> {
        self.hedge.as_ref().map(|h| h.direction)
    }
}
