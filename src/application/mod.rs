//! Application layer - use cases and services

pub mod commands;
pub mod history;
pub mod notifier;
pub mod risk_engine;
pub mod scheduler;

pub use commands::{Cli, CommandExecutor, Commands};
pub use history::RiskHistoryStore;
pub use notifier::{RiskEvent, RiskNotifier, Subscription};
pub use risk_engine::RiskEngine;
pub use scheduler::{RiskScheduler, SchedulerHandle, SweepReport};
