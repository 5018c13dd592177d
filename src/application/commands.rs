//! CLI commands and handlers
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::risk_engine::RiskEngine;
use crate::application::scheduler::RiskScheduler;
use crate::domain::risk::RiskSnapshot;
use crate::shared::errors::AppError;
use crate::shared::types::{Address, PoolId, Timeframe};

#[derive(Parser)]
#[command(name = "riskpools")]
#[command(about = "Pool risk analysis and caching engine")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "Config.toml")]
    pub config: String,

    /// Chain gateway URL (overrides config)
    #[arg(long)]
    pub gateway_url: Option<String>,

    /// Serve the demo pools of the configuration instead of a gateway
    #[arg(long)]
    pub demo: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Risk snapshot of a pool
    Risk {
        pool_id: u64,

        /// Give up after this many milliseconds
        #[arg(short, long)]
        deadline_ms: Option<u64>,
    },

    /// Risk components over a timeframe (24h, 7d, 30d, 90d)
    History {
        pool_id: u64,

        #[arg(short, long, default_value = "24h")]
        timeframe: Timeframe,
    },

    /// Hedging recommendations for a pool
    Recommend { pool_id: u64 },

    /// Market conditions over the common pairs
    Market,

    /// Health of an account in an asset vault
    Health { user: Address, asset: Address },

    /// Run the background sweeps and print snapshot updates
    Monitor {
        /// Stop after this many seconds (runs until Ctrl-C otherwise)
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Cache statistics after a pool sweep
    Stats,
}

impl Commands {
    /// Commands that keep running and need the scheduler
    pub fn is_long_running(&self) -> bool {
        matches!(self, Commands::Monitor { .. })
    }
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, engine: RiskEngine, json: bool) -> Result<(), AppError> {
        match command {
            Commands::Risk { pool_id, deadline_ms } => {
                Self::execute_risk_command(PoolId(pool_id), deadline_ms, engine, json).await
            }
            Commands::History { pool_id, timeframe } => {
                Self::execute_history_command(PoolId(pool_id), timeframe, engine, json).await
            }
            Commands::Recommend { pool_id } => Self::execute_recommend_command(PoolId(pool_id), engine, json).await,
            Commands::Market => Self::execute_market_command(engine, json).await,
            Commands::Health { user, asset } => Self::execute_health_command(user, asset, engine, json).await,
            Commands::Monitor { duration } => Self::execute_monitor_command(duration, engine).await,
            Commands::Stats => Self::execute_stats_command(engine, json).await,
        }
    }

    async fn execute_risk_command(pool_id: PoolId, deadline_ms: Option<u64>, engine: RiskEngine, json: bool) -> Result<(), AppError> {
        info!("🔍 Analyzing pool {}...", pool_id);

        let snapshot = match deadline_ms {
            Some(ms) => engine.get_pool_risk_within(pool_id, Duration::from_millis(ms)).await?,
            None => engine.get_pool_risk(pool_id).await?,
        };

        if json {
            return print_json(&snapshot);
        }
        print_snapshot(&snapshot);
        Ok(())
    }

    async fn execute_history_command(pool_id: PoolId, timeframe: Timeframe, engine: RiskEngine, json: bool) -> Result<(), AppError> {
        let series = engine.get_pool_risk_history(pool_id, timeframe).await?;
        if json {
            return print_json(&series);
        }

        info!("📈 Pool {} risk history ({}, {} points):", pool_id, timeframe, series.len());
        for point in &series {
            info!(
                "   {}  vol {:>6}  IL {:>6}  corr {:>6}  liq {:>6}",
                point.timestamp.format("%Y-%m-%d %H:%M"),
                point.components.volatility,
                point.components.impermanent_loss,
                point.components.correlation_risk,
                point.components.liquidity_risk
            );
        }
        Ok(())
    }

    async fn execute_recommend_command(pool_id: PoolId, engine: RiskEngine, json: bool) -> Result<(), AppError> {
        let recommendations = engine.get_recommendations(pool_id).await?;
        if json {
            return print_json(&recommendations);
        }

        if recommendations.is_empty() {
            info!("✅ No recommendations for pool {}", pool_id);
            return Ok(());
        }
        info!("💡 Recommendations for pool {}:", pool_id);
        for (i, rec) in recommendations.iter().enumerate() {
            info!("   {}. [{:?}/{:?}] {}", i + 1, rec.kind, rec.priority, rec.message);
            for action in &rec.suggested_actions {
                info!("      - {}", action);
            }
        }
        Ok(())
    }

    async fn execute_market_command(engine: RiskEngine, json: bool) -> Result<(), AppError> {
        // A one-shot process starts with an empty cache
        let report = RiskScheduler::sweep_volatility(&engine).await;
        if report.failed > 0 {
            warn!("⚠️  {} common pairs could not be refreshed", report.failed);
        }

        let conditions = engine.get_market_conditions().await?;
        if json {
            return print_json(&conditions);
        }

        info!("🌐 Market conditions over {} pairs:", conditions.sample_size);
        info!("   Volatility index: {}", conditions.volatility_index);
        info!("   Correlation index: {}", conditions.correlation_index);
        info!("   Sentiment: {}", conditions.sentiment.as_str());
        info!("   {}", conditions.recommendation_text);
        Ok(())
    }

    async fn execute_health_command(user: Address, asset: Address, engine: RiskEngine, json: bool) -> Result<(), AppError> {
        let health = engine.get_account_health(user, asset).await?;
        if json {
            return print_json(&health);
        }

        info!("🏦 Account {} in {}:", user, asset);
        info!("   Collateral: {}", crate::shared::utils::format_wad(health.collateral_value));
        info!("   Liabilities: {}", crate::shared::utils::format_wad(health.liability_value));
        match health.health_factor() {
            Some(hf) if health.is_liquidatable() => warn!("   ⚠️  Health factor {:.3}: liquidatable", hf),
            Some(hf) => info!("   Health factor: {:.3}", hf),
            None => info!("   No outstanding debt"),
        }
        Ok(())
    }

    async fn execute_monitor_command(duration: Option<u64>, engine: RiskEngine) -> Result<(), AppError> {
        let mut events = engine.subscribe();
        info!("👀 Watching snapshot updates (subscription {})", events.id());

        let watch = async {
            while let Some(event) = events.next_event().await {
                match serde_json::to_string(&event) {
                    Ok(line) => info!("📣 {}", line),
                    Err(e) => warn!("Failed to encode event: {}", e),
                }
            }
        };

        match duration {
            Some(secs) => {
                info!("⏱️  Monitoring for {} seconds", secs);
                let _ = tokio::time::timeout(Duration::from_secs(secs), watch).await;
            }
            None => {
                tokio::select! {
                    _ = watch => {}
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
                }
            }
        }

        info!("✅ Monitoring finished");
        Ok(())
    }

    async fn execute_stats_command(engine: RiskEngine, json: bool) -> Result<(), AppError> {
        RiskScheduler::sweep_pools(&engine).await;
        let stats = engine.cache_stats().await;
        if json {
            return print_json(&stats);
        }

        info!("📊 Cache entries: {}", stats.count);
        for (category, count) in &stats.per_category {
            info!("   {:?}: {}", category, count);
        }
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| AppError::Unknown(format!("Failed to encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn print_snapshot(snapshot: &RiskSnapshot) {
    info!("📊 Pool {} at {}", snapshot.pool_id, snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"));
    info!("   Composite score: {} ({})", snapshot.composite_score, snapshot.level.as_str());
    info!("   Utilization: {:.2}%", snapshot.utilization);
    info!("   Hedge ratio: {:.2}%", snapshot.hedge_ratio);
    info!("   Concentration risk: {}", snapshot.concentration_risk);
    info!(
        "   Components: vol {} | IL {} | corr {} | liq {}",
        snapshot.components.volatility,
        snapshot.components.impermanent_loss,
        snapshot.components.correlation_risk,
        snapshot.components.liquidity_risk
    );
    if !snapshot.recommendations.is_empty() {
        info!("   {} recommendations (see `recommend`)", snapshot.recommendations.len());
    }
}
