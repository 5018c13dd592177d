use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use riskpools::application::{Cli, CommandExecutor, RiskEngine, RiskScheduler};
use riskpools::infrastructure::chain::{ChainReader, HttpChainReader, InMemoryChainReader};
use riskpools::shared::config::{ConfigLoader, EngineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let mut config = if Path::new(&cli.config).exists() {
        ConfigLoader::load_from(&cli.config).with_context(|| format!("Failed to load {}", cli.config))?
    } else {
        warn!("⚠️  {} not found, using default configuration", cli.config);
        EngineConfig::default()
    };
    if let Some(url) = &cli.gateway_url {
        config.chain.gateway_url = url.clone();
    }

    let reader: Arc<dyn ChainReader> = if cli.demo {
        info!(
            "🧪 Demo mode: serving {} configured pools and {} price series",
            config.demo_pools.len(),
            config.demo_prices.len()
        );
        Arc::new(InMemoryChainReader::from_config(&config).await)
    } else {
        info!("🔌 Chain gateway: {}", config.chain.gateway_url);
        Arc::new(HttpChainReader::from_config(&config.chain).context("Failed to create chain reader")?)
    };

    let scheduler_cfg = config.scheduler.clone();
    let engine = RiskEngine::from_config(reader, config);

    let scheduler = if cli.command.is_long_running() {
        if scheduler_cfg.enabled {
            Some(RiskScheduler::new(engine.clone(), scheduler_cfg).start())
        } else {
            warn!("⚠️  Scheduler disabled in configuration, no background sweeps");
            None
        }
    } else {
        None
    };

    let outcome = CommandExecutor::execute(cli.command, engine, cli.json).await;

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }

    outcome.context("Command failed")?;
    Ok(())
}
