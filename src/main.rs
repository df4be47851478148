//! Trade Flow - Main Entry Point
//!
//! Subscribes to the configured symbols on the Huobi trade feed and runs one
//! aggregation pipeline per symbol until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use trade_flow::config::load_config;
use trade_flow::persistence::{connect_pool, PgSectionStore, SectionStore};
use trade_flow::{HuobiTradeSource, PipelineRegistry};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error), overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Subscriptions as "symbol:client_id,symbol:client_id", overrides the config file
    #[arg(long, env = "SUBSCRIBES")]
    subscribes: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let config = load_config(Some(&args.config), args.subscribes.as_deref())
        .context("failed to load configuration")?;

    // Initialize logging
    let log_level = args.log_level.unwrap_or_else(|| config.settings.log_level.clone());
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting trade flow aggregation");
    info!("Configuration file: {}", args.config);

    let subscriptions = config.subscriptions()?;
    let pool = match &config.database {
        Some(database) => Some(connect_pool(database).await?),
        None => {
            warn!("No database configured, sections will not be recorded");
            None
        }
    };

    let source = HuobiTradeSource::from_config(&config);
    let registry = PipelineRegistry::new();

    for subscription in &subscriptions {
        let store: Option<Arc<dyn SectionStore>> = match &pool {
            Some(pool) => {
                let store = PgSectionStore::with_pool(pool.clone(), &subscription.symbol)?;
                store.migrate().await?;
                Some(Arc::new(store))
            }
            None => None,
        };
        registry
            .launch(&config, subscription, &source, store)
            .await
            .with_context(|| format!("failed to start pipeline for {}", subscription.symbol))?;
    }

    info!(symbols = ?registry.symbols(), "Application initialized successfully");

    // Keep the application running
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, cleaning up...");

    registry.shutdown_all().await;
    if let Some(pool) = pool {
        pool.close().await;
    }

    Ok(())
}
