use clap::Parser;
use eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod chain;
mod config;
mod metadata;
mod notify;
mod watcher;

use chain::{ChainReader, ChainReaderConfig, MarketClient};
use config::WatcherConfig;
use metadata::{GatewayClient, MetadataResolver, SubgraphClient};
use notify::{MessageTemplates, TelegramNotifier};
use watcher::{CursorStore, Watcher, WatcherLoopConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "./configs/watcher.json")]
    config_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Curate watcher");

    // Load configuration
    let config_path = PathBuf::from(&cli.config_path);
    let config = if config_path.exists() {
        WatcherConfig::load_from_file(&config_path).await?
    } else {
        tracing::warn!(path = %config_path.display(), "Config file not found, using defaults");
        WatcherConfig::default()
    };
    let config = config.with_env_overrides().normalized();

    // The bot token is env-only, never part of the config file
    let token = std::env::var("TELEGRAM_BOT_TOKEN")
        .map_err(|_| eyre::eyre!("TELEGRAM_BOT_TOKEN environment variable is required"))?;

    if config.telegram.chat_id.is_empty() {
        eyre::bail!("Telegram chat id is required (config or TELEGRAM_CHAT_ID)");
    }

    let registry_address = config
        .chain
        .registry_address
        .parse()
        .map_err(|_| eyre::eyre!("Invalid registry address: {}", config.chain.registry_address))?;

    tracing::info!(
        rpc = %config.chain.rpc_url,
        registry = %config.chain.registry_address,
        chat = %config.telegram.chat_id,
        poll_secs = config.polling.interval_secs,
        "Config loaded"
    );

    let reader = ChainReader::new(ChainReaderConfig {
        rpc_url: config.chain.rpc_url.clone(),
        registry_address,
        batch_size: config.polling.batch_size,
    });

    let gateway = GatewayClient::new(
        config.metadata.gateway_url.clone(),
        config.metadata.gateway_timeout_secs,
    );
    let market_client = MarketClient::new(config.chain.rpc_url.clone());
    let subgraph = config
        .metadata
        .subgraph_url
        .clone()
        .map(|url| SubgraphClient::new(url, config.metadata.gateway_timeout_secs));
    if subgraph.is_none() {
        tracing::info!("No subgraph endpoint configured, dispute lookups degrade to Curate links");
    }
    let resolver = MetadataResolver::new(gateway, market_client, subgraph);

    let notifier = TelegramNotifier::new(
        token,
        config.telegram.chat_id.clone(),
        config.telegram.timeout_secs,
    );
    let templates = MessageTemplates {
        explorer_tx_url: config.telegram.explorer_tx_url.clone(),
        seer_market_url: config.telegram.seer_market_url.clone(),
        curate_registry_url: config.telegram.curate_url.clone(),
    };

    let cursor_store = CursorStore::new(config.cursor_path.clone());

    let watcher = Watcher::new(
        reader,
        resolver,
        notifier,
        templates,
        cursor_store,
        WatcherLoopConfig {
            confirmations: config.chain.confirmations,
            poll_interval_secs: config.polling.interval_secs,
            batch_size: config.polling.batch_size,
            start_block: config.chain.start_block,
        },
    );

    let cancel_token = watcher.cancel_token();

    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watcher.run().await {
            tracing::error!(error = %e, "Watcher loop error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    cancel_token.cancel();
    let _ = watcher_handle.await;

    tracing::info!("Watcher stopped");
    Ok(())
}
