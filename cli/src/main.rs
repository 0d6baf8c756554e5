//! chainwatch CLI: run the BSC launch watchers from the terminal.
//!
//! # Commands
//! ```text
//! chainwatch flap         [--config <path>] [--ws-url <url>]
//! chainwatch four         [--config <path>] [--ws-url <url>]
//! chainwatch pancake      [--config <path>] [--ws-url <url>]
//! chainwatch run          [--config <path>] [--ws-url <url>]
//! chainwatch check-config [--config <path>]
//! chainwatch version
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use chainwatch_observability::init_tracing;
use chainwatch_pipeline::watchers::build_handlers;
use chainwatch_pipeline::{build_pipeline, WatchConfig};
use chainwatch_rpc::{Supervisor, WsConnector};
use clap::{Args, Parser, Subcommand};

const DEFAULT_CONFIG: &str = "chainwatch.yaml";

#[derive(Parser)]
#[command(
    name = "chainwatch",
    about = "Watch BSC launchpad and DEX events and post the interesting ones to Telegram",
    long_about = "
chainwatch: subscribe to contract events over a WebSocket node, decode and
enrich them, and notify a Telegram channel.

ENVIRONMENT VARIABLES:
  CHAINWATCH_WS_URL     WebSocket node URL (overrides rpc.ws_url)
  TELEGRAM_BOT_TOKEN    Bot token; without one notifications are only logged
  TELEGRAM_CHAT_ID      Default target chat
  RUST_LOG              Log filter (overrides logging.level)
",
    version
)]
struct Cli {
    /// YAML config file (default: ./chainwatch.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Charity-token launches on flap
    Flap(WatchArgs),
    /// four.meme creations and migrations
    Four(WatchArgs),
    /// New PancakeSwap V2 pairs
    Pancake(WatchArgs),
    /// Every watcher enabled in the config, on one connection
    Run(WatchArgs),
    /// Load and validate the config, then print the subscriptions
    #[command(name = "check-config")]
    CheckConfig,
    /// Print version
    Version,
}

#[derive(Args)]
struct WatchArgs {
    /// WebSocket node URL (overrides config and environment)
    #[arg(long)]
    ws_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Flap(args) => cmd_watch(config, Some("flap"), args).await,
        Commands::Four(args) => cmd_watch(config, Some("four"), args).await,
        Commands::Pancake(args) => cmd_watch(config, Some("pancake"), args).await,
        Commands::Run(args) => cmd_watch(config, None, args).await,
        Commands::CheckConfig => cmd_check_config(&config),
        Commands::Version => {
            println!("chainwatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<WatchConfig> {
    match path {
        Some(path) => Ok(WatchConfig::load(path)?),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok(WatchConfig::load(Path::new(DEFAULT_CONFIG))?),
        None => {
            let mut config = WatchConfig::default();
            config.apply_env();
            Ok(config)
        }
    }
}

async fn cmd_watch(mut config: WatchConfig, only: Option<&str>, args: WatchArgs) -> Result<()> {
    if let Some(url) = args.ws_url {
        config.rpc.ws_url = url;
    }
    if let Some(name) = only {
        config.watchers.only(&[name]);
    }
    config.validate().context("invalid configuration")?;
    init_tracing(&config.logging);

    let mut pipeline = build_pipeline(&config)?;
    let metrics = pipeline.metrics_handle();
    let connector = WsConnector::new(config.rpc.ws_url.clone(), config.ws_config());
    let mut supervisor = Supervisor::new(connector, pipeline.subscriptions(), config.reconnect_delay());
    let reconnects = supervisor.reconnects();

    let labels: Vec<String> = pipeline.subscriptions().into_iter().map(|s| s.label).collect();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        watchers = ?labels,
        "chainwatch starting"
    );

    tokio::select! {
        _ = supervisor.run(&mut pipeline) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for ctrl-c")?;
            tracing::info!("interrupted, shutting down");
        }
    }

    let m = metrics.snapshot();
    tracing::info!(
        received = m.received,
        notified = m.notified,
        suppressed = m.suppressed,
        decode_errors = m.decode_errors,
        enrichment_errors = m.enrichment_errors,
        dispatch_failures = m.dispatch_failures,
        reconnects = reconnects.load(Ordering::Relaxed),
        "final counters"
    );
    Ok(())
}

fn cmd_check_config(config: &WatchConfig) -> Result<()> {
    config.validate().context("invalid configuration")?;

    println!("Node:       {}", config.rpc.ws_url);
    println!(
        "Telegram:   {}",
        match (&config.telegram.bot_token, &config.telegram.chat_id) {
            (Some(_), Some(chat)) => format!("bot token set, default chat {chat}"),
            (Some(_), None) => "bot token set, no default chat".to_string(),
            (None, _) => "not configured (notifications are logged)".to_string(),
        }
    );
    println!("Dedup:      {}", match config.pipeline.dedup_capacity {
        0 => "off".to_string(),
        n => format!("last {n} logs"),
    });
    println!("\nSubscriptions:");
    for handler in build_handlers(config) {
        let sub = handler.subscription();
        println!("  {:<8} {}", sub.label, serde_json::to_string(&sub.params())?);
    }
    Ok(())
}
