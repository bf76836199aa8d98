use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sk_events::{EventBody, EventBus};
use sk_runtime::{Control, Registry};
use sk_store::FsPersistenceAdapter;

#[derive(Parser)]
#[command(name = "sk")]
#[command(about = "Signal-kernel control surface CLI", long_about = None)]
struct Cli {
    /// Layered config files, merge order base -> overrides.
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Directory the filesystem persistence adapter reads/writes slots from.
    #[arg(long = "store-dir", global = true, default_value = "./sk-store-data")]
    store_dir: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[command(subcommand)]
        cmd: RunCmd,
    },
    /// Cooperative stop of a live run for (symbol, strategy).
    Stop {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        strategy: String,
    },
    /// Cancel a scheduled (or, if configured, active) signal outright.
    Cancel {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        exchange: String,
        #[arg(long = "cancellation-id")]
        cancellation_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum RunCmd {
    Backtest {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        exchange: String,
        #[arg(long)]
        frame: String,
    },
    Live {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        exchange: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_paths: Vec<&str> = cli.config_paths.iter().map(String::as_str).collect();
    let loaded = sk_config::load_layered(&config_paths).context("loading layered config")?;
    tracing::info!(config_hash = %loaded.config_hash, "config loaded");

    let adapter: Arc<dyn sk_store::PersistenceAdapter> = Arc::new(FsPersistenceAdapter::new(cli.store_dir.clone()));
    let registry = Registry::new(adapter);
    // An embedder links its own Strategy/ExchangeAdapter/Risk implementations
    // into a binary built on sk-runtime and registers them here before calling
    // into this CLI's dispatch logic; this skeleton has nothing of its own to
    // register, so any `run`/`cancel` below reports `NotRegistered` until one is.
    let events = EventBus::new();
    let control = Arc::new(Control::new(registry, events, loaded.settings.lifecycle_config(), loaded.settings.live_config()));

    print_events(&control);

    match cli.cmd {
        Commands::Run { cmd } => match cmd {
            RunCmd::Backtest { symbol, strategy, exchange, frame } => {
                let report = control.run_backtest(&symbol, &strategy, &exchange, &frame).await?;
                println!("processed={} total={} results={}", report.processed, report.total, report.results.len());
            }
            RunCmd::Live { symbol, strategy, exchange } => {
                control.run_live(&symbol, &strategy, &exchange, |_result| {}).await?;
            }
        },
        Commands::Stop { symbol, strategy } => {
            control.stop(&symbol, &strategy).await;
            println!("stop requested for {strategy}/{symbol}");
        }
        Commands::Cancel { symbol, strategy, exchange, cancellation_id } => {
            let cancelled = control.cancel(&symbol, &strategy, &exchange, cancellation_id).await?;
            println!("cancelled={}", cancelled.is_some());
        }
    }

    Ok(())
}

/// Subscribes to the bus and prints `signal`/`error` events as they arrive,
/// per §4.9.1 — a background task so it never blocks the dispatched command.
fn print_events(control: &Arc<Control>) {
    let mut receiver = control.events().subscribe();
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match &event.body {
                EventBody::Signal { signal } | EventBody::SignalBacktest { signal } | EventBody::SignalLive { signal } => {
                    println!("[signal] {}/{} {}", event.strategy_name, event.symbol, signal.state_name());
                }
                EventBody::Error { message } => {
                    eprintln!("[error] {}/{} {message}", event.strategy_name, event.symbol);
                }
                _ => {}
            }
        }
    });
}
