//! bot-guard
//!
//! Runs newline-delimited JSON events from stdin through the admission-control
//! layer and prints one JSON verdict per line on stdout.
//!
//! # Architecture Overview
//!
//! ```text
//!     stdin (JSON lines)
//!         │
//!         ▼
//!   ┌──────────────┐   duplicate    ┌──────────────────┐
//!   │  EventGate   │───────────────▶│ {"verdict":      │
//!   │ (callback    │                │  "duplicate"}    │
//!   │  dedup)      │                └──────────────────┘
//!   └──────┬───────┘
//!          ▼
//!   ┌──────────────┐   denial       ┌──────────────────┐
//!   │  Security    │───────────────▶│ {"verdict":      │
//!   │  Middleware  │                │  "rejected"}     │
//!   └──────┬───────┘                └──────────────────┘
//!          ▼
//!   {"verdict":"admitted", "output": <SecurityDecision>}
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use bot_guard::config::{load_config, GuardConfig};
use bot_guard::lifecycle::signals::shutdown_signal;
use bot_guard::observability::{logging, metrics};
use bot_guard::security::SecurityDecision;
use bot_guard::{Dispatch, Guard, InboundEvent, Shutdown};

#[derive(Parser)]
#[command(name = "bot-guard")]
#[command(about = "Admission control for chat-bot events", long_about = None)]
struct Cli {
    /// Path to a TOML config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process stdin, then print security and dedup stats
    Stats,
}

#[derive(Serialize)]
struct Verdict {
    event_id: String,
    #[serde(flatten)]
    dispatch: Dispatch<Option<SecurityDecision>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("bot-guard v{} starting", env!("CARGO_PKG_VERSION"));

    let guard = Guard::new(config)?;

    let observability = &guard.config().observability;
    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    guard.start_sweeps()?;

    let shutdown = Arc::new(Shutdown::new());
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.trigger();
    });

    let processed = run(&guard, &shutdown).await;
    guard.shutdown();
    let processed = processed?;

    if let Some(Commands::Stats) = cli.command {
        let stats = serde_json::json!({
            "security": guard.middleware().get_security_stats(),
            "dedup": guard.dedup().get_stats(),
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    tracing::info!(processed, "Shutdown complete");
    Ok(())
}

async fn run(guard: &Guard, shutdown: &Shutdown) -> Result<usize, Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut shutdown_rx = shutdown.subscribe();
    let mut processed = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("End of input");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let event: InboundEvent = match serde_json::from_str(&line) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping malformed event");
                        continue;
                    }
                };

                let verdict = process(guard, event).await;
                let mut out = serde_json::to_vec(&verdict)?;
                out.push(b'\n');
                stdout.write_all(&out).await?;
                processed += 1;
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    stdout.flush().await?;
    Ok(processed)
}

async fn process(guard: &Guard, event: InboundEvent) -> Verdict {
    let event_id = event.id.clone();
    let dispatch = guard
        .gate()
        .dispatch(event, |event| async move { event.context.security })
        .await;

    let message = match &dispatch {
        Dispatch::Rejected { error } => Some(error.user_message()),
        _ => None,
    };

    Verdict {
        event_id,
        dispatch,
        message,
    }
}
