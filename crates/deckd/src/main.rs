//! deckd entry point.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use deck::config::load_config;
use deck::DeckConfig;
use deckd::{demo, logging, Daemon};
use surface_emulator::Emulator;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "deckd")]
#[command(about = "Run the control-surface module coordinator", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,
    /// Feed a scripted input tour into the emulated surface
    #[arg(long)]
    demo: bool,
    /// Exit after this many seconds
    #[arg(long, value_name = "SECS")]
    run_for: Option<u64>,
    /// Write a PNG of the emulated surface on exit
    #[arg(long, value_name = "PATH")]
    screenshot: Option<PathBuf>,
}

fn read_config(path: Option<&PathBuf>) -> Result<DeckConfig> {
    match path {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(DeckConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = read_config(cli.config.as_ref())?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init(&config.log_filter)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        modules = config.modules.len(),
        "deckd starting"
    );

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("interrupt received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "cannot listen for ctrl-c"),
            }
        });
    }
    if let Some(secs) = cli.run_for {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::info!(secs, "run time elapsed, shutting down");
            shutdown.cancel();
        });
    }

    let emulator = Emulator::new();
    if cli.demo {
        tokio::spawn(demo::play(emulator.clone(), demo::script(), shutdown.child_token()));
    }

    let daemon = Daemon::new(emulator.clone(), config);
    daemon.run(&shutdown).await?;

    if let Some(path) = cli.screenshot {
        emulator
            .screenshot(&path)
            .with_context(|| format!("writing screenshot {}", path.display()))?;
        tracing::info!(path = %path.display(), "screenshot written");
    }
    Ok(())
}
