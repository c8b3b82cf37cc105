//! pumpkin-offline - host for the pumpkin game's offline agent.
//!
//! Precaches the game's assets from its origin into a local store and
//! answers requests cache-first, so the game keeps working without a
//! network.

mod commands;
mod config;

use std::io;
use std::path::Path;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: pumpkin-offline <command>

Commands:
  install            Precache every game asset from the origin
  fetch <path>...    Request paths through the agent (cache first)
  list               List cached entries
  manifest           Print the asset manifest
  config [--save]    Print (and optionally save) the configuration

Set RUST_LOG (e.g. RUST_LOG=debug) to control logging.";

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the log file on drop.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "pumpkin-offline.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = config::Config::load()?;
    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(origin = %config.origin, scope = %config.scope, "pumpkin-offline starting");

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("install") => commands::install(&config).await,
        Some("fetch") => commands::fetch(&config, &args[2..]).await,
        Some("list") => commands::list(&config).await,
        Some("manifest") => commands::manifest(&config),
        Some("config") => commands::show_config(&config, args[2..].iter().any(|a| a == "--save")),
        Some("-h") | Some("--help") | None => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }
}
