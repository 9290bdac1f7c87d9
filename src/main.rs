//! # prompt-sync CLI (`psync`)
//!
//! | Command | Description |
//! |---------|-------------|
//! | `psync init` | Write a default `psync.toml` in the current directory |
//! | `psync snapshot` | Assemble the instruction payload and print it (no network) |
//! | `psync sync` | Assemble and push the payload to the assistant once |
//! | `psync watch` | Watch targets and keep the assistant in sync until interrupted |
//!
//! ## Examples
//!
//! ```bash
//! # Scaffold a config, then point it at your assistant and sources
//! psync init
//!
//! # Inspect exactly what would be sent
//! psync snapshot --config ./psync.toml
//!
//! # One-shot update
//! OPENAI_API_KEY=sk-... psync sync
//!
//! # Long-running watch loop
//! OPENAI_API_KEY=sk-... psync watch
//! ```

mod aggregate;
mod assistant;
mod coalesce;
mod config;
mod error;
mod schema;
mod snapshot;
mod sync;
mod watcher;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// prompt-sync — keep an OpenAI assistant's instructions in sync with
/// watched source files and a live database schema.
#[derive(Parser)]
#[command(
    name = "psync",
    about = "Keep an OpenAI assistant's instructions in sync with watched source files",
    version,
    long_about = "prompt-sync watches files, directories, and glob patterns, coalesces change \
    bursts through a leading-edge throttle, and rewrites an OpenAI assistant's instructions \
    with a deterministic snapshot of the watched content plus an optional MySQL/Postgres \
    schema dump."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, short = 'c', global = true, default_value = "./psync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default psync.toml in the current directory.
    ///
    /// Refuses to overwrite an existing file.
    Init,

    /// Assemble the instruction payload and print it to stdout.
    ///
    /// Reads the watched files (and the database schema, if configured)
    /// exactly as a sync cycle would, without touching the network
    /// assistant. Useful for inspecting the payload and for testing.
    Snapshot,

    /// Assemble and push the payload to the assistant once.
    Sync,

    /// Watch targets and keep the assistant updated until interrupted.
    Watch {
        /// Override watch.throttle_ms from the config file.
        #[arg(long)]
        throttle_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // init runs before config loading: it creates the config.
    if let Commands::Init = cli.command {
        if cli.config.exists() {
            anyhow::bail!("{} already exists, refusing to overwrite", cli.config.display());
        }
        std::fs::write(&cli.config, config::CONFIG_TEMPLATE)?;
        println!("Default {} created successfully.", cli.config.display());
        return Ok(());
    }

    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Snapshot => {
            let snapshot = sync::build_snapshot(&cfg).await?;
            println!("{}", snapshot.render());
        }
        Commands::Sync => {
            let client = assistant::AssistantClient::new(&cfg.assistant, &cfg.network)?;
            sync::SyncCycle::new(cfg, client).push_once().await?;
            println!("ok");
        }
        Commands::Watch { throttle_ms } => {
            if let Some(ms) = throttle_ms {
                cfg.watch.throttle_ms = ms;
                config::validate(&cfg)?;
            }
            sync::run_watch(cfg).await?;
        }
    }

    Ok(())
}
