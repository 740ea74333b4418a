// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Holographic Memory CLI
//!
//! The `holomem` binary drives an in-process holographic memory instance.
//!
//! ## Commands
//!
//! - `holomem config show|validate|generate` - Configuration management
//! - `holomem ingest <files>` - Memorize documents, optionally query and export a snapshot
//! - `holomem dream <files>` - Ingest, dream, and report the best synthesised concepts
//! - `holomem analogy <a> <b> <c> --corpus <words>` - Solve `a:b::c:?` over a word corpus
//!
//! Each invocation builds a fresh instance; nothing persists between runs
//! except exported snapshots.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

mod commands;
mod embedded;

use commands::{AnalogyArgs, ConfigCommand, DreamArgs, IngestArgs};

/// AEGIS Holographic Memory - hyperdimensional associative memory
#[derive(Parser)]
#[command(name = "holomem")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "HOLOMEM_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "HOLOMEM_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Serve Prometheus metrics on this port while the command runs
    #[arg(long, global = true, env = "HOLOMEM_METRICS_PORT")]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Memorize documents and optionally query them
    #[command(name = "ingest")]
    Ingest(IngestArgs),

    /// Run dream mode over ingested documents
    #[command(name = "dream")]
    Dream(DreamArgs),

    /// Analogical inference over a word corpus
    #[command(name = "analogy")]
    Analogy(AnalogyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    if let Some(port) = cli.metrics_port {
        init_metrics(port)?;
    }

    match cli.command {
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Ingest(args)) => commands::ingest::execute(args, cli.config).await,
        Some(Commands::Dream(args)) => commands::dream::execute(args, cli.config).await,
        Some(Commands::Analogy(args)) => commands::analogy::execute(args, cli.config).await,
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

/// Install the Prometheus recorder with its own HTTP listener
fn init_metrics(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus metrics exporter")?;
    info!("Serving metrics on http://{}/metrics", addr);
    Ok(())
}
