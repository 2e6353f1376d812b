//! Teslemetry CLI - Command-line tool for vehicle telemetry streaming
//!
//! Watches live telemetry and manages which signals a vehicle streams.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use teslemetry_stream::TeslemetryStream;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, MergedConfig, Overrides};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "teslemetry")]
#[command(author, version, about = "Teslemetry vehicle telemetry CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Access token
    #[arg(short, long, env = "TESLEMETRY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Vehicle identification number
    #[arg(long, env = "TESLEMETRY_VIN")]
    vin: Option<String>,

    /// Streaming server (discovered from the token's region when absent)
    #[arg(short, long, env = "TESLEMETRY_SERVER")]
    server: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "TESLEMETRY_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream telemetry in real-time (all events when no signal is given)
    Monitor {
        /// Signal name(s) to monitor
        signals: Vec<String>,

        /// Enable the signals at this interval in seconds first
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Enable a signal on the vehicle
    AddField {
        /// Signal name
        signal: String,

        /// Reporting interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show the vehicle's streaming configuration
    Config {
        /// Replace the configuration with this JSON document
        #[arg(long, value_name = "FILE")]
        replace: Option<PathBuf>,
    },

    /// List known signals
    Signals {
        /// Only signals whose name contains this text
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(Overrides {
        token: cli.token.as_deref(),
        vin: cli.vin.as_deref(),
        server: cli.server.as_deref(),
        output: cli.output.map(OutputFormat::as_str),
        no_color: cli.no_color,
    });

    let format = OutputFormat::from_str(&merged.output, true)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Invalid output format: {}", merged.output))?;
    let ctx = OutputContext::new(format, merged.no_color, cli.quiet);

    // Execute command
    match &cli.command {
        Commands::Monitor { signals, interval } => {
            let stream = create_stream(&merged)?;
            commands::monitor(&stream, signals, *interval, &ctx).await?;
        }

        Commands::AddField { signal, interval } => {
            let stream = create_stream(&merged)?;
            commands::add_field(&stream, signal, *interval, &ctx).await?;
        }

        Commands::Config { replace } => {
            let stream = create_stream(&merged)?;
            match replace {
                Some(path) => commands::replace_config(&stream, path, &ctx).await?,
                None => commands::show_config(&stream, &ctx).await?,
            }
        }

        Commands::Signals { filter } => {
            commands::signals(filter.as_deref(), &ctx);
        }
    }

    Ok(())
}

/// Create a stream client from the merged configuration
fn create_stream(merged: &MergedConfig) -> Result<TeslemetryStream> {
    let config = merged.stream_config()?;
    TeslemetryStream::new(config).context("Failed to create stream client")
}
