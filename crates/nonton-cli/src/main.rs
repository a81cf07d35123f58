//! Nonton CLI - headless probe for the playback session
//!
//! Features:
//! - Delivery mode selection for a URL and capability set
//! - Quality ladder of an HLS master playlist
//! - Scripted session replays against the in-memory platform

use clap::{Parser, Subcommand};
use nonton_core::EngineConfig;
use std::path::PathBuf;

mod commands;
mod output;
mod script;

/// Nonton CLI - playback session toolkit
#[derive(Parser)]
#[command(name = "nonton-cli")]
#[command(version)]
#[command(about = "Probe delivery modes, quality levels and session behaviour", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which delivery mode a session would pick
    Mode {
        /// Media URL
        url: String,

        /// Pretend hls.js is not available
        #[arg(long)]
        no_engine: bool,

        /// Pretend the browser plays HLS natively
        #[arg(long)]
        native: bool,
    },

    /// List the quality levels of an HLS master playlist
    Levels {
        /// URL or path to the playlist
        playlist: String,
    },

    /// Replay scripted engine and media events against a session
    Replay {
        /// Media URL
        url: String,

        /// JSON file with the steps to replay
        script: PathBuf,

        /// Pretend hls.js is not available
        #[arg(long)]
        no_engine: bool,

        /// Pretend the browser plays HLS natively
        #[arg(long)]
        native: bool,

        /// Levels the engine reports, as a JSON array of {height, width, bitrate}
        #[arg(long)]
        levels: Option<String>,

        /// Reject every play request
        #[arg(long)]
        reject_play: bool,

        /// Engine tunables (default, vod, low-latency)
        #[arg(long, default_value = "default")]
        engine_preset: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Mode { url, no_engine, native } => {
            commands::mode(&url, no_engine, native, &cli.format)?;
        }
        Commands::Levels { playlist } => {
            commands::levels(&playlist, &cli.format).await?;
        }
        Commands::Replay { url, script, no_engine, native, levels, reject_play, engine_preset } => {
            let options = commands::ReplayOptions {
                adaptive_engine: !no_engine,
                native_adaptive: native,
                levels: levels
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()?
                    .unwrap_or_default(),
                reject_play,
                engine: EngineConfig::preset(&engine_preset)?,
            };
            commands::replay(&url, &script, &options, &cli.format).await?;
        }
    }

    Ok(())
}
