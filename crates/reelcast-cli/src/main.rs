//! Reelcast CLI - Catalog client and headless playback probe
//!
//! Features:
//! - List on-demand videos and live streams
//! - Upload a video for server-side HLS conversion
//! - Resolve manifest URLs
//! - Drive a headless playback session and report its status changes

use clap::{Parser, Subcommand};
use reelcast_core::{EngineConfig, PlayerConfig};
use std::path::PathBuf;

mod commands;
mod output;

/// Reelcast CLI - Video catalog and playback toolkit
#[derive(Parser)]
#[command(name = "reelcast")]
#[command(version)]
#[command(about = "Browse, upload and probe VOD and live HLS streams", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// API base address (overrides REELCAST_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available videos and live streams
    List,

    /// Upload a video file for HLS conversion
    Upload {
        /// Video file to upload
        file: PathBuf,

        /// Play the uploaded video once processing completes
        #[arg(long)]
        play: bool,

        /// Give up playing after this many seconds
        #[arg(short, long, default_value = "30")]
        timeout: u64,
    },

    /// Print the manifest URL for a video or live stream
    Resolve {
        /// Video or stream identifier
        id: String,

        /// Treat the identifier as a live stream
        #[arg(short, long)]
        live: bool,
    },

    /// Run a headless playback session until it plays or fails
    Play {
        /// Video or stream identifier
        id: String,

        /// Treat the identifier as a live stream
        #[arg(short, long)]
        live: bool,

        /// Give up after this many seconds
        #[arg(short, long, default_value = "30")]
        timeout: u64,

        /// Keep following events after playback starts
        #[arg(long)]
        follow: bool,

        /// Use the low-latency engine preset (live playlists start at the live edge)
        #[arg(long)]
        low_latency: bool,
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
    reelcast_core::init();

    let mut config = PlayerConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }

    match cli.command {
        Commands::List => {
            commands::list(&config, &cli.format).await?;
        }
        Commands::Upload { file, play, timeout } => {
            commands::upload(&config, &file, play, timeout, &cli.format).await?;
        }
        Commands::Resolve { id, live } => {
            commands::resolve(&config, &id, live, &cli.format)?;
        }
        Commands::Play { id, live, timeout, follow, low_latency } => {
            if low_latency {
                config.engine = EngineConfig::low_latency();
            }
            let ok = commands::play(&config, &id, live, timeout, follow, &cli.format).await?;
            if !ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
