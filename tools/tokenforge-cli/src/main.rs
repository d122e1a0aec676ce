//! TokenForge CLI — Command-line interface for composing and exporting tokens.
//!
//! Usage:
//!   tokenforge compose [OPTIONS]   Composite layers and export a still PNG
//!   tokenforge clip [OPTIONS]      Composite layers and capture an animated WebM
//!   tokenforge probe <PATH>        Show media information
//!   tokenforge check               Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tokenforge",
    about = "Layered token compositing with still and animated export",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite layers and export a still PNG
    Compose {
        /// Background media (image or video)
        #[arg(short, long)]
        background: Option<PathBuf>,

        /// Frame media drawn over the background
        #[arg(short, long)]
        frame: Option<PathBuf>,

        /// Overlay media drawn on top
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Output directory (default from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render surface size in pixels (square; default from config)
        #[arg(long)]
        size: Option<u32>,

        /// Cut the background to a square instead of a circle
        #[arg(long)]
        square: bool,

        /// Mask scale relative to the canvas (default from config)
        #[arg(long)]
        mask_scale: Option<f64>,

        /// Per-layer transform: <layer>=<scale>,<dx>,<dy> (repeatable)
        #[arg(long = "transform", value_name = "SPEC")]
        transforms: Vec<String>,
    },

    /// Composite layers and capture an animated WebM
    Clip {
        /// Background media (image or video)
        #[arg(short, long)]
        background: Option<PathBuf>,

        /// Frame media drawn over the background
        #[arg(short, long)]
        frame: Option<PathBuf>,

        /// Overlay media drawn on top
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Output directory (default from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render surface size in pixels (square; default from config)
        #[arg(long)]
        size: Option<u32>,

        /// Cut the background to a square instead of a circle
        #[arg(long)]
        square: bool,

        /// Mask scale relative to the canvas (default from config)
        #[arg(long)]
        mask_scale: Option<f64>,

        /// Per-layer transform: <layer>=<scale>,<dx>,<dy> (repeatable)
        #[arg(long = "transform", value_name = "SPEC")]
        transforms: Vec<String>,
    },

    /// Show media information
    Probe {
        /// Path to an image or video file
        path: PathBuf,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tokenforge_common::logging::init_logging(&tokenforge_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Compose {
            background,
            frame,
            overlay,
            output,
            size,
            square,
            mask_scale,
            transforms,
        } => commands::compose::run(
            background, frame, overlay, output, size, square, mask_scale, transforms,
        ),
        Commands::Clip {
            background,
            frame,
            overlay,
            output,
            size,
            square,
            mask_scale,
            transforms,
        } => {
            commands::clip::run(
                background, frame, overlay, output, size, square, mask_scale, transforms,
            )
            .await
        }
        Commands::Probe { path } => commands::probe::run(path),
        Commands::Check => commands::check::run(),
    }
}
