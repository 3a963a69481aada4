// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::backends::camera::CameraSpec;
use photobooth::config::Config;
use photobooth::constants::app_info;
use photobooth::pipelines::frame::{Layout, PresetId, Rgb};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Four-shot photobooth with styled frames")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Configuration file (default: <config dir>/photobooth/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Camera for the interactive shell: auto, /dev/videoN, still:<dir>, pattern
    #[arg(long)]
    camera: Option<CameraSpec>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Run one capture session without interaction and save the frame
    Shoot {
        /// Camera: auto, /dev/videoN, still:<dir>, pattern
        #[arg(short, long)]
        camera: Option<CameraSpec>,

        /// Frame layout (2x2 or 1x4)
        #[arg(short, long, default_value = "2x2")]
        layout: Layout,

        /// Preset name (White, Black, Pink, Blue, Purple, Green)
        #[arg(short, long, conflicts_with = "color")]
        preset: Option<PresetId>,

        /// Custom base color (#rrggbb)
        #[arg(long)]
        color: Option<Rgb>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the built web client
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Bundle directory
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Open the browser once listening
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set RUST_LOG to control the level, e.g. RUST_LOG=photobooth=debug
    match &cli.command {
        // The shell owns the screen; log to a file instead
        None => init_file_logging()?,
        Some(Commands::Serve { .. }) => init_logging("info"),
        Some(_) => init_logging("warn"),
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Shoot {
            camera,
            layout,
            preset,
            color,
            output,
        }) => cli::shoot(
            &config,
            cli::ShootOptions {
                camera,
                layout,
                preset,
                color,
                output,
            },
        ),
        Some(Commands::Serve { port, dir, open }) => cli::serve(&config, port, dir, open),
        None => photobooth::terminal::run(cli::build_photobooth(&config, cli.camera)),
    }
}

fn env_filter(default: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
}

fn init_logging(default: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .with_target(true)
        .with_level(true)
        .init();
}

fn init_file_logging() -> Result<(), Box<dyn std::error::Error>> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("photobooth");
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("photobooth.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}
