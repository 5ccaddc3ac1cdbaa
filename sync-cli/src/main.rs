//! # facesync
//!
//! CLI tool for editing watch-face settings and syncing them to a renderer.
//!
//! Both devices live in the data directory: the editor and renderer stores
//! are separate JSON files, linked by an in-process channel for the duration
//! of a command.
//!
//! ## Commands
//!
//! - `settings`: List every setting with its type, path and default
//! - `show`: Print a device's current values
//! - `set`: Edit a setting and sync it to the renderer
//! - `set-image`: Use an image file as the background
//!
//! ## Example
//!
//! ```bash
//! # Set a white text color
//! facesync set text_color '#FFFFFF'
//!
//! # Use a photo as the background
//! facesync set-image ~/Pictures/sunset.png
//!
//! # Check what the renderer applied
//! facesync show --device renderer
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{set, settings, show};

/// CLI tool for editing and syncing watch-face settings.
#[derive(Parser, Debug)]
#[command(name = "facesync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory holding the device stores and the background image
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Engine configuration file (default: <data-dir>/facesync.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Which device's store to read.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    /// The phone-side editor
    Editor,
    /// The watch-side renderer
    Renderer,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every setting
    Settings,

    /// Show a device's current values
    Show {
        /// Device to show
        #[arg(long, short, value_enum, default_value = "renderer")]
        device: Device,
    },

    /// Edit a setting and sync it
    Set {
        /// Setting name (see `facesync settings`)
        name: String,

        /// New value (colors accept #RRGGBB, #AARRGGBB or 0x...)
        value: String,
    },

    /// Use an image file as the background
    SetImage {
        /// Image file to upload
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let engine = config::load(&data_dir, cli.config.as_deref())?;

    match cli.command {
        Commands::Settings => {
            settings::run();
        }
        Commands::Show { device } => {
            show::run(&data_dir, &engine, device)?;
        }
        Commands::Set { name, value } => {
            set::run_value(&data_dir, &engine, &name, &value).await?;
        }
        Commands::SetImage { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            set::run_image(&data_dir, &engine, &bytes).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for facesync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "facesync", "facesync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
