//! Engine configuration.
//!
//! Configuration is loaded from a TOML file (default: `facesync.toml` in the
//! data directory). Every section and field is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for the sync engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Local store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Asset transfer configuration.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Change listener configuration.
    #[serde(default)]
    pub listener: ListenerConfig,
}

/// Local store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Editor store file, relative to the data directory (default: editor.json).
    #[serde(default = "default_editor_file")]
    pub editor_file: PathBuf,
    /// Renderer store file, relative to the data directory (default: renderer.json).
    #[serde(default = "default_renderer_file")]
    pub renderer_file: PathBuf,
}

/// Asset transfer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Deadline in milliseconds for connecting and for streaming (default: 5000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Local file for the background image (default: background_image.png).
    #[serde(default = "default_asset_file")]
    pub asset_file: PathBuf,
}

/// Change listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    /// Capacity of the queue between ingestion and application (default: 64).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

// Default value functions
fn default_editor_file() -> PathBuf {
    PathBuf::from("editor.json")
}

fn default_renderer_file() -> PathBuf {
    PathBuf::from("renderer.json")
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_asset_file() -> PathBuf {
    PathBuf::from("background_image.png")
}

fn default_queue_capacity() -> usize {
    crate::listener::DEFAULT_QUEUE_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            editor_file: default_editor_file(),
            renderer_file: default_renderer_file(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            asset_file: default_asset_file(),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl TransferConfig {
    /// Deadline as a duration.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Editor store path under `data_dir`.
    pub fn editor_store(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.store.editor_file)
    }

    /// Renderer store path under `data_dir`.
    pub fn renderer_store(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.store.renderer_file)
    }

    /// Background image path under `data_dir`.
    pub fn asset_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.transfer.asset_file)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
