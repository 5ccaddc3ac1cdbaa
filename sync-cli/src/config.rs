//! Engine configuration lookup for the CLI.

use anyhow::{Context, Result};
use facesync_client::EngineConfig;
use std::path::Path;

/// File looked up in the data directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "facesync.toml";

/// Load the engine configuration.
///
/// An explicit path must exist. Without one, `<data_dir>/facesync.toml` is
/// used if present, otherwise the built-in defaults.
pub fn load(data_dir: &Path, explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = data_dir.join(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                tracing::debug!("No config file, using defaults");
                return Ok(EngineConfig::default());
            }
            candidate
        }
    };

    let config = EngineConfig::from_file(&path)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
