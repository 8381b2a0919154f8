//! CLI command implementations.

pub mod config;
pub mod extract;
pub mod review;
pub mod run;

use std::path::{Path, PathBuf};

use docfeed_core::FeedConfig;

/// Platform location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docfeed")
        .join("config.json")
}

/// The file `--config` points at, else the platform default.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// An explicit `--config` path must exist.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FeedConfig> {
    if let Some(path) = config_path {
        return read_config(Path::new(path));
    }

    let path = default_config_path();
    if path.exists() {
        read_config(&path)
    } else {
        Ok(FeedConfig::default())
    }
}

fn read_config(path: &Path) -> anyhow::Result<FeedConfig> {
    FeedConfig::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))
}
