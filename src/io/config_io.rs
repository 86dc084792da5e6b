use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

/// Name of the application config inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Error type for application config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("could not serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolve the data directory: `$TASK_CHAMPION_DIR`, then
/// `$XDG_DATA_HOME/task-champion`, then `~/.local/share/task-champion`.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TASK_CHAMPION_DIR") {
        return PathBuf::from(dir);
    }
    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"));
    data_home.join("task-champion")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read config.toml from the data directory. A missing file yields the
/// defaults; a malformed one is an error.
pub fn read_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}

/// Write config.toml into the data directory.
pub fn write_config(data_dir: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let content = toml::to_string_pretty(config)?;
    crate::io::atomic_write(&path, content.as_bytes())
        .map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Absolute path of the task store file
pub fn store_path(data_dir: &Path, config: &AppConfig) -> PathBuf {
    data_dir.join(&config.store)
}

/// Absolute path of the XP multiplier file
pub fn xp_config_path(data_dir: &Path, config: &AppConfig) -> PathBuf {
    data_dir.join(&config.xp_config)
}
