use std::fs;
use std::io;
use std::path::Path;

use crate::model::config::XpConfig;

/// Load the XP multiplier tables.
///
/// A missing or malformed file yields `XpConfig::default()`; the failure is
/// logged and never returned.
pub fn load_config(path: &Path) -> XpConfig {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no xp config, using defaults");
            return XpConfig::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read xp config, using defaults");
            return XpConfig::default();
        }
    };

    match serde_json::from_str::<XpConfig>(&text) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid xp config, using defaults");
            XpConfig::default()
        }
    }
}

/// Write the XP multiplier tables as pretty-printed JSON.
pub fn save_config(config: &XpConfig, path: &Path) -> io::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    crate::io::atomic_write(path, content.as_bytes())
}
