//! CLI configuration, read from an optional YAML file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use session::SessionConfig;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database holding the save.
    pub database_url: String,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_filter: String,
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: persistence::default_sqlite_url().to_string(),
            log_filter: "info".to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}
