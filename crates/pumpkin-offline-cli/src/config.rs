//! Host configuration.
//!
//! Stored at `~/.config/pumpkin-offline/config.json`. Every field has a
//! default, so a missing file or missing keys are fine. The origin can be
//! overridden with `PUMPKIN_OFFLINE_ORIGIN` (a `.env` file works too).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "pumpkin-offline";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `origin`
pub const ORIGIN_ENV: &str = "PUMPKIN_OFFLINE_ORIGIN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the game is served from, e.g. `http://localhost:8080`
    pub origin: String,
    /// Path of the game under the origin
    pub scope: String,
    /// Store location; defaults to the platform cache directory
    pub cache_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    /// Extra install attempts after the first one fails
    pub install_retries: u32,
    /// Also write logs to a daily file in this directory
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            scope: "/play/pumpkin-game/".to_string(),
            cache_dir: None,
            request_timeout_secs: pumpkin_offline_core::network::client::DEFAULT_TIMEOUT_SECS,
            install_retries: 3,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.with_origin_override(std::env::var(ORIGIN_ENV).ok()))
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn with_origin_override(mut self, origin: Option<String>) -> Self {
        if let Some(origin) = origin.filter(|o| !o.trim().is_empty()) {
            self.origin = origin.trim().to_string();
        }
        self
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Absolute URL of the game directory.
    pub fn scope_url(&self) -> Result<Url> {
        let origin = Url::parse(&self.origin)
            .with_context(|| format!("Invalid origin: {}", self.origin))?;
        origin
            .join(&self.scope)
            .with_context(|| format!("Invalid scope: {}", self.scope))
    }
}
