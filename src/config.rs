//! Configuration system
//!
//! Loads ~/.config/taxrates/config.yaml with the admin API host, the bearer
//! token, and cache tuning.

use crate::cache::CacheConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cache settings as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Seconds an entry is served without refetching
    pub stale_time_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            stale_time_secs: 300,
        }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            stale_time: Duration::from_secs(settings.stale_time_secs),
        }
    }
}

/// Admin API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Base URL of the admin API (e.g., "https://api.example.com")
    pub base_url: String,

    /// Bearer token for the Authorization header
    pub token: String,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl AdminConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            cache: CacheSettings::default(),
        }
    }

    /// Default config location: ~/.config/taxrates/config.yaml
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("taxrates");
        path.push("config.yaml");
        path
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Basic sanity checks before any request is made
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base_url must not be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Cache configuration derived from the on-disk settings
    pub fn cache_config(&self) -> CacheConfig {
        (&self.cache).into()
    }
}
