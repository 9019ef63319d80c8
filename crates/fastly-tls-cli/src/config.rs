//! CLI configuration
//!
//! Stores a default API key and API URI in ~/.fastly-tls/config.json.
//! Command-line flags and environment variables take precedence over the
//! stored values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use fastly_tls_api::DEFAULT_BASE_URI;

/// Where to obtain an API key when none is configured
pub const ADDON_INSTALL_URL: &str = "https://elements.heroku.com/addons/fastly";

/// Configuration errors reported before any network activity
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "config var FASTLY_API_KEY not found! The Fastly add-on is required to configure TLS. Install Fastly at {}",
        ADDON_INSTALL_URL
    )]
    MissingApiKey,
}

/// Stored CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastlyTlsConfig {
    /// Default Fastly API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Default API base URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_uri: Option<String>,
}

impl FastlyTlsConfig {
    /// API key from `flag` (flag or environment), falling back to the stored one
    ///
    /// Blank keys count as missing.
    pub fn resolve_api_key(&self, flag: Option<&str>) -> Result<String, ConfigError> {
        flag.or(self.api_key.as_deref())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or(ConfigError::MissingApiKey)
    }

    /// API URI from `flag`, then the stored one, then the public endpoint
    pub fn resolve_api_uri(&self, flag: Option<&str>) -> String {
        flag.or(self.api_uri.as_deref())
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .unwrap_or(DEFAULT_BASE_URI)
            .to_string()
    }
}

/// Configuration manager
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default config file in the home directory
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(Self::at(home.join(".fastly-tls").join("config.json")))
    }

    /// Manager for an explicit config file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration from disk
    pub fn load(&self) -> Result<FastlyTlsConfig> {
        // Return default config if file doesn't exist
        if !self.path.exists() {
            return Ok(FastlyTlsConfig::default());
        }

        let json = fs::read_to_string(&self.path)
            .context(format!("Failed to read config file: {:?}", self.path))?;

        let config: FastlyTlsConfig = serde_json::from_str(&json)
            .context(format!("Failed to parse config file: {:?}", self.path))?;

        Ok(config)
    }

    /// Load the stored configuration for resolving against `api_key`
    ///
    /// When a non-blank key was given on the command line the stored file is
    /// optional; an unreadable file is skipped instead of aborting.
    pub fn load_for(&self, api_key: Option<&str>) -> Result<FastlyTlsConfig> {
        let has_key = api_key.is_some_and(|key| !key.trim().is_empty());
        match self.load() {
            Ok(config) => Ok(config),
            Err(e) if has_key => {
                warn!(error = %format!("{:#}", e), "Ignoring unreadable config file");
                Ok(FastlyTlsConfig::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Save the configuration to disk
    pub fn save(&self, config: &FastlyTlsConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.path, json)
            .context(format!("Failed to write config file: {:?}", self.path))?;

        Ok(())
    }

    pub fn set_api_key(&self, api_key: String) -> Result<()> {
        let mut config = self.load()?;
        config.api_key = Some(api_key);
        self.save(&config)
    }

    pub fn get_api_key(&self) -> Result<Option<String>> {
        Ok(self.load()?.api_key)
    }

    pub fn clear_api_key(&self) -> Result<()> {
        let mut config = self.load()?;
        config.api_key = None;
        self.save(&config)
    }
}
