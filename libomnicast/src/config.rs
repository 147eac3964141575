//! Configuration management for Omnicast
//!
//! Configuration is an immutable value constructed once at startup and passed
//! explicitly into the credential resolver and adapter factory. The on-disk
//! format is a JSON document.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::types::PlatformId;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// External secret-store process settings
    #[serde(default)]
    pub secret_store: SecretStoreConfig,

    /// Per-platform default credential fields, keyed by platform identifier.
    /// Consulted only for fields the secret store returned as empty.
    #[serde(default)]
    pub fallbacks: HashMap<String, HashMap<String, String>>,

    /// Per-platform API base URL overrides, keyed by platform identifier.
    /// Production defaults come from the platform profiles.
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretStoreConfig {
    /// Command invoked as `<command> <item> <field>`; the secret value is
    /// expected on stdout with exit code zero
    pub command: String,
}

impl Default for SecretStoreConfig {
    fn default() -> Self {
        Self {
            command: "op-field".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing config file is not an error: the defaults apply and every
    /// fallback map is empty.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = serde_json::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Fallback credential fields for a platform, if configured
    pub fn fallback_fields(&self, platform: PlatformId) -> Option<&HashMap<String, String>> {
        self.fallbacks.get(platform.as_str())
    }

    /// API base URL for a platform: config override, else the profile default
    pub fn api_base(&self, platform: PlatformId) -> Option<String> {
        self.endpoints
            .get(platform.as_str())
            .cloned()
            .or_else(|| platform.profile().api_base.map(str::to_string))
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("OMNICAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("omnicast").join("config.json"))
}
