//! Magician configuration
//!
//! Located at `~/.config/magic/magician.toml`. Every value can also be given
//! on the command line, which takes precedence.

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global magician configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MagicianConfig {
    pub mutate: MutateDefaults,
    pub registry: RegistryConfig,
}

/// Defaults for `docker-credential-magician mutate`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MutateDefaults {
    /// Directory to source helper binaries from instead of the embedded set
    pub helpers_dir: Option<String>,
    /// Directory to source mapping descriptors from instead of the embedded set
    pub mappings_dir: Option<String>,
    /// Helper slugs to include (all supported helpers when empty)
    pub include: Vec<String>,
    /// User-Agent sent with registry requests
    pub user_agent: Option<String>,
    /// docker-credential-magic binary to add to images
    pub dispatcher: Option<String>,
}

/// Registry access settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registries (host[:port]) reached over plain HTTP.
    /// localhost registries are always treated as insecure.
    pub insecure: Vec<String>,
}

impl MagicianConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let path = crate::magician_config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(
            "Loaded config from {:?}: include={:?}, insecure={:?}",
            path,
            config.mutate.include,
            config.registry.insecure
        );

        Ok(config)
    }

    /// Render as TOML (used by `docker-credential-magician config`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Expand `~` in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
