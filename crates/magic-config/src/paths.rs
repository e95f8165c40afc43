//! Runtime path resolution
//!
//! The dispatcher reads its mappings from `$DOCKER_CREDENTIAL_MAGIC_CONFIG/etc`
//! when the variable is set (images built by the magician set it to
//! `/opt/magic`), otherwise from `~/.config/magic/etc`.

use crate::constants::{
    ENV_DOCKER_ORIG_CONFIG, ENV_MAGIC_CONFIG, MAGICIAN_CONFIG_FILE_BASENAME, MAPPINGS_SUBDIR,
    XDG_CONFIG_SUBDIR,
};
use crate::{ConfigError, Result};
use directories::BaseDirs;
use std::path::PathBuf;

/// The current user's home directory
pub fn home_dir() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

/// `~/.config/magic` (platform config dir + `magic`)
pub fn user_config_root() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|d| d.config_dir().join(XDG_CONFIG_SUBDIR))
        .ok_or(ConfigError::NoConfigDir)
}

/// Root of the dispatcher's runtime configuration.
///
/// `$DOCKER_CREDENTIAL_MAGIC_CONFIG` wins when set and non-empty.
pub fn magic_config_root() -> Result<PathBuf> {
    match non_empty_env(ENV_MAGIC_CONFIG) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => user_config_root(),
    }
}

/// Directory holding the mapping descriptors consulted at dispatch time
pub fn runtime_mappings_dir() -> Result<PathBuf> {
    Ok(magic_config_root()?.join(MAPPINGS_SUBDIR))
}

/// Docker config dir saved by the magician before it overrode `DOCKER_CONFIG`
pub fn original_docker_config_dir() -> Option<PathBuf> {
    non_empty_env(ENV_DOCKER_ORIG_CONFIG).map(PathBuf::from)
}

/// Default location of the magician's TOML config
pub fn magician_config_path() -> Result<PathBuf> {
    Ok(user_config_root()?.join(MAGICIAN_CONFIG_FILE_BASENAME))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
