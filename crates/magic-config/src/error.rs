//! Error types for configuration parsing

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse mappings for '{file}': {source}")]
    MappingParse {
        file: String,
        source: serde_yaml::Error,
    },

    #[error("Helper '{helper}' in '{file}' is invalid (expected [a-z0-9_-]+)")]
    InvalidHelperName { file: String, helper: String },

    #[error("Invalid mappings in '{file}': {reason}")]
    InvalidMapping { file: String, reason: String },

    #[error("Failed to parse TOML config at {path}: {source}")]
    TomlParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse JSON config at {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("Failed to determine home directory")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
