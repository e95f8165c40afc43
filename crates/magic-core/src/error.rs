//! Error types for magic-core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] magic_config::ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] magic_registry::RegistryError),

    #[error("Supplied domain is invalid: '{0}'")]
    InvalidDomain(String),

    #[error("Invalid helper input: {0}")]
    InvalidInput(String),

    #[error("Helper '{0}' is not supported")]
    UnsupportedHelper(String),

    #[error("Invalid image reference '{reference}': {message}")]
    ReferenceParse { reference: String, message: String },

    #[error("Failed to pull '{reference}': {source}")]
    Pull {
        reference: String,
        source: magic_registry::RegistryError,
    },

    #[error("Failed to push '{reference}': {source}")]
    Push {
        reference: String,
        source: magic_registry::RegistryError,
    },

    #[error("Failed to read {path}: {source}")]
    ReadAsset {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No embedded asset named '{0}'")]
    MissingAsset(String),

    #[error(
        "Directory '{}' does not exist.\nHint: Try running \"docker-credential-magic init\"",
        .0.display()
    )]
    MappingsDirMissing(PathBuf),

    #[error(
        "No docker-credential-magic binary to add: install it next to docker-credential-magician, pass --dispatcher, or build with MAGIC_EMBEDDED_HELPERS_DIR"
    )]
    DispatcherUnavailable,

    #[error("Failed to run '{helper}': {source}")]
    Delegate {
        helper: String,
        source: std::io::Error,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
