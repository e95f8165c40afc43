//! Error types for registry access

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid image reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },

    #[error("Registry error: {0}")]
    Oci(#[from] oci_client::errors::OciDistributionError),

    #[error("Invalid image config: {0}")]
    InvalidConfig(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Credential helper '{helper}' failed: {message}")]
    CredentialHelper { helper: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] magic_config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
