//! Registry trait and OCI distribution implementation for docker-credential-magic
//!
//! This crate provides an abstraction over image registries with just the two
//! operations the magician needs: pull a single-platform image and push a
//! modified one.

mod docker_auth;
mod error;
mod oci;
mod types;

pub use docker_auth::*;
pub use error::*;
pub use oci::{OciRegistry, RegistrySettings};
pub use oci_client::Reference;
pub use types::*;

use async_trait::async_trait;

/// Trait for image registries
#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// Pull an image (config and layer blobs) from a registry
    async fn pull(&self, reference: &Reference) -> Result<Image>;

    /// Push an image, returning where its manifest was stored
    async fn push(
        &self,
        reference: &Reference,
        image: &Image,
        user_agent: Option<&str>,
    ) -> Result<PushedImage>;
}

/// Parse an image reference such as `alpine`, `ghcr.io/org/app:1.0` or
/// `localhost:5000/app@sha256:...`
pub fn parse_reference(reference: &str) -> Result<Reference> {
    reference
        .parse::<Reference>()
        .map_err(|e| RegistryError::InvalidReference {
            reference: reference.to_string(),
            message: e.to_string(),
        })
}
