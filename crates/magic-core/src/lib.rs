//! Core logic for docker-credential-magic
//!
//! This crate provides:
//! - The embedded mapping descriptors and helper binaries
//! - The mapping registry (which helper serves which domain)
//! - Credential dispatch for `docker-credential-magic get`
//! - Reproducible layer building
//! - The image mutation pipeline behind `docker-credential-magician mutate`

mod dispatch;
pub mod embedded;
mod env;
mod error;
mod layer;
mod mappings;
mod mutate;

pub use dispatch::*;
pub use embedded::{select_asset, AssetSource};
pub use env::*;
pub use error::*;
pub use layer::*;
pub use mappings::*;
pub use mutate::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
