//! Configuration parsing for docker-credential-magic
//!
//! This crate handles parsing of:
//! - Helper mapping descriptors (`<slug>.yml`)
//! - Docker client configuration (`config.json`)
//! - Magician configuration (`~/.config/magic/magician.toml`)
//! - Runtime paths and the environment variables that select them

pub mod constants;
mod docker;
mod error;
mod magician;
mod mapping;
mod paths;

pub use constants::{helper_binary_name, magic_binaries_dir, magic_mappings_dir};
pub use docker::*;
pub use error::*;
pub use magician::*;
pub use mapping::*;
pub use paths::*;
