//! Assets compiled into the binaries
//!
//! The default mapping descriptors and the credential helper binaries that the
//! magician copies into images. Both tables are sorted by file name.

use crate::{CoreError, Result};
use std::path::{Path, PathBuf};

/// A file embedded at compile time
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedAsset {
    pub name: &'static str,
    pub contents: &'static [u8],
    /// A stand-in script rather than the real helper
    pub placeholder: bool,
}

/// Default mapping descriptors
pub static EMBEDDED_MAPPINGS: &[EmbeddedAsset] = &[
    EmbeddedAsset {
        name: "aws.yml",
        contents: include_bytes!("../assets/mappings/aws.yml"),
        placeholder: false,
    },
    EmbeddedAsset {
        name: "azure.yml",
        contents: include_bytes!("../assets/mappings/azure.yml"),
        placeholder: false,
    },
    EmbeddedAsset {
        name: "gcp.yml",
        contents: include_bytes!("../assets/mappings/gcp.yml"),
        placeholder: false,
    },
];

/// Helper binaries, keyed by executable name. Generated by `build.rs`.
pub static EMBEDDED_HELPERS: &[EmbeddedAsset] =
    include!(concat!(env!("OUT_DIR"), "/embedded_helpers.rs"));

/// Look up an asset by file name
pub fn find_embedded(table: &[EmbeddedAsset], name: &str) -> Option<&'static [u8]> {
    table.iter().find(|a| a.name == name).map(|a| a.contents)
}

/// Whether the embedded helper `name` is a stand-in script
pub fn is_placeholder(table: &[EmbeddedAsset], name: &str) -> bool {
    table.iter().any(|a| a.name == name && a.placeholder)
}

/// Where the bytes of one layer entry come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Embedded(&'static [u8]),
    File(PathBuf),
}

impl AssetSource {
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            AssetSource::Embedded(bytes) => Ok(bytes.to_vec()),
            AssetSource::File(path) => std::fs::read(path).map_err(|e| CoreError::ReadAsset {
                path: path.clone(),
                source: e,
            }),
        }
    }

    /// Human readable origin, for progress output
    pub fn describe(&self) -> String {
        match self {
            AssetSource::Embedded(_) => "embedded".to_string(),
            AssetSource::File(path) => path.display().to_string(),
        }
    }
}

/// Decide where `file_name` is read from.
///
/// Names in `reserved` always come from `table`. Everything else comes from
/// `override_dir` when one is given (the file must exist there by the time
/// it is read), otherwise from `table`.
pub fn select_asset(
    table: &[EmbeddedAsset],
    override_dir: Option<&Path>,
    file_name: &str,
    reserved: &[&str],
) -> Result<AssetSource> {
    if !reserved.contains(&file_name) {
        if let Some(dir) = override_dir {
            return Ok(AssetSource::File(dir.join(file_name)));
        }
    }
    find_embedded(table, file_name)
        .map(AssetSource::Embedded)
        .ok_or_else(|| CoreError::MissingAsset(file_name.to_string()))
}
