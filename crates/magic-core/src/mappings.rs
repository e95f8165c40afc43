//! Mapping registry
//!
//! Loads helper mapping descriptors either from the embedded set or from a
//! directory, in lexicographic file-name order, and answers "which helper
//! serves this domain" with a first-match lookup.

use crate::embedded::{find_embedded, AssetSource, EMBEDDED_MAPPINGS};
use crate::{CoreError, Result};
use magic_config::{is_mapping_file, slug_from_file_name, ConfigError, HelperMapping};
use std::path::{Path, PathBuf};

/// Where mapping descriptors are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingSource {
    Embedded,
    Directory(PathBuf),
}

impl MappingSource {
    /// A directory when an override is given, the embedded set otherwise
    pub fn from_override(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => MappingSource::Directory(dir.to_path_buf()),
            None => MappingSource::Embedded,
        }
    }
}

/// One descriptor file and the slug derived from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorFile {
    pub slug: String,
    pub file_name: String,
}

impl DescriptorFile {
    fn new(file_name: String) -> Self {
        Self {
            slug: slug_from_file_name(&file_name),
            file_name,
        }
    }
}

/// Every descriptor file of a source, in lexicographic file-name order
pub fn list_descriptor_files(source: &MappingSource) -> Result<Vec<DescriptorFile>> {
    let mut files: Vec<DescriptorFile> = match source {
        MappingSource::Embedded => EMBEDDED_MAPPINGS
            .iter()
            .map(|a| DescriptorFile::new(a.name.to_string()))
            .collect(),
        MappingSource::Directory(dir) => {
            let read_error = |e: std::io::Error| ConfigError::ReadError {
                path: dir.clone(),
                source: e,
            };
            let mut files = Vec::new();
            for entry in std::fs::read_dir(dir).map_err(read_error)? {
                let entry = entry.map_err(read_error)?;
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                if !is_mapping_file(&name) || !entry.path().is_file() {
                    tracing::debug!("Ignoring {:?} in {:?}", name, dir);
                    continue;
                }
                files.push(DescriptorFile::new(name));
            }
            files
        }
    };

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// One descriptor file per slug. When two files map to the same slug
/// (`aws.yaml` and `aws.yml`) the first in listing order is kept.
pub fn list_descriptors(source: &MappingSource) -> Result<Vec<DescriptorFile>> {
    let mut files = list_descriptor_files(source)?;
    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.slug.clone()));
    Ok(files)
}

/// Slugs of every helper the source provides a descriptor for
pub fn load_supported_helpers(source: &MappingSource) -> Result<Vec<String>> {
    Ok(list_descriptors(source)?
        .into_iter()
        .map(|f| f.slug)
        .collect())
}

/// Where the descriptor for `slug` is read from
pub fn descriptor_asset(
    source: &MappingSource,
    slug: &str,
) -> Result<(DescriptorFile, AssetSource)> {
    let file = list_descriptors(source)?
        .into_iter()
        .find(|f| f.slug == slug)
        .ok_or_else(|| CoreError::UnsupportedHelper(slug.to_string()))?;
    let asset = asset_for(source, &file)?;
    Ok((file, asset))
}

fn asset_for(source: &MappingSource, file: &DescriptorFile) -> Result<AssetSource> {
    match source {
        MappingSource::Embedded => find_embedded(EMBEDDED_MAPPINGS, &file.file_name)
            .map(AssetSource::Embedded)
            .ok_or_else(|| CoreError::MissingAsset(file.file_name.clone())),
        MappingSource::Directory(dir) => Ok(AssetSource::File(dir.join(&file.file_name))),
    }
}

/// Read and validate one descriptor
pub fn load_descriptor(file: &DescriptorFile, asset: &AssetSource) -> Result<HelperMapping> {
    let bytes = match asset {
        AssetSource::Embedded(bytes) => bytes.to_vec(),
        AssetSource::File(path) => {
            std::fs::read(path).map_err(|e| ConfigError::ReadError {
                path: path.clone(),
                source: e,
            })?
        }
    };
    Ok(HelperMapping::parse(&file.file_name, &bytes)?)
}

/// Every descriptor of a source, in lookup order
#[derive(Debug, Clone, Default)]
pub struct MappingIndex {
    entries: Vec<(String, HelperMapping)>,
}

impl MappingIndex {
    /// Read and parse every descriptor file, including ones sharing a slug.
    /// Any malformed descriptor fails the load.
    pub fn load(source: &MappingSource) -> Result<Self> {
        let mut entries = Vec::new();
        for file in list_descriptor_files(source)? {
            let asset = asset_for(source, &file)?;
            let mapping = load_descriptor(&file, &asset)?;
            entries.push((file.slug, mapping));
        }
        tracing::debug!("Loaded {} mapping descriptor(s)", entries.len());
        Ok(Self { entries })
    }

    /// First descriptor listing `domain`
    pub fn resolve(&self, domain: &str) -> Option<&HelperMapping> {
        self.entries
            .iter()
            .find(|(_, m)| m.serves(domain))
            .map(|(_, m)| m)
    }
}

/// Helper slug serving `domain`, or `None` when no descriptor lists it
pub fn resolve_helper(domain: &str, source: &MappingSource) -> Result<Option<String>> {
    Ok(MappingIndex::load(source)?
        .resolve(domain)
        .map(|m| m.helper.clone()))
}

/// Check requested helper slugs against the supported set.
///
/// Comparison is case-insensitive; the returned slugs are lowercased with
/// duplicates removed. An empty request selects every supported helper.
pub fn validate_requested(include: &[String], supported: &[String]) -> Result<Vec<String>> {
    if include.is_empty() {
        return Ok(supported.to_vec());
    }

    let mut requested: Vec<String> = Vec::with_capacity(include.len());
    for slug in include {
        let lowered = slug.to_lowercase();
        if !supported.contains(&lowered) {
            return Err(CoreError::UnsupportedHelper(slug.clone()));
        }
        if !requested.contains(&lowered) {
            requested.push(lowered);
        }
    }
    Ok(requested)
}

/// Outcome of installing one default descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Created,
    /// The file already existed and was left alone
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledMapping {
    pub path: PathBuf,
    pub status: InstallStatus,
}

/// Write the embedded descriptors into `dir`, creating it if needed.
/// Existing files are never overwritten.
pub fn install_default_mappings(dir: &Path) -> Result<Vec<InstalledMapping>> {
    std::fs::create_dir_all(dir)?;

    let mut installed = Vec::with_capacity(EMBEDDED_MAPPINGS.len());
    for asset in EMBEDDED_MAPPINGS {
        let path = dir.join(asset.name);
        let status = if path.exists() {
            tracing::debug!("{:?} already exists, skipping", path);
            InstallStatus::Skipped
        } else {
            std::fs::write(&path, asset.contents)?;
            InstallStatus::Created
        };
        installed.push(InstalledMapping { path, status });
    }
    Ok(installed)
}
