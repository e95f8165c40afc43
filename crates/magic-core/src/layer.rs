//! Reproducible filesystem layers
//!
//! Every entry is a root-owned regular file with mode 0555 and mtime 0, and
//! the gzip header carries no timestamp or name, so the same inputs always
//! produce the same digests.

use crate::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::io::Write;

/// Mode of every file in the layer; fixed so it does not depend on umask
const ENTRY_MODE: u32 = 0o555;

/// A finished layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltLayer {
    /// gzip-compressed tar, as pushed
    pub data: Vec<u8>,
    /// `sha256:` digest of the uncompressed tar (goes into `rootfs.diff_ids`)
    pub diff_id: String,
    /// `sha256:` digest of `data`
    pub digest: String,
}

/// Collects files and writes them into a layer in insertion order
#[derive(Debug, Default)]
pub struct LayerBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl LayerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. `path` is relative to the image root (`opt/magic/...`).
    pub fn add_file(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.entries.push((path.into(), contents));
    }

    /// Paths added so far, in order
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|(p, _)| p.as_str()).collect()
    }

    pub fn build(&self) -> Result<BuiltLayer> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, contents) in &self.entries {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(contents.len() as u64);
            header.set_mode(ENTRY_MODE);
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            builder.append_data(&mut header, path, contents.as_slice())?;
        }
        let tar = builder.into_inner()?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar)?;
        let data = encoder.finish()?;

        Ok(BuiltLayer {
            diff_id: sha256_digest(&tar),
            digest: sha256_digest(&data),
            data,
        })
    }
}

/// `sha256:<hex>`
pub fn sha256_digest(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn sample() -> LayerBuilder {
        let mut builder = LayerBuilder::new();
        builder.add_file("opt/magic/etc/gcp.yml", b"helper: gcr\n".to_vec());
        builder.add_file("opt/magic/config.json", b"{}\n".to_vec());
        builder
    }

    #[test]
    fn test_layer_is_reproducible() {
        let first = sample().build().unwrap();
        let second = sample().build().unwrap();
        assert_eq!(first, second);
        assert!(first.diff_id.starts_with("sha256:"));
        assert_ne!(first.diff_id, first.digest);
    }

    #[test]
    fn test_layer_entries() {
        let layer = sample().build().unwrap();

        let mut tar_bytes = Vec::new();
        GzDecoder::new(layer.data.as_slice())
            .read_to_end(&mut tar_bytes)
            .unwrap();
        assert_eq!(sha256_digest(&tar_bytes), layer.diff_id);

        let mut archive = tar::Archive::new(tar_bytes.as_slice());
        let mut seen = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let header = entry.header();
            assert_eq!(header.mode().unwrap(), 0o555);
            assert_eq!(header.mtime().unwrap(), 0);
            assert_eq!(header.uid().unwrap(), 0);
            assert_eq!(header.entry_type(), tar::EntryType::Regular);
            let path = entry.path().unwrap().to_string_lossy().to_string();
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            seen.push((path, contents));
        }
        assert_eq!(
            seen,
            vec![
                ("opt/magic/etc/gcp.yml".to_string(), "helper: gcr\n".to_string()),
                ("opt/magic/config.json".to_string(), "{}\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_sha256_digest() {
        assert_eq!(
            sha256_digest(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
