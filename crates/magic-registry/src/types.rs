//! Image model shared by registry implementations

use crate::{RegistryError, Result};
use serde_json::{json, Map, Value};

pub const OCI_LAYER_GZIP_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar+gzip";
pub const OCI_LAYER_TAR_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar";
pub const DOCKER_LAYER_GZIP_MEDIA_TYPE: &str =
    "application/vnd.docker.image.rootfs.diff.tar.gzip";
pub const DOCKER_LAYER_FOREIGN_GZIP_MEDIA_TYPE: &str =
    "application/vnd.docker.image.rootfs.foreign.diff.tar.gzip";

/// Layer media types accepted when pulling a base image
pub const ACCEPTED_LAYER_MEDIA_TYPES: &[&str] = &[
    OCI_LAYER_GZIP_MEDIA_TYPE,
    OCI_LAYER_TAR_MEDIA_TYPE,
    DOCKER_LAYER_GZIP_MEDIA_TYPE,
    DOCKER_LAYER_FOREIGN_GZIP_MEDIA_TYPE,
];

/// A single-platform image: its config document plus layer blobs
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub config: ImageConfig,
    pub layers: Vec<Layer>,
}

impl Image {
    /// An image with no layers and an empty runtime config
    pub fn empty() -> Self {
        Self {
            config: ImageConfig::empty(),
            layers: Vec::new(),
        }
    }
}

/// One layer blob as stored in the registry (usually gzip-compressed tar)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub data: Vec<u8>,
    pub media_type: String,
}

/// Result of a successful push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedImage {
    pub manifest_url: String,
}

/// The image config document (`application/vnd.oci.image.config.v1+json`).
///
/// Kept as raw JSON so fields this tool does not touch survive a
/// pull/modify/push cycle unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageConfig(Map<String, Value>);

impl ImageConfig {
    /// Config of an image without layers
    pub fn empty() -> Self {
        let mut map = Map::new();
        map.insert("architecture".to_string(), json!("amd64"));
        map.insert("os".to_string(), json!("linux"));
        map.insert("config".to_string(), json!({}));
        map.insert(
            "rootfs".to_string(),
            json!({ "type": "layers", "diff_ids": [] }),
        );
        Self(map)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(data)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(RegistryError::InvalidConfig(
                "image config is not a JSON object".to_string(),
            )),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    /// Look up a top-level field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `config.Env`, in order; non-string entries are dropped
    pub fn env(&self) -> Vec<String> {
        self.0
            .get("config")
            .and_then(|c| c.get("Env"))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace `config.Env`
    pub fn set_env(&mut self, env: Vec<String>) {
        let env = Value::Array(env.into_iter().map(Value::String).collect());
        match self.0.get_mut("config") {
            Some(Value::Object(runtime)) => {
                runtime.insert("Env".to_string(), env);
            }
            _ => {
                self.0.insert("config".to_string(), json!({ "Env": env }));
            }
        }
    }

    /// `rootfs.diff_ids`
    pub fn diff_ids(&self) -> Vec<String> {
        self.0
            .get("rootfs")
            .and_then(|r| r.get("diff_ids"))
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(|e| e.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record a new top layer: its uncompressed digest goes into
    /// `rootfs.diff_ids`, and a history entry is added when the image keeps a
    /// history.
    pub fn append_layer(&mut self, diff_id: &str, created_by: &str) {
        let existing = self
            .0
            .get_mut("rootfs")
            .and_then(|r| r.get_mut("diff_ids"))
            .and_then(Value::as_array_mut);
        match existing {
            Some(ids) => ids.push(json!(diff_id)),
            None => {
                self.0.insert(
                    "rootfs".to_string(),
                    json!({ "type": "layers", "diff_ids": [diff_id] }),
                );
            }
        }

        if let Some(history) = self.0.get_mut("history").and_then(Value::as_array_mut) {
            history.push(json!({
                "created": "1970-01-01T00:00:00Z",
                "created_by": created_by,
            }));
        }
    }
}
