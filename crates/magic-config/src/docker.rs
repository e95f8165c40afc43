//! Docker client configuration (`config.json`)
//!
//! Only the credential-related parts are modelled: inline `auths`, the default
//! `credsStore` and per-registry `credHelpers`.

use crate::constants::DOCKER_CONFIG_FILE_BASENAME;
use crate::{ConfigError, Result};
use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Parsed Docker config.json structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DockerConfigFile {
    /// Inline credentials keyed by server address
    pub auths: HashMap<String, AuthEntry>,
    /// Default credential store (e.g. "desktop", "secretservice", "magic")
    pub creds_store: Option<String>,
    /// Per-registry credential helpers
    pub cred_helpers: HashMap<String, String>,
}

/// An entry in Docker config.json "auths"
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AuthEntry {
    /// Base64-encoded "username:password"
    pub auth: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "identityToken")]
    pub identitytoken: Option<String>,
    #[serde(alias = "registryToken")]
    pub registrytoken: Option<String>,
}

impl AuthEntry {
    /// Username and password, preferring explicit fields over the `auth` blob
    pub fn basic_credentials(&self) -> Option<(String, String)> {
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            if !username.is_empty() || !password.is_empty() {
                return Some((username.clone(), password.clone()));
            }
        }
        self.auth.as_deref().and_then(decode_auth)
    }
}

impl DockerConfigFile {
    /// Load `<dir>/config.json`.
    ///
    /// A missing file is an empty config (same as the Docker CLI); a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(DOCKER_CONFIG_FILE_BASENAME);
        if !path.exists() {
            tracing::debug!("Docker config not found at {:?}, using empty config", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load a specific config.json
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::JsonParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Credential helper responsible for `server`, if any.
    ///
    /// Per-registry `credHelpers` win over the default `credsStore`.
    pub fn helper_for(&self, server: &str) -> Option<&str> {
        if let Some(helper) = self.cred_helpers.get(server) {
            return Some(helper.as_str());
        }
        self.creds_store.as_deref().filter(|s| !s.is_empty())
    }

    /// Inline `auths` entry for `server`.
    ///
    /// Tries the exact key first, then any key whose hostname matches, so
    /// `https://registry.example.com/v2/` is found for `registry.example.com`.
    pub fn auth_entry(&self, server: &str) -> Option<&AuthEntry> {
        if let Some(entry) = self.auths.get(server) {
            return Some(entry);
        }
        let wanted = registry_hostname(server);
        let mut keys: Vec<&String> = self.auths.keys().collect();
        keys.sort();
        keys.into_iter()
            .find(|k| registry_hostname(k) == wanted)
            .and_then(|k| self.auths.get(k))
    }
}

/// Directory holding the ambient Docker config: `$DOCKER_CONFIG` or `~/.docker`
pub fn docker_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(crate::constants::ENV_DOCKER_CONFIG) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    Ok(crate::home_dir()?.join(crate::constants::DOCKER_HOME_DIR))
}

/// Strip scheme and path from a server address: `https://ghcr.io/v2/` -> `ghcr.io`
pub fn registry_hostname(server: &str) -> &str {
    let without_scheme = server
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(server);
    without_scheme.split('/').next().unwrap_or(without_scheme)
}

/// Decode base64-encoded "username:password" auth string
pub fn decode_auth(auth: &str) -> Option<(String, String)> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth.trim())
        .ok()?;
    let decoded_str = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded_str.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_docker_config() {
        let json = r#"{
            "auths": {
                "ghcr.io": { "auth": "dXNlcjpwYXNz" },
                "https://index.docker.io/v1/": { "identitytoken": "tok" },
                "docker.io": {}
            },
            "credsStore": "desktop",
            "credHelpers": {
                "gcr.io": "gcr"
            }
        }"#;

        let config: DockerConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.creds_store.as_deref(), Some("desktop"));
        assert_eq!(config.helper_for("gcr.io"), Some("gcr"));
        assert_eq!(config.helper_for("ghcr.io"), Some("desktop"));
        assert_eq!(
            config.auth_entry("ghcr.io").unwrap().basic_credentials(),
            Some(("user".to_string(), "pass".to_string()))
        );
        assert_eq!(
            config
                .auth_entry("index.docker.io")
                .unwrap()
                .identitytoken
                .as_deref(),
            Some("tok")
        );
        assert!(config.auth_entry("quay.io").is_none());
    }

    #[test]
    fn test_parse_docker_config_empty() {
        let config: DockerConfigFile = serde_json::from_str("{}").unwrap();
        assert!(config.creds_store.is_none());
        assert!(config.cred_helpers.is_empty());
        assert!(config.auths.is_empty());
        assert_eq!(config.helper_for("example.com"), None);
    }

    #[test]
    fn test_empty_creds_store_is_ignored() {
        let config: DockerConfigFile = serde_json::from_str(r#"{"credsStore": ""}"#).unwrap();
        assert_eq!(config.helper_for("example.com"), None);
    }

    #[test]
    fn test_load_from_dir_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = DockerConfigFile::load_from_dir(tmp.path()).unwrap();
        assert!(config.auths.is_empty());
    }

    #[test]
    fn test_load_from_dir_invalid_json() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.json"), "{not json").unwrap();
        let err = DockerConfigFile::load_from_dir(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::JsonParseError { .. }));
    }

    #[test]
    fn test_basic_credentials_prefers_explicit_fields() {
        let entry = AuthEntry {
            auth: Some("b3RoZXI6b3RoZXI=".to_string()),
            username: Some("myuser".to_string()),
            password: Some("mypass".to_string()),
            ..Default::default()
        };
        assert_eq!(
            entry.basic_credentials(),
            Some(("myuser".to_string(), "mypass".to_string()))
        );
    }

    #[test]
    fn test_registry_hostname() {
        assert_eq!(registry_hostname("https://index.docker.io/v1/"), "index.docker.io");
        assert_eq!(registry_hostname("localhost:5000"), "localhost:5000");
        assert_eq!(registry_hostname("ghcr.io"), "ghcr.io");
    }

    #[test]
    fn test_decode_auth_with_colon_in_password() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("user:pass:word");
        assert_eq!(
            decode_auth(&encoded),
            Some(("user".to_string(), "pass:word".to_string()))
        );
        assert_eq!(decode_auth("not base64!"), None);
    }
}
