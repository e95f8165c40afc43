//! Docker registry credential support
//!
//! Follows the Docker CLI lookup order for a server: a per-registry
//! `credHelpers` entry, then the default `credsStore`, then inline `auths`.

use crate::{RegistryError, Result};
use magic_config::constants::{HELPER_SUBCOMMAND_GET, IDENTITY_TOKEN_USERNAME};
use magic_config::{helper_binary_name, is_valid_helper_name, DockerConfigFile};
use oci_client::secrets::RegistryAuth;
use serde::Deserialize;
use std::io::Write;
use std::process::{Command, Stdio};

/// Message credential helpers print when they hold nothing for a server
const CREDENTIALS_NOT_FOUND: &str = "credentials not found";

/// Credentials for one registry, as Docker models them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerCredential {
    pub username: String,
    pub password: String,
    /// OAuth refresh token; set instead of a password for token logins
    pub identity_token: Option<String>,
}

/// Response from credential helper
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialResponse {
    #[serde(default)]
    username: String,
    #[serde(default)]
    secret: String,
}

impl From<CredentialResponse> for DockerCredential {
    fn from(response: CredentialResponse) -> Self {
        if response.username == IDENTITY_TOKEN_USERNAME {
            DockerCredential {
                identity_token: Some(response.secret),
                ..Default::default()
            }
        } else {
            DockerCredential {
                username: response.username,
                password: response.secret,
                identity_token: None,
            }
        }
    }
}

/// Look up credentials for `server` in a Docker config.
///
/// `skip_helper` names a store that must not be invoked (the caller itself);
/// when it is the configured helper the inline `auths` are used instead.
/// A helper that knows nothing about `server` yields `Ok(None)`.
pub fn get_credential(
    config: &DockerConfigFile,
    server: &str,
    skip_helper: Option<&str>,
) -> Result<Option<DockerCredential>> {
    if let Some(helper) = config.helper_for(server) {
        if Some(helper) != skip_helper {
            return invoke_credential_helper(helper, server);
        }
        tracing::debug!("Not invoking credential store '{}' for {}", helper, server);
    }

    Ok(config.auth_entry(server).map(|entry| {
        let (username, password) = entry.basic_credentials().unwrap_or_default();
        DockerCredential {
            username,
            password,
            identity_token: entry.identitytoken.clone().filter(|t| !t.is_empty()),
        }
    }))
}

/// Invoke `docker-credential-<helper> get` with the server on stdin
pub fn invoke_credential_helper(helper: &str, server: &str) -> Result<Option<DockerCredential>> {
    if !is_valid_helper_name(helper) {
        return Err(RegistryError::CredentialHelper {
            helper: helper.to_string(),
            message: "invalid helper name".to_string(),
        });
    }

    let binary = helper_binary_name(helper);
    tracing::debug!("Calling {} get for {}", binary, server);

    let mut child = Command::new(&binary)
        .arg(HELPER_SUBCOMMAND_GET)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RegistryError::CredentialHelper {
            helper: binary.clone(),
            message: format!("failed to spawn: {}", e),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(server.as_bytes())?;
    }

    let output = child.wait_with_output()?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stdout.contains(CREDENTIALS_NOT_FOUND) || stderr.contains(CREDENTIALS_NOT_FOUND) {
            tracing::debug!("{} has no credentials for {}", binary, server);
            return Ok(None);
        }
        return Err(RegistryError::CredentialHelper {
            helper: binary,
            message: format!("{} {}", stdout.trim(), stderr.trim()).trim().to_string(),
        });
    }

    let response: CredentialResponse = serde_json::from_slice(&output.stdout)?;
    Ok(Some(response.into()))
}

/// Ambient authentication for pulling from / pushing to `registry`.
///
/// Reads `$DOCKER_CONFIG/config.json` or `~/.docker/config.json`. Any problem
/// resolving credentials is logged and results in anonymous access.
pub fn resolve_registry_auth(registry: &str) -> RegistryAuth {
    let config = match magic_config::docker_config_dir()
        .and_then(|dir| DockerConfigFile::load_from_dir(&dir))
    {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load Docker config: {}", e);
            return RegistryAuth::Anonymous;
        }
    };
    auth_from_config(&config, registry)
}

fn auth_from_config(config: &DockerConfigFile, registry: &str) -> RegistryAuth {
    // Docker Hub credentials live under the legacy index address
    let candidates: &[&str] = if registry == "docker.io" || registry == "index.docker.io" {
        &["https://index.docker.io/v1/", "docker.io", "index.docker.io"]
    } else {
        &[registry]
    };

    for server in candidates {
        match get_credential(config, server, None) {
            Ok(Some(cred)) => return registry_auth(cred),
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("Failed to resolve credentials for {}: {}", server, e);
            }
        }
    }

    tracing::debug!("No credentials for {}, using anonymous access", registry);
    RegistryAuth::Anonymous
}

fn registry_auth(cred: DockerCredential) -> RegistryAuth {
    match cred.identity_token {
        Some(token) => RegistryAuth::Basic(IDENTITY_TOKEN_USERNAME.to_string(), token),
        None if cred.username.is_empty() && cred.password.is_empty() => RegistryAuth::Anonymous,
        None => RegistryAuth::Basic(cred.username, cred.password),
    }
}
