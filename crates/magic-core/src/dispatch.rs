//! Credential dispatch
//!
//! `docker-credential-magic get` reads one server address from stdin, picks
//! the helper whose mapping descriptor lists the server's root domain and
//! hands the request over to it. With no matching helper it answers from the
//! original Docker config, or with empty (anonymous) credentials.

use crate::mappings::{resolve_helper, MappingSource};
use crate::{CoreError, Result};
use magic_config::constants::{
    DOCKER_CONFIG_FILE_BASENAME, DOCKER_HOME_DIR, HELPER_SUBCOMMAND_GET, IDENTITY_TOKEN_USERNAME,
    MAGIC_CREDENTIAL_SUFFIX,
};
use magic_config::{helper_binary_name, DockerConfigFile};
use magic_registry::{get_credential, DockerCredential};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Credential helper `get` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl Credentials {
    /// Identity tokens are reported with the `<token>` username
    pub fn from_docker(credential: DockerCredential) -> Self {
        match credential.identity_token {
            Some(token) => Credentials {
                username: IDENTITY_TOKEN_USERNAME.to_string(),
                secret: token,
            },
            None => Credentials {
                username: credential.username,
                secret: credential.password,
            },
        }
    }

    /// One line of JSON, newline terminated
    pub fn to_json_line(&self) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string(self)?))
    }
}

/// The request as read from stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperInput {
    /// The line exactly as received, forwarded to the delegate
    pub raw: String,
    /// Server address extracted from the line
    pub server: String,
}

impl HelperInput {
    /// Accepts a bare server address or a JSON object with a `ServerURL` field
    pub fn parse(line: &str) -> Result<Self> {
        let raw = line.trim_end_matches(['\r', '\n']).to_string();
        let trimmed = raw.trim();

        let server = if trimmed.starts_with('{') {
            let object: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(trimmed)?;
            object
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("serverurl"))
                .and_then(|(_, v)| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| CoreError::InvalidInput("no ServerURL in request".to_string()))?
        } else {
            trimmed.to_string()
        };

        if server.is_empty() {
            return Err(CoreError::InvalidInput("empty server address".to_string()));
        }
        Ok(Self { raw, server })
    }
}

/// Read exactly one line of input
pub fn read_input<R: BufRead>(mut reader: R) -> Result<HelperInput> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    HelperInput::parse(&line)
}

/// Host part of a server address: no scheme, path, userinfo or port, lowercased.
///
/// `https://User@Registry.Example.com:5000/v2/` -> `registry.example.com`
pub fn server_host(server: &str) -> String {
    let host = server.trim();
    let host = host.split_once("://").map(|(_, rest)| rest).unwrap_or(host);
    let host = host.split('/').next().unwrap_or(host);
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    let host = match host.rfind(':') {
        Some(i) if !host[i + 1..].contains(']') => &host[..i],
        _ => host,
    };
    host.to_lowercase()
}

/// Root domain of a host: its last two dot-separated labels.
///
/// Deliberately naive: `foo.co.uk` yields `co.uk`.
pub fn parse_domain(host: &str) -> Result<String> {
    let parts: Vec<&str> = host.split('.').collect();
    let n = parts.len();
    if n < 2 {
        return Err(CoreError::InvalidDomain(host.to_string()));
    }
    let (root, tld) = (parts[n - 2], parts[n - 1]);
    if root.is_empty() || tld.is_empty() {
        return Err(CoreError::InvalidDomain(host.to_string()));
    }
    Ok(format!("{}.{}", root, tld))
}

/// What the dispatcher will do for a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPlan {
    /// Run `program get` and adopt its output and exit code
    Delegate { helper: String, program: String },
    /// Answer from the Docker config in `dir`
    Fallback { dir: PathBuf },
    /// Answer with empty credentials
    Anonymous,
}

/// Decides and executes how a `get` request is answered
#[derive(Debug, Clone)]
pub struct Dispatcher {
    mappings_dir: PathBuf,
    original_config: Option<PathBuf>,
    home_docker_dir: Option<PathBuf>,
}

impl Dispatcher {
    pub fn new(
        mappings_dir: PathBuf,
        original_config: Option<PathBuf>,
        home_docker_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            mappings_dir,
            original_config,
            home_docker_dir,
        }
    }

    /// Paths from `DOCKER_CREDENTIAL_MAGIC_CONFIG`, `DOCKER_ORIG_CONFIG` and `$HOME`
    pub fn from_env() -> Result<Self> {
        let mappings_dir = magic_config::runtime_mappings_dir()?;
        let home_docker_dir = magic_config::home_dir()
            .ok()
            .map(|home| home.join(DOCKER_HOME_DIR));
        Ok(Self::new(
            mappings_dir,
            magic_config::original_docker_config_dir(),
            home_docker_dir,
        ))
    }

    pub fn mappings_dir(&self) -> &Path {
        &self.mappings_dir
    }

    /// Decide how to answer for `domain` without running anything
    pub fn plan(&self, domain: &str) -> Result<DispatchPlan> {
        if !self.mappings_dir.is_dir() {
            return Err(CoreError::MappingsDirMissing(self.mappings_dir.clone()));
        }

        let source = MappingSource::Directory(self.mappings_dir.clone());
        match resolve_helper(domain, &source)? {
            Some(helper) if helper == MAGIC_CREDENTIAL_SUFFIX => {
                tracing::warn!("Ignoring mapping of {} to the magic helper itself", domain);
            }
            Some(helper) => {
                let program = helper_binary_name(&helper);
                return Ok(DispatchPlan::Delegate { helper, program });
            }
            None => tracing::debug!("No helper mapped for {}", domain),
        }

        if let Some(dir) = &self.original_config {
            return Ok(DispatchPlan::Fallback { dir: dir.clone() });
        }
        if let Some(dir) = &self.home_docker_dir {
            if dir.join(DOCKER_CONFIG_FILE_BASENAME).exists() {
                return Ok(DispatchPlan::Fallback { dir: dir.clone() });
            }
        }
        Ok(DispatchPlan::Anonymous)
    }

    /// Answer a request. Returns the exit code for the process.
    pub fn run<W: Write>(&self, input: &HelperInput, out: &mut W) -> Result<i32> {
        let domain = parse_domain(&server_host(&input.server))?;
        tracing::debug!("Dispatching {} (domain {})", input.server, domain);

        match self.plan(&domain)? {
            DispatchPlan::Delegate { helper, program } => {
                tracing::debug!("Delegating to {} for {}", program, domain);
                delegate(&program, &input.raw).map_err(|e| CoreError::Delegate {
                    helper: helper_binary_name(&helper),
                    source: e,
                })
            }
            DispatchPlan::Fallback { dir } => {
                tracing::debug!("Falling back to Docker config in {:?}", dir);
                let credentials = fallback_credentials(&dir, &domain)?;
                out.write_all(credentials.to_json_line()?.as_bytes())?;
                Ok(0)
            }
            DispatchPlan::Anonymous => {
                out.write_all(magic_config::constants::ANONYMOUS_TOKEN_RESPONSE.as_bytes())?;
                Ok(0)
            }
        }
    }
}

/// Run `program get` with `raw` on stdin; stdout and stderr are inherited
fn delegate(program: &str, raw: &str) -> std::io::Result<i32> {
    let mut child = Command::new(program)
        .arg(HELPER_SUBCOMMAND_GET)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        // The helper may exit without reading its input
        match stdin.write_all(raw.as_bytes()) {
            Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
            _ => {}
        }
    }

    let status = child.wait()?;
    if !status.success() {
        tracing::debug!("{} exited with {}", program, status);
    }
    // Killed by a signal
    Ok(status.code().unwrap_or(1))
}

/// Credentials for `domain` from the Docker config in `dir`.
///
/// The `magic` store is never invoked here since that is this program.
fn fallback_credentials(dir: &Path, domain: &str) -> Result<Credentials> {
    let config = DockerConfigFile::load_from_dir(dir)?;
    let credential = get_credential(&config, domain, Some(MAGIC_CREDENTIAL_SUFFIX))?;
    Ok(credential.map(Credentials::from_docker).unwrap_or_default())
}
