//! `docker-credential-magician` subcommands

use anyhow::Result;
use clap::Args;
use magic_config::constants::MAGIC_CREDENTIAL_SUFFIX;
use magic_config::{expand_path, MagicianConfig, MutateDefaults};
use magic_core::{MutateReport, MutateRequest, Mutator};
use magic_registry::ImageRegistry;
use std::path::{Path, PathBuf};

/// Arguments of `docker-credential-magician mutate`
#[derive(Debug, Clone, Default, Args)]
pub struct MutateArgs {
    /// Image to augment (e.g. alpine:3.19 or ghcr.io/org/app:1.0)
    pub source: String,

    /// Push the result here instead of overwriting the source tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Directory with docker-credential-<helper> binaries to use instead of the embedded ones
    #[arg(long, value_name = "DIR")]
    pub helpers_dir: Option<String>,

    /// Directory with mapping descriptors (<slug>.yml) to use instead of the embedded ones
    #[arg(long, value_name = "DIR")]
    pub mappings_dir: Option<String>,

    /// Only install these helpers (repeatable; all supported helpers by default)
    #[arg(short = 'i', long = "include", value_name = "HELPER")]
    pub include: Vec<String>,

    /// User-Agent for registry requests
    #[arg(long)]
    pub user_agent: Option<String>,

    /// docker-credential-magic binary to add (default: the one installed next to this program)
    #[arg(long, value_name = "PATH")]
    pub dispatcher: Option<String>,
}

/// Combine command-line arguments with configured defaults. Arguments win.
pub fn build_request(args: MutateArgs, defaults: &MutateDefaults) -> MutateRequest {
    let mut request = MutateRequest::new(args.source);

    if let Some(tag) = args.tag {
        request = request.with_tag(tag);
    }
    if let Some(dir) = args.helpers_dir.or_else(|| defaults.helpers_dir.clone()) {
        request = request.with_helpers_dir(expand_path(&dir));
    }
    if let Some(dir) = args.mappings_dir.or_else(|| defaults.mappings_dir.clone()) {
        request = request.with_mappings_dir(expand_path(&dir));
    }

    let include = if args.include.is_empty() {
        defaults.include.clone()
    } else {
        args.include
    };
    request = request.with_include_helpers(include);

    if let Some(user_agent) = args.user_agent.or_else(|| defaults.user_agent.clone()) {
        request = request.with_user_agent(user_agent);
    }

    let dispatcher = args
        .dispatcher
        .or_else(|| defaults.dispatcher.clone())
        .map(|path| expand_path(&path))
        .or_else(installed_dispatcher);
    if let Some(path) = dispatcher {
        request = request.with_dispatcher_binary(path);
    }
    request
}

/// `docker-credential-magic` next to the running executable, if installed
fn installed_dispatcher() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    sibling_dispatcher(&exe)
}

fn sibling_dispatcher(exe: &Path) -> Option<PathBuf> {
    let name = format!(
        "{}{}",
        magic_config::helper_binary_name(MAGIC_CREDENTIAL_SUFFIX),
        std::env::consts::EXE_SUFFIX
    );
    let path = exe.parent()?.join(name);
    path.is_file().then_some(path)
}

/// Run a mutation and print where the result went
pub async fn mutate<R: ImageRegistry>(registry: R, request: MutateRequest) -> Result<MutateReport> {
    let mutator = Mutator::new(registry);
    let report = mutator.mutate(request).await?;

    println!("Pushed {}", report.destination);
    println!("  helpers: {}", report.helpers.join(", "));
    println!("  manifest: {}", report.manifest_url);
    Ok(report)
}

/// Show the effective configuration
pub fn config(path: &Path, config: &MagicianConfig) -> Result<()> {
    if path.exists() {
        println!("# Config file: {:?}\n", path);
    } else {
        println!("# Config file: {:?} (not created yet)\n", path);
        println!("# Default configuration:");
    }
    println!("{}", config.to_toml()?);
    Ok(())
}
