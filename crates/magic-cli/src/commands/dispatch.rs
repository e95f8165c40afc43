//! `docker-credential-magic` subcommands

use anyhow::{Context, Result};
use magic_config::constants::{ENV_MAGIC_CONFIG, MAPPINGS_SUBDIR};
use magic_core::{install_default_mappings, read_input, Dispatcher, InstallStatus};
use std::io::Write;
use std::path::PathBuf;

/// Answer one `get` request. Returns the process exit code.
pub fn get() -> Result<i32> {
    let input = read_input(std::io::stdin().lock()).context("parsing raw input")?;
    let dispatcher = Dispatcher::from_env()?;
    tracing::debug!("Reading mappings from {:?}", dispatcher.mappings_dir());

    let mut stdout = std::io::stdout().lock();
    let code = dispatcher
        .run(&input, &mut stdout)
        .with_context(|| format!("getting credentials for '{}'", input.server))?;
    stdout.flush()?;
    Ok(code)
}

/// Show where the runtime configuration is read from
pub fn env() -> Result<()> {
    let root = magic_config::magic_config_root()?;
    println!("{}=\"{}\"", ENV_MAGIC_CONFIG, root.display());
    Ok(())
}

/// Install the default mapping descriptors into the runtime mappings dir
pub fn init() -> Result<()> {
    let dir = absolute(magic_config::magic_config_root()?.join(MAPPINGS_SUBDIR))?;

    if dir.is_dir() {
        println!("Directory '{}' already exists. Skipping.", dir.display());
    } else {
        println!("Creating directory '{}' ...", dir.display());
    }

    let installed = install_default_mappings(&dir)
        .with_context(|| format!("installing mappings into '{}'", dir.display()))?;
    for mapping in installed {
        match mapping.status {
            InstallStatus::Created => {
                println!("Created mapping file '{}'", mapping.path.display())
            }
            InstallStatus::Skipped => {
                println!("File '{}' already exists. Skipping.", mapping.path.display())
            }
        }
    }
    Ok(())
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
