//! docker-credential-magic - catch-all Docker credential helper

use clap::{Parser, Subcommand};
use magic_cli::commands;
use magic_config::constants::ENV_MAGIC_LOG;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docker-credential-magic")]
#[command(
    author,
    version,
    about = "Docker credential helper that delegates to the right helper per registry",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a server address from stdin and print its credentials
    Get,

    /// Show where mapping descriptors are read from
    Env,

    /// Install the default mapping descriptors
    Init,

    /// Print the version
    Version,
}

fn main() {
    let cli = Cli::parse();

    // stdout belongs to the credential helper protocol
    let filter = EnvFilter::try_from_env(ENV_MAGIC_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    magic_cli::init_logging(filter);

    let result = match cli.command {
        Commands::Get => commands::get(),
        Commands::Env => commands::env().map(|_| 0),
        Commands::Init => commands::init().map(|_| 0),
        Commands::Version => {
            commands::version();
            Ok(0)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("[magic] {:#}", e);
            std::process::exit(1);
        }
    }
}
