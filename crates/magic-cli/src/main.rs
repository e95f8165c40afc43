//! docker-credential-magician - augment images with docker-credential-magic

use clap::{Parser, Subcommand};
use magic_cli::commands::{self, MutateArgs};
use magic_config::{expand_path, MagicianConfig};
use magic_registry::{OciRegistry, RegistrySettings};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docker-credential-magician")]
#[command(
    author,
    version,
    about = "Augment container images with docker-credential-magic",
    long_about = None
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.config/magic/magician.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add credential helpers to an image and push it
    Mutate(MutateArgs),

    /// Show the effective configuration
    Config,

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    magic_cli::init_logging(filter);

    let config_path = match &cli.config {
        Some(path) => expand_path(path),
        None => magic_config::magician_config_path()?,
    };
    let config = MagicianConfig::load_from(&config_path)?;
    tracing::debug!("Using config {:?}", config_path);

    match cli.command {
        Commands::Mutate(args) => {
            let request = commands::build_request(args, &config.mutate);
            let registry = OciRegistry::new(RegistrySettings {
                insecure: config.registry.insecure.clone(),
            });
            commands::mutate(registry, request).await?;
        }
        Commands::Config => commands::config(&config_path, &config)?,
        Commands::Version => commands::version(),
    }

    Ok(())
}
