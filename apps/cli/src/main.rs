//! ModelFetch CLI
//!
//! Downloads model assets from a CivitAI-style hosting API, by direct URL
//! or by model/version ID.

mod commands;
mod output;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use modelfetch_types::FetcherConfig;
use std::path::PathBuf;

/// ModelFetch - model asset downloader
#[derive(Parser)]
#[command(name = "modelfetch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API token sent as the Bearer credential
    #[arg(long, global = true, env = "CIVITAI_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Destination directory for downloaded files
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Base URL of the metadata API
    #[arg(long, global = true, hide = true)]
    api_base: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a single file from a direct download URL
    Url {
        /// Download URL
        url: String,
    },

    /// Download the primary file of a model version
    Model {
        /// Model version ID
        id: u64,
    },

    /// Download every file of a model version
    Version {
        /// Model version ID
        id: u64,
    },

    /// Download every file across all versions of a model
    Batch {
        /// Model ID
        id: u64,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = FetcherConfig {
        token: cli.token,
        ..FetcherConfig::default()
    };
    if let Some(output) = cli.output {
        config.destination = output;
    }
    if let Some(api_base) = cli.api_base {
        config.api_base_url = api_base;
    }

    match cli.command {
        Commands::Url { url } => commands::download_url(config, &url).await?,

        Commands::Model { id } => commands::download_model(config, id).await?,

        Commands::Version { id } => commands::download_version(config, id).await?,

        Commands::Batch { id } => commands::download_batch(config, id).await?,

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "modelfetch",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
