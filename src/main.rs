use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use nodemark::client::http::HttpNodeClient;
use nodemark::client::NodeClient;
use nodemark::config::Config;
use nodemark::sampler::Outcome;

#[derive(Parser)]
#[command(
    name = "nodemark",
    about = "Long-running upload benchmark for storage-network nodes",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark until an exit condition fires
    Run {
        /// Config file path; created from the default template if missing
        #[arg(long, default_value = "benchmark.toml")]
        config: PathBuf,
    },

    /// Write the default config template and exit
    InitConfig {
        /// Where to write the template
        #[arg(long, default_value = "benchmark.toml")]
        path: PathBuf,
    },

    /// Connect to the node and print its version
    VersionCheck {
        /// Config file path
        #[arg(long, default_value = "benchmark.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Exit codes: 0 benchmark success, 1 benchmark failure, 2 operational
    // error. The run's verdict must be distinguishable by code alone.
    match try_main().await {
        Ok(Outcome::Success) => {}
        Ok(Outcome::Failure) => std::process::exit(1),
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "fatal");
            std::process::exit(2);
        }
    }
}

async fn try_main() -> Result<Outcome> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = Config::load(&config)?;
            nodemark::run(config).await
        }
        Commands::InitConfig { path } => {
            anyhow::ensure!(!path.exists(), "{path:?} already exists, refusing to overwrite");
            std::fs::write(&path, nodemark::config::DEFAULT_CONFIG)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(Outcome::Success)
        }
        Commands::VersionCheck { config } => {
            let config = Config::load(&config)?;
            let client = HttpNodeClient::new(&config)?;
            let version = client.version().await?;
            println!("Connected to node {} (rev {})", version.version, version.revision);
            Ok(Outcome::Success)
        }
    }
}
