use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;

use shoal_client::{Outcome, SyncClient};
use shoal_core::ClusterConfig;

/// Sync files against a Shoal cluster.
///
/// Prints exactly one line to stdout: `OK` on success or `Not Found`
/// when the target does not exist. Everything else goes to stderr.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// cluster config file
    config: PathBuf,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file under its basename
    Upload { filepath: PathBuf },
    /// Download a file into a directory, reusing blocks already there
    Download { filename: String, dst_dir: PathBuf },
    /// Delete a file
    Delete { filename: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let config = ClusterConfig::load(&cli.config)
        .with_context(|| format!("failed to load config file {:?}", cli.config))?;
    let client = SyncClient::connect(&config)
        .await
        .context("failed to reach the metadata service")?;

    let outcome = match cli.cmd {
        Commands::Upload { filepath } => client.upload(&filepath).await?,
        Commands::Download { filename, dst_dir } => client.download(&filename, &dst_dir).await?,
        Commands::Delete { filename } => client.delete(&filename).await?,
    };

    match outcome {
        Outcome::Ok => println!("OK"),
        Outcome::NotFound => println!("Not Found"),
    }
    Ok(())
}
