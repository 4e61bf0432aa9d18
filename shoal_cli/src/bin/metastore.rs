use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::InfoLevel;
use tokio::net::TcpListener;
use tracing::info;

use shoal_blocks::BlockClient;
use shoal_core::ClusterConfig;
use shoal_meta::{MetadataServer, MetadataService};

/// Serve the metadata registry for a Shoal cluster.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// cluster config file
    config: PathBuf,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,
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

    // Shard connections are established up front: a metadata service
    // that cannot probe its shards cannot admit any modify.
    let mut shards = Vec::with_capacity(config.shard_count());
    for endpoint in &config.shards {
        let shard = BlockClient::connect(endpoint)
            .await
            .with_context(|| format!("failed to reach block shard {endpoint}"))?;
        shards.push(shard);
    }

    let listener = TcpListener::bind(("0.0.0.0", config.metadata.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.metadata.port))?;
    info!(
        port = config.metadata.port,
        shards = config.shard_count(),
        "metadata service listening"
    );

    let server = MetadataServer::new(MetadataService::new(shards));
    server.serve(listener).await?;
    Ok(())
}
