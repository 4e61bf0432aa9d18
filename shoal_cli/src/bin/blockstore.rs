use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::InfoLevel;
use tokio::net::TcpListener;
use tracing::info;

use shoal_blocks::{BlockServer, MemoryBlockStore};

/// Serve one in-memory block shard.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TCP port to listen on
    port: u16,

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

    let listener = TcpListener::bind(("0.0.0.0", cli.port))
        .await
        .with_context(|| format!("failed to bind port {}", cli.port))?;
    info!(port = cli.port, "block service listening");

    let server = BlockServer::new(MemoryBlockStore::new());
    server.serve(listener).await?;
    Ok(())
}
