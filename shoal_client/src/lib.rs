//! The Shoal sync client.
//!
//! A client connects to the metadata service and to the block shards of
//! one cluster and drives three operations: upload a local file under
//! its basename, download a file into a directory (reusing chunks that
//! already exist on disk there), and delete a file.
//!
//! Uploads negotiate with the metadata service's structured errors:
//! `MissingBlocks` means "push these to their shards and retry the same
//! version", `WrongVersion` means "another writer won; retry one past
//! the version they committed". The loops terminate because missing
//! blocks are idempotently repairable and every lost race names a
//! strictly higher version.

use std::path::PathBuf;

use tokio::sync::OnceCell;

use shoal_blocks::{BlockClient, BlockError};
use shoal_core::{BlockHash, ClusterConfig, Endpoint, RpcError, shard_for};
use shoal_meta::{MetaClient, MetaError};

mod sync;

pub use sync::Outcome;

/// Client-side failure of a sync operation.
///
/// Anything here aborts the operation; the retriable metadata errors
/// are handled inside the loops and never escape as `Meta`.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error("metadata service rejected the request: {0}")]
    Meta(#[from] MetaError),
    #[error("path has no UTF-8 file name: {0}")]
    BadFileName(PathBuf),
    #[error("metadata service reported a missing block the client never hashed: {0}")]
    UnknownMissingBlock(BlockHash),
}

/// A connected sync client for one cluster.
pub struct SyncClient {
    meta: MetaClient,
    shards: Vec<LazyShard>,
}

/// One shard endpoint whose connection opens on first use and then
/// stays open for the process lifetime.
struct LazyShard {
    endpoint: Endpoint,
    client: OnceCell<BlockClient>,
}

impl LazyShard {
    async fn get(&self) -> Result<&BlockClient, RpcError> {
        self.client
            .get_or_try_init(|| BlockClient::connect(&self.endpoint))
            .await
    }
}

impl SyncClient {
    /// Connects to the metadata service now; shard connections are
    /// opened lazily as blocks route to them.
    pub async fn connect(config: &ClusterConfig) -> Result<Self, RpcError> {
        let meta = MetaClient::connect(&config.metadata).await?;
        let shards = config
            .shards
            .iter()
            .cloned()
            .map(|endpoint| LazyShard {
                endpoint,
                client: OnceCell::new(),
            })
            .collect();
        Ok(Self { meta, shards })
    }

    /// The shard that owns `hash`, connected.
    async fn shard(&self, hash: &BlockHash) -> Result<&BlockClient, RpcError> {
        self.shards[shard_for(hash, self.shards.len())].get().await
    }
}
