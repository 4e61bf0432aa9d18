use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use shoal_blocks::{BlockApi, BlockError};
use shoal_core::{BlockHash, Connection, shard_for};

use crate::registry::Registry;
use crate::rpc::{MetaError, MetaRequest, MetaResponse};

/// A write that could not commit: either a protocol error to report to
/// the caller, or a shard probe that failed at the transport level.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Meta(#[from] MetaError),
    #[error("shard probe failed: {0}")]
    Probe(#[source] BlockError),
}

/// The registry plus a handle to every block shard.
///
/// All operations serialize through one lock, so per filename the
/// version chain is a total order: of two concurrent modifies naming
/// the same version, exactly one commits and the other observes
/// `WrongVersion`. The shard presence probes run inside the modify
/// critical section; shards never delete blocks, so a hash observed
/// present at probe time is still present at commit time.
///
/// Generic over the shard handle so tests can probe in-process stores
/// and production can probe over TCP.
pub struct MetadataService<B> {
    registry: Mutex<Registry>,
    shards: Vec<B>,
}

impl<B: BlockApi> MetadataService<B> {
    /// `shards` must be in index order; a hash `h` is probed on
    /// `shards[shard_for(h, shards.len())]`.
    pub fn new(shards: Vec<B>) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            shards,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub async fn read_file(&self, filename: &str) -> (u64, Vec<BlockHash>) {
        let registry = self.registry.lock().await;
        let (version, hashlist) = registry.read(filename);
        debug!(filename, version, "read_file");
        (version, hashlist)
    }

    /// The modify protocol, in order: version check, presence probes for
    /// every hash the current record does not already carry, commit.
    /// Nothing changes on failure.
    pub async fn modify_file(
        &self,
        filename: &str,
        version: u64,
        hashlist: Vec<BlockHash>,
    ) -> Result<(), ServiceError> {
        let mut registry = self.registry.lock().await;
        registry.check_version(filename, version)?;

        let mut missing = Vec::new();
        for hash in registry.novel_hashes(filename, &hashlist) {
            let shard = shard_for(&hash, self.shards.len());
            let present = self.shards[shard]
                .has_block(hash)
                .await
                .map_err(ServiceError::Probe)?;
            if !present {
                missing.push(hash);
            }
        }
        if !missing.is_empty() {
            debug!(filename, version, missing = missing.len(), "modify_file rejected");
            return Err(MetaError::MissingBlocks(missing).into());
        }

        registry.commit_modify(filename, version, hashlist);
        info!(filename, version, "modify_file committed");
        Ok(())
    }

    pub async fn delete_file(&self, filename: &str, version: u64) -> Result<(), MetaError> {
        let mut registry = self.registry.lock().await;
        registry.delete(filename, version)?;
        info!(filename, version, "delete_file committed");
        Ok(())
    }
}

/// Serves a [`MetadataService`] over TCP.
pub struct MetadataServer<B> {
    service: Arc<MetadataService<B>>,
}

impl<B: BlockApi> MetadataServer<B> {
    pub fn new(service: MetadataService<B>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Accept loop. Runs until the listener itself fails.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!(%peer, "metadata service: connection accepted");
            let service = self.service.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(service, stream).await {
                    warn!(%peer, "metadata service: connection failed: {err}");
                }
            });
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ConnectionError {
    #[error(transparent)]
    Rpc(#[from] shoal_core::RpcError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

async fn handle_connection<B: BlockApi>(
    service: Arc<MetadataService<B>>,
    stream: TcpStream,
) -> Result<(), ConnectionError> {
    let mut conn = Connection::new(stream);
    while let Some(request) = conn.next::<MetaRequest>().await? {
        let response = match request {
            MetaRequest::Read { filename } => {
                let (version, hashlist) = service.read_file(&filename).await;
                MetaResponse::File { version, hashlist }
            }
            MetaRequest::Modify {
                filename,
                version,
                hashlist,
            } => match service.modify_file(&filename, version, hashlist).await {
                Ok(()) => MetaResponse::Done,
                Err(ServiceError::Meta(err)) => MetaResponse::Failed(err),
                // A probe failure is not one of the protocol's error
                // kinds; dropping the connection surfaces it to the
                // caller as a transport failure.
                Err(err) => return Err(err.into()),
            },
            MetaRequest::Delete { filename, version } => {
                match service.delete_file(&filename, version).await {
                    Ok(()) => MetaResponse::Done,
                    Err(err) => MetaResponse::Failed(err),
                }
            }
        };
        conn.send(&response).await?;
    }
    Ok(())
}
