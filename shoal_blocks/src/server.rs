use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use shoal_core::Connection;

use crate::rpc::{BlockRequest, BlockResponse};
use crate::{BlockApi, BlockError};

/// Serves any [`BlockApi`] implementation over TCP.
///
/// One task per connection; requests on a connection are handled in
/// order, while independent connections proceed in parallel.
pub struct BlockServer<B> {
    store: Arc<B>,
}

impl<B: BlockApi> BlockServer<B> {
    pub fn new(store: B) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Accept loop. Runs until the listener itself fails.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!(%peer, "block service: connection accepted");
            let store = self.store.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(store, stream).await {
                    warn!(%peer, "block service: connection failed: {err}");
                }
            });
        }
    }
}

async fn handle_connection<B: BlockApi>(
    store: Arc<B>,
    stream: TcpStream,
) -> Result<(), BlockError> {
    let mut conn = Connection::new(stream);
    while let Some(request) = conn.next::<BlockRequest>().await? {
        let response = handle_request(store.as_ref(), request).await?;
        conn.send(&response).await?;
    }
    Ok(())
}

async fn handle_request<B: BlockApi>(
    store: &B,
    request: BlockRequest,
) -> Result<BlockResponse, BlockError> {
    match request {
        BlockRequest::Store { hash, block } => {
            debug!(hash = %hash.fmt_short(), len = block.len(), "store_block");
            store.store_block(hash, block.into()).await?;
            Ok(BlockResponse::Stored)
        }
        BlockRequest::Get { hash } => {
            debug!(hash = %hash.fmt_short(), "get_block");
            match store.get_block(hash).await {
                Ok(block) => Ok(BlockResponse::Block(block.to_vec())),
                Err(BlockError::NotFound(hash)) => Ok(BlockResponse::NotFound(hash)),
                Err(err) => Err(err),
            }
        }
        BlockRequest::Has { hash } => {
            debug!(hash = %hash.fmt_short(), "has_block");
            Ok(BlockResponse::Has(store.has_block(hash).await?))
        }
    }
}
