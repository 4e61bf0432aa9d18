use bytes::Bytes;
use tokio::sync::Mutex;

use shoal_core::{BlockHash, Connection, Endpoint, RpcError};

use crate::rpc::{BlockRequest, BlockResponse};
use crate::{BlockApi, BlockError, BlockResult};

/// Client side of one block shard.
///
/// Holds a single long-lived connection. Requests are serialized on it,
/// which matches how every holder in the system uses its shard
/// connections.
#[derive(Debug)]
pub struct BlockClient {
    conn: Mutex<Connection>,
}

impl BlockClient {
    pub async fn connect(endpoint: &Endpoint) -> Result<Self, RpcError> {
        Ok(Self {
            conn: Mutex::new(Connection::connect(endpoint).await?),
        })
    }

    async fn call(&self, request: &BlockRequest) -> Result<BlockResponse, RpcError> {
        self.conn.lock().await.call(request).await
    }
}

#[async_trait::async_trait]
impl BlockApi for BlockClient {
    async fn store_block(&self, hash: BlockHash, block: Bytes) -> BlockResult<()> {
        match self.call(&BlockRequest::Store {
            hash,
            block: block.to_vec(),
        })
        .await?
        {
            BlockResponse::Stored => Ok(()),
            _ => Err(RpcError::UnexpectedMessage.into()),
        }
    }

    async fn get_block(&self, hash: BlockHash) -> BlockResult<Bytes> {
        match self.call(&BlockRequest::Get { hash }).await? {
            BlockResponse::Block(block) => Ok(block.into()),
            BlockResponse::NotFound(hash) => Err(BlockError::NotFound(hash)),
            _ => Err(RpcError::UnexpectedMessage.into()),
        }
    }

    async fn has_block(&self, hash: BlockHash) -> BlockResult<bool> {
        match self.call(&BlockRequest::Has { hash }).await? {
            BlockResponse::Has(present) => Ok(present),
            _ => Err(RpcError::UnexpectedMessage.into()),
        }
    }
}
