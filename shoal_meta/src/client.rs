use tokio::sync::Mutex;

use shoal_core::{BlockHash, Connection, Endpoint, RpcError};

use crate::rpc::{MetaError, MetaRequest, MetaResponse};

/// Failure of a metadata call, seen from the client side.
///
/// Service errors are the protocol's structured union and drive the
/// retry loops; transport errors abort them.
#[derive(Debug, thiserror::Error)]
pub enum MetaCallError {
    #[error(transparent)]
    Service(#[from] MetaError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Client side of the metadata service, over one long-lived connection.
#[derive(Debug)]
pub struct MetaClient {
    conn: Mutex<Connection>,
}

impl MetaClient {
    pub async fn connect(endpoint: &Endpoint) -> Result<Self, RpcError> {
        Ok(Self {
            conn: Mutex::new(Connection::connect(endpoint).await?),
        })
    }

    async fn call(&self, request: &MetaRequest) -> Result<MetaResponse, RpcError> {
        self.conn.lock().await.call(request).await
    }

    /// Never fails at the protocol level: unknown names read as `(0, [])`.
    pub async fn read_file(&self, filename: &str) -> Result<(u64, Vec<BlockHash>), RpcError> {
        match self
            .call(&MetaRequest::Read {
                filename: filename.to_string(),
            })
            .await?
        {
            MetaResponse::File { version, hashlist } => Ok((version, hashlist)),
            _ => Err(RpcError::UnexpectedMessage),
        }
    }

    pub async fn modify_file(
        &self,
        filename: &str,
        version: u64,
        hashlist: Vec<BlockHash>,
    ) -> Result<(), MetaCallError> {
        match self
            .call(&MetaRequest::Modify {
                filename: filename.to_string(),
                version,
                hashlist,
            })
            .await?
        {
            MetaResponse::Done => Ok(()),
            MetaResponse::Failed(err) => Err(err.into()),
            MetaResponse::File { .. } => Err(RpcError::UnexpectedMessage.into()),
        }
    }

    pub async fn delete_file(&self, filename: &str, version: u64) -> Result<(), MetaCallError> {
        match self
            .call(&MetaRequest::Delete {
                filename: filename.to_string(),
                version,
            })
            .await?
        {
            MetaResponse::Done => Ok(()),
            MetaResponse::Failed(err) => Err(err.into()),
            MetaResponse::File { .. } => Err(RpcError::UnexpectedMessage.into()),
        }
    }
}
