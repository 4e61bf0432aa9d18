//! Block tier: content-addressed storage of file chunks.
//!
//! A block service is a flat hash → bytes store. Blocks are immutable and
//! never deleted; `store` is idempotent because the key is derived from
//! the content. The service knows nothing about files — how blocks relate
//! to filenames lives entirely in the metadata tier.
//!
//! [`BlockApi`] is the seam between the in-process [`MemoryBlockStore`]
//! and the TCP [`BlockClient`]. The metadata service's presence probes,
//! the sync client, and tests all talk to "a shard" through it without
//! caring which side of a socket the blocks live on.

use bytes::Bytes;
use shoal_core::BlockHash;

mod client;
mod memory;
pub mod rpc;
mod server;

pub use client::BlockClient;
pub use memory::MemoryBlockStore;
pub use server::BlockServer;

pub type BlockResult<T, E = BlockError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("no block stored for hash {0}")]
    NotFound(BlockHash),
    #[error(transparent)]
    Rpc(#[from] shoal_core::RpcError),
}

/// The three block-service operations, keyed by content hash.
#[async_trait::async_trait]
pub trait BlockApi: Send + Sync + 'static {
    /// Stores `block` under `hash`. Idempotent: a block that is already
    /// present is left untouched, since the key is content-derived.
    async fn store_block(&self, hash: BlockHash, block: Bytes) -> BlockResult<()>;

    /// Returns the block stored under `hash`, or [`BlockError::NotFound`].
    async fn get_block(&self, hash: BlockHash) -> BlockResult<Bytes>;

    /// Reports whether a block is stored under `hash`.
    async fn has_block(&self, hash: BlockHash) -> BlockResult<bool>;
}
