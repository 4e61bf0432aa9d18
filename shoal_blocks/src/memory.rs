use bytes::Bytes;
use dashmap::DashMap;
use shoal_core::BlockHash;

use crate::{BlockApi, BlockError, BlockResult};

/// In-memory block store backing one shard.
///
/// Process-lifetime only: contents are lost on restart, and nothing is
/// ever evicted. Operations on distinct hashes proceed in parallel.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: DashMap<BlockHash, Bytes>,
}

impl MemoryBlockStore {
    /// Creates a new, empty `MemoryBlockStore`.
    pub fn new() -> Self {
        Self {
            blocks: DashMap::new(),
        }
    }

    /// Number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[async_trait::async_trait]
impl BlockApi for MemoryBlockStore {
    async fn store_block(&self, hash: BlockHash, block: Bytes) -> BlockResult<()> {
        // An existing entry already holds these bytes: the key is the
        // content hash.
        self.blocks.entry(hash).or_insert(block);
        Ok(())
    }

    async fn get_block(&self, hash: BlockHash) -> BlockResult<Bytes> {
        self.blocks
            .get(&hash)
            .map(|block| block.clone())
            .ok_or(BlockError::NotFound(hash))
    }

    async fn has_block(&self, hash: BlockHash) -> BlockResult<bool> {
        Ok(self.blocks.contains_key(&hash))
    }
}
