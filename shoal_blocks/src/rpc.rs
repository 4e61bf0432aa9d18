//! Wire protocol for the block service.

use serde::{Deserialize, Serialize};
use shoal_core::BlockHash;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockRequest {
    /// Store a block under its content hash.
    Store { hash: BlockHash, block: Vec<u8> },
    /// Fetch the block stored under a hash.
    Get { hash: BlockHash },
    /// Ask whether a block is present.
    Has { hash: BlockHash },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockResponse {
    /// The block was stored (or was already present).
    Stored,
    Block(Vec<u8>),
    Has(bool),
    /// No block is stored under the requested hash.
    NotFound(BlockHash),
}
