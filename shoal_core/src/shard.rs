//! Shard routing for content hashes.

use crate::hash::BlockHash;

/// Owning shard for a hash: the digest taken as a 256-bit big-endian
/// integer, modulo the shard count.
///
/// The client and the metadata service both route with this function and
/// must agree on it, which is why it lives in the core crate instead of
/// being reimplemented per tier. The fold keeps the running remainder
/// below `shard_count`, so the `u128` intermediate never overflows.
pub fn shard_for(hash: &BlockHash, shard_count: usize) -> usize {
    debug_assert!(shard_count > 0, "shard routing over an empty pool");
    let n = shard_count as u128;
    hash.as_bytes()
        .iter()
        .fold(0u128, |acc, byte| (acc * 256 + u128::from(*byte)) % n) as usize
}
