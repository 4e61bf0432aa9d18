//! Fixed-size chunking of file contents.

use bytes::Bytes;

use crate::hash::BlockHash;

/// Size of one file chunk in bytes. The final chunk of a non-empty file
/// may be shorter; an empty file has no chunks at all.
pub const CHUNK_SIZE: usize = 4096;

/// Splits `bytes` into [`CHUNK_SIZE`] chunks without copying.
pub fn split_chunks(bytes: &Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(CHUNK_SIZE));
    let mut offset = 0;
    while offset < bytes.len() {
        let end = usize::min(offset + CHUNK_SIZE, bytes.len());
        chunks.push(bytes.slice(offset..end));
        offset = end;
    }
    chunks
}

/// Splits `bytes` into chunks and pairs each chunk with its content hash,
/// preserving file order. Concatenating the chunks in order reproduces
/// the input.
pub fn chunk_hashes(bytes: &Bytes) -> Vec<(BlockHash, Bytes)> {
    split_chunks(bytes)
        .into_iter()
        .map(|chunk| (BlockHash::new(&chunk), chunk))
        .collect()
}
