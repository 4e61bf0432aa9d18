//! The content hash used by Shoal (SHA-256, 32 bytes)

use std::{borrow::Borrow, fmt, str::FromStr};

use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content hash of one block (SHA-256, 32 bytes).
///
/// The canonical text form is 64 lowercase hex characters; that form is
/// what shard routing is defined over and what appears on the wire when
/// humans read logs.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlockHash").field(&DD(self.to_hex())).finish()
    }
}

struct DD<T: fmt::Display>(T);

impl<T: fmt::Display> fmt::Debug for DD<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl BlockHash {
    /// Calculate the hash of the provided bytes.
    pub fn new(buf: impl AsRef<[u8]>) -> Self {
        BlockHash(Sha256::digest(buf.as_ref()).into())
    }

    /// Bytes of the hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create a `BlockHash` from its raw bytes representation.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Convert the hash to its canonical lowercase hex string.
    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }

    /// Convert to a hex string limited to the first 5 bytes for a friendly
    /// string representation of the hash.
    pub fn fmt_short(&self) -> String {
        HEXLOWER.encode(&self.0[..5])
    }
}

/// Error parsing the canonical hex form of a [`BlockHash`].
#[derive(thiserror::Error, Debug)]
pub enum ParseHashError {
    #[error("invalid digest length: expected 64 hex chars, got {0}")]
    Length(usize),
    #[error("invalid hex digest: {0}")]
    Hex(#[from] data_encoding::DecodeError),
}

impl FromStr for BlockHash {
    type Err = ParseHashError;

    /// Accepts exactly the canonical form: 64 lowercase hex characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(ParseHashError::Length(s.len()));
        }
        let decoded = HEXLOWER.decode(s.as_bytes())?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(BlockHash(bytes))
    }
}

impl AsRef<[u8]> for BlockHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for BlockHash {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8; 32]> for BlockHash {
    fn borrow(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(value: [u8; 32]) -> Self {
        BlockHash(value)
    }
}

impl From<BlockHash> for [u8; 32] {
    fn from(value: BlockHash) -> Self {
        value.0
    }
}

impl PartialOrd for BlockHash {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

impl Ord for BlockHash {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
