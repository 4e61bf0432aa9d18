//! Wire protocol for the metadata service.

use serde::{Deserialize, Serialize};
use shoal_core::BlockHash;

/// Structured failure of a metadata operation.
///
/// This enum is both the service's error type and the RPC error payload;
/// the client's retry loops dispatch on it. Transport failures are a
/// separate concern and never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MetaError {
    /// A modify referenced hashes that are absent from their owning
    /// shard, listed in the order the request named them.
    #[error("{} referenced block(s) are not on their shard", .0.len())]
    MissingBlocks(Vec<BlockHash>),
    /// The submitted version is not `current + 1`; the payload is the
    /// current version.
    #[error("wrong version: the current version is {0}")]
    WrongVersion(u64),
    /// A delete named a filename with no record.
    #[error("file not found")]
    FileNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MetaRequest {
    /// `read_file`: current version and hashlist for a filename.
    Read { filename: String },
    /// `modify_file`: publish a new hashlist at `version`.
    Modify {
        filename: String,
        version: u64,
        hashlist: Vec<BlockHash>,
    },
    /// `delete_file`: tombstone the filename at `version`.
    Delete { filename: String, version: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MetaResponse {
    /// Reply to `Read`; reads never fail.
    File {
        version: u64,
        hashlist: Vec<BlockHash>,
    },
    /// A modify or delete committed.
    Done,
    Failed(MetaError),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The tri-state error union must survive a postcard round trip with
    /// its payloads (including the order of the missing-blocks list)
    /// intact.
    #[test]
    fn error_postcard_round_trip() {
        let missing = vec![BlockHash::new(b"one"), BlockHash::new(b"two")];
        let bytes = postcard::to_allocvec(&MetaResponse::Failed(MetaError::MissingBlocks(
            missing.clone(),
        )))
        .expect("serialize");
        match postcard::from_bytes(&bytes).expect("deserialize") {
            MetaResponse::Failed(MetaError::MissingBlocks(list)) => assert_eq!(list, missing),
            other => panic!("wrong variant: {other:?}"),
        }

        let bytes = postcard::to_allocvec(&MetaError::WrongVersion(7)).expect("serialize");
        assert_eq!(
            postcard::from_bytes::<MetaError>(&bytes).expect("deserialize"),
            MetaError::WrongVersion(7)
        );
    }

    #[test]
    fn request_postcard_round_trip() {
        let hashlist = vec![BlockHash::new(b"chunk")];
        let bytes = postcard::to_allocvec(&MetaRequest::Modify {
            filename: "notes.txt".to_string(),
            version: 3,
            hashlist: hashlist.clone(),
        })
        .expect("serialize");
        match postcard::from_bytes(&bytes).expect("deserialize") {
            MetaRequest::Modify {
                filename,
                version,
                hashlist: list,
            } => {
                assert_eq!(filename, "notes.txt");
                assert_eq!(version, 3);
                assert_eq!(list, hashlist);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }
}
