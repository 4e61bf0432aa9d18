//! Core Shoal types and plumbing.
//!
//! This crate defines what the three tiers of a Shoal cluster share:
//!
//! - Content hashes ([`hash::BlockHash`]): SHA-256, rendered as lowercase hex
//! - Chunking of file contents at a fixed block size ([`chunk`])
//! - Shard routing ([`shard::shard_for`]): which block service owns a hash.
//!   The client and the metadata service both compute this locally, so the
//!   function lives here rather than being duplicated per tier.
//! - The cluster configuration file ([`config`])
//! - Framed request/response connections ([`net`]): length-delimited frames
//!   carrying postcard-encoded messages over TCP
//!
//! The hash, chunk, and shard definitions are wire-stable: they decide which
//! bytes land on which shard and how files are reassembled, so changes to
//! them are protocol changes.

pub mod chunk;
pub mod config;
pub mod hash;
pub mod net;
pub mod shard;

pub use chunk::{CHUNK_SIZE, chunk_hashes, split_chunks};
pub use config::{ClusterConfig, ConfigError, Endpoint};
pub use hash::BlockHash;
pub use net::{Connection, RpcError};
pub use shard::shard_for;
