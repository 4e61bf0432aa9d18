//! Metadata tier: the per-filename version + hashlist registry.
//!
//! Every filename maps to a [`registry::FileRecord`]: a monotonically
//! increasing version, the ordered hashlist that reconstructs the file,
//! and a tombstone flag. Writers negotiate with optimistic concurrency:
//! a modify or delete must name exactly `current + 1` as its version, and
//! the structured [`MetaError`] union tells a client how to repair and
//! retry (`MissingBlocks` → push blocks and retry the same version,
//! `WrongVersion` → bump to `current + 1` and retry).
//!
//! Before committing a modify, the service probes the owning block shard
//! for every hash the file does not already carry; a successful modify
//! therefore only ever publishes hashlists whose blocks exist. Shards
//! never delete blocks, so the probe result stays true through commit.

pub mod registry;
pub mod rpc;

mod client;
mod server;

pub use client::{MetaCallError, MetaClient};
pub use registry::{FileRecord, Registry};
pub use rpc::{MetaError, MetaRequest, MetaResponse};
pub use server::{MetadataServer, MetadataService, ServiceError};
