//! In-process cluster harness for the end-to-end tests: real TCP
//! servers on ephemeral localhost ports, wired together exactly as the
//! `blockstore` and `metastore` binaries wire them.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tokio::net::TcpListener;

use shoal_blocks::{BlockApi, BlockClient, BlockResult, BlockServer, MemoryBlockStore};
use shoal_core::{BlockHash, ClusterConfig, Endpoint};
use shoal_meta::{MetadataServer, MetadataService};

/// Per-shard traffic counters, shared with the spawned server so tests
/// can assert how much block traffic an operation generated.
#[derive(Clone, Debug, Default)]
pub struct ShardStats {
    stores: Arc<AtomicUsize>,
    fetches: Arc<AtomicUsize>,
}

impl ShardStats {
    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct CountingStore {
    inner: MemoryBlockStore,
    stats: ShardStats,
}

#[async_trait::async_trait]
impl BlockApi for CountingStore {
    async fn store_block(&self, hash: BlockHash, block: Bytes) -> BlockResult<()> {
        self.stats.stores.fetch_add(1, Ordering::SeqCst);
        self.inner.store_block(hash, block).await
    }

    async fn get_block(&self, hash: BlockHash) -> BlockResult<Bytes> {
        self.stats.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.get_block(hash).await
    }

    async fn has_block(&self, hash: BlockHash) -> BlockResult<bool> {
        self.inner.has_block(hash).await
    }
}

/// Starts `shard_count` block services and one metadata service,
/// returning the cluster config a client would load from disk plus the
/// per-shard traffic counters.
pub async fn start_cluster(shard_count: usize) -> (ClusterConfig, Vec<ShardStats>) {
    let mut shards = Vec::new();
    let mut stats = Vec::new();
    for _ in 0..shard_count {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("bind shard listener");
        shards.push(local_endpoint(&listener));
        let shard_stats = ShardStats::default();
        stats.push(shard_stats.clone());
        tokio::spawn(async move {
            let server = BlockServer::new(CountingStore {
                inner: MemoryBlockStore::new(),
                stats: shard_stats,
            });
            server.serve(listener).await.expect("block server");
        });
    }

    let mut shard_clients = Vec::new();
    for endpoint in &shards {
        shard_clients.push(BlockClient::connect(endpoint).await.expect("connect shard"));
    }
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind metadata listener");
    let metadata = local_endpoint(&listener);
    tokio::spawn(async move {
        let server = MetadataServer::new(MetadataService::new(shard_clients));
        server.serve(listener).await.expect("metadata server");
    });

    (ClusterConfig { metadata, shards }, stats)
}

fn local_endpoint(listener: &TcpListener) -> Endpoint {
    let addr = listener.local_addr().expect("local addr");
    Endpoint {
        host: addr.ip().to_string(),
        port: addr.port(),
    }
}

/// Deterministic pseudo-random payload, long-period so distinct chunks
/// of one file never collide.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    let mut state = u32::from(seed).wrapping_mul(2654435761).wrapping_add(12345);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 24) as u8
        })
        .collect()
}
