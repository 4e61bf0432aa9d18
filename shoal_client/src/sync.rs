//! The three sync operations and their reconciliation loops.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, info, warn};

use shoal_blocks::BlockApi;
use shoal_core::{BlockHash, CHUNK_SIZE, chunk_hashes};
use shoal_meta::{MetaCallError, MetaError};

use crate::{SyncClient, SyncError};

/// Protocol outcome of a sync operation: the one-line verdict the CLI
/// prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation committed.
    Ok,
    /// The target does not exist: locally for upload, on the cluster
    /// for download and delete.
    NotFound,
}

impl SyncClient {
    /// Uploads one local file under its basename.
    pub async fn upload(&self, path: &Path) -> Result<Outcome, SyncError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                warn!(path = %path.display(), "upload target is not a regular file");
                return Ok(Outcome::NotFound);
            }
        }
        let filename = basename(path)?;
        let bytes = Bytes::from(tokio::fs::read(path).await?);
        let chunks = chunk_hashes(&bytes);
        let hashlist: Vec<BlockHash> = chunks.iter().map(|(hash, _)| *hash).collect();
        let by_hash: HashMap<BlockHash, Bytes> = chunks.into_iter().collect();
        debug!(filename = %filename, blocks = hashlist.len(), "upload: chunked local file");

        let (current, _) = self.meta.read_file(&filename).await?;
        let mut version = current + 1;
        loop {
            match self
                .meta
                .modify_file(&filename, version, hashlist.clone())
                .await
            {
                Ok(()) => {
                    info!(filename = %filename, version, "upload committed");
                    return Ok(Outcome::Ok);
                }
                Err(MetaCallError::Service(MetaError::MissingBlocks(missing))) => {
                    debug!(filename = %filename, missing = missing.len(), "upload: pushing missing blocks");
                    self.push_blocks(&by_hash, &missing).await?;
                    // Retry with the same version: only the shards changed.
                }
                Err(MetaCallError::Service(MetaError::WrongVersion(current))) => {
                    debug!(filename = %filename, current, "upload: lost a version race, retrying");
                    version = current + 1;
                }
                Err(MetaCallError::Service(err)) => return Err(err.into()),
                Err(MetaCallError::Rpc(err)) => return Err(err.into()),
            }
        }
    }

    /// Sends every named block to its owning shard. The hashes came from
    /// chunking the local file, so each one must have a local chunk.
    async fn push_blocks(
        &self,
        by_hash: &HashMap<BlockHash, Bytes>,
        missing: &[BlockHash],
    ) -> Result<(), SyncError> {
        for hash in missing {
            let block = by_hash
                .get(hash)
                .ok_or(SyncError::UnknownMissingBlock(*hash))?;
            self.shard(hash).await?.store_block(*hash, block.clone()).await?;
        }
        Ok(())
    }

    /// Downloads `filename` into `dst_dir`, reusing chunks already
    /// present in files there instead of fetching them.
    pub async fn download(&self, filename: &str, dst_dir: &Path) -> Result<Outcome, SyncError> {
        let (_, hashlist) = self.meta.read_file(filename).await?;
        if hashlist.is_empty() {
            // Never existed, tombstoned, or empty: nothing to fetch.
            warn!(filename, "download: no live file under that name");
            return Ok(Outcome::NotFound);
        }

        let mut cache = scan_local_chunks(dst_dir, &hashlist).await?;
        let reused = cache.len();

        let mut contents = Vec::with_capacity(hashlist.len() * CHUNK_SIZE);
        for hash in &hashlist {
            match cache.get(hash) {
                Some(chunk) => contents.extend_from_slice(chunk),
                None => {
                    let block = self.shard(hash).await?.get_block(*hash).await?;
                    contents.extend_from_slice(&block);
                    // A hash repeated later in the list is fetched once.
                    cache.insert(*hash, block);
                }
            }
        }
        debug!(filename, blocks = hashlist.len(), reused, "download: assembled blocks");

        tokio::fs::write(dst_dir.join(filename), &contents).await?;
        info!(filename, bytes = contents.len(), "download complete");
        Ok(Outcome::Ok)
    }

    /// Deletes `filename` on the metadata service.
    pub async fn delete(&self, filename: &str) -> Result<Outcome, SyncError> {
        let (current, _) = self.meta.read_file(filename).await?;
        let mut version = current + 1;
        loop {
            match self.meta.delete_file(filename, version).await {
                Ok(()) => {
                    info!(filename, version, "delete committed");
                    return Ok(Outcome::Ok);
                }
                Err(MetaCallError::Service(MetaError::WrongVersion(current))) => {
                    debug!(filename, current, "delete: lost a version race, retrying");
                    version = current + 1;
                }
                Err(MetaCallError::Service(MetaError::FileNotFound)) => {
                    warn!(filename, "delete: no such file on the cluster");
                    return Ok(Outcome::NotFound);
                }
                Err(MetaCallError::Service(err)) => return Err(err.into()),
                Err(MetaCallError::Rpc(err)) => return Err(err.into()),
            }
        }
    }
}

fn basename(path: &Path) -> Result<String, SyncError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| SyncError::BadFileName(path.to_path_buf()))
}

/// Chunks every regular file in `dir` and keeps the chunks whose hash
/// the wanted list names. Unreadable entries are logged and skipped;
/// the scan never fails an otherwise-healthy download.
async fn scan_local_chunks(
    dir: &Path,
    wanted: &[BlockHash],
) -> Result<HashMap<BlockHash, Bytes>, SyncError> {
    let wanted: HashSet<&BlockHash> = wanted.iter().collect();
    let mut cache = HashMap::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => {}
            Ok(_) => continue,
            Err(err) => {
                warn!(path = %path.display(), "skipping unreadable entry: {err}");
                continue;
            }
        }
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                warn!(path = %path.display(), "skipping unreadable file: {err}");
                continue;
            }
        };
        for (hash, chunk) in chunk_hashes(&bytes) {
            if wanted.contains(&hash) {
                cache.entry(hash).or_insert(chunk);
            }
        }
    }
    Ok(cache)
}
