//! The filename → record map and its transition rules.
//!
//! The registry is pure state: nothing here locks or talks to the
//! network. Serializing callers (one lock over the whole map) and
//! probing shards for block presence are the service's job.

use std::collections::{HashMap, HashSet};

use shoal_core::BlockHash;

use crate::rpc::MetaError;

/// Metadata for one filename.
///
/// A record exists iff the name has had at least one successful modify
/// or delete; a stored record always has `version >= 1`. A tombstoned
/// record keeps its version chain but carries no hashlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecord {
    pub version: u64,
    pub hashlist: Vec<BlockHash>,
    pub tombstone: bool,
}

/// Every filename the cluster has ever committed, mapped to its current
/// record. In-memory and process-lifetime only.
#[derive(Debug, Default)]
pub struct Registry {
    files: HashMap<String, FileRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read never fails: `(0, [])` for a name never seen, `(version, [])`
    /// for a tombstoned name, `(version, hashlist)` otherwise.
    pub fn read(&self, filename: &str) -> (u64, Vec<BlockHash>) {
        match self.files.get(filename) {
            None => (0, Vec::new()),
            Some(record) if record.tombstone => (record.version, Vec::new()),
            Some(record) => (record.version, record.hashlist.clone()),
        }
    }

    fn current_version(&self, filename: &str) -> u64 {
        self.files.get(filename).map_or(0, |record| record.version)
    }

    /// The optimistic-concurrency rule: a write must name exactly one
    /// past the current version.
    pub fn check_version(&self, filename: &str, version: u64) -> Result<(), MetaError> {
        let current = self.current_version(filename);
        if version != current + 1 {
            return Err(MetaError::WrongVersion(current));
        }
        Ok(())
    }

    /// Hashes in `hashlist` that are not part of the file's current
    /// hashlist, in input order, first occurrence only.
    ///
    /// Blocks carried over from the previous version were verified on
    /// their shard when that version committed, so only these need
    /// presence probes. Skipping the carried-over ones is what keeps
    /// version upgrades that reuse blocks from re-validating the world.
    pub fn novel_hashes(&self, filename: &str, hashlist: &[BlockHash]) -> Vec<BlockHash> {
        let current: HashSet<&BlockHash> = self
            .files
            .get(filename)
            .map(|record| record.hashlist.iter().collect())
            .unwrap_or_default();
        let mut seen = HashSet::new();
        hashlist
            .iter()
            .filter(|hash| !current.contains(hash) && seen.insert(**hash))
            .copied()
            .collect()
    }

    /// Installs a new live version. The caller has already validated the
    /// version and the presence of every referenced block.
    pub fn commit_modify(&mut self, filename: &str, version: u64, hashlist: Vec<BlockHash>) {
        let record = self.files.entry(filename.to_string()).or_default();
        record.version = version;
        record.hashlist = hashlist;
        record.tombstone = false;
    }

    /// Applies the delete transition: the name must exist and `version`
    /// must be `current + 1`. Deleting a tombstoned record is permitted;
    /// the version still advances.
    pub fn delete(&mut self, filename: &str, version: u64) -> Result<(), MetaError> {
        let record = self
            .files
            .get_mut(filename)
            .ok_or(MetaError::FileNotFound)?;
        if version != record.version + 1 {
            return Err(MetaError::WrongVersion(record.version));
        }
        record.version = version;
        record.hashlist.clear();
        record.tombstone = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(names: &[&str]) -> Vec<BlockHash> {
        names.iter().map(|name| BlockHash::new(name)).collect()
    }

    #[test]
    fn unknown_names_read_as_version_zero() {
        let registry = Registry::new();
        assert_eq!(registry.read("nope"), (0, Vec::new()));
    }

    #[test]
    fn first_modify_must_name_version_one() {
        let registry = Registry::new();
        assert_eq!(registry.check_version("f", 1), Ok(()));
        assert_eq!(
            registry.check_version("f", 2),
            Err(MetaError::WrongVersion(0))
        );
    }

    #[test]
    fn commit_then_read_round_trips() {
        let mut registry = Registry::new();
        let hashlist = hashes(&["a", "b"]);
        registry.commit_modify("f", 1, hashlist.clone());
        assert_eq!(registry.read("f"), (1, hashlist));
    }

    #[test]
    fn stale_writers_learn_the_current_version() {
        let mut registry = Registry::new();
        registry.commit_modify("f", 1, hashes(&["a"]));
        registry.commit_modify("f", 2, hashes(&["b"]));
        assert_eq!(
            registry.check_version("f", 2),
            Err(MetaError::WrongVersion(2))
        );
        assert_eq!(registry.check_version("f", 3), Ok(()));
    }

    #[test]
    fn delete_of_an_unknown_name_is_file_not_found() {
        let mut registry = Registry::new();
        assert_eq!(registry.delete("nope", 1), Err(MetaError::FileNotFound));
    }

    #[test]
    fn delete_requires_the_successor_version() {
        let mut registry = Registry::new();
        registry.commit_modify("f", 1, hashes(&["a"]));
        assert_eq!(registry.delete("f", 1), Err(MetaError::WrongVersion(1)));
        // The failed delete changed nothing.
        assert_eq!(registry.read("f"), (1, hashes(&["a"])));
        assert_eq!(registry.delete("f", 2), Ok(()));
        assert_eq!(registry.read("f"), (2, Vec::new()));
    }

    #[test]
    fn deleting_a_tombstone_advances_the_version() {
        let mut registry = Registry::new();
        registry.commit_modify("f", 1, hashes(&["a"]));
        registry.delete("f", 2).unwrap();
        assert_eq!(registry.delete("f", 3), Ok(()));
        assert_eq!(registry.read("f"), (3, Vec::new()));
    }

    #[test]
    fn a_tombstoned_name_can_be_revived() {
        let mut registry = Registry::new();
        registry.commit_modify("f", 1, hashes(&["a"]));
        registry.delete("f", 2).unwrap();
        assert_eq!(registry.check_version("f", 3), Ok(()));
        registry.commit_modify("f", 3, hashes(&["a", "c"]));
        assert_eq!(registry.read("f"), (3, hashes(&["a", "c"])));
    }

    #[test]
    fn novel_hashes_keep_input_order_and_drop_duplicates() {
        let registry = Registry::new();
        let list = hashes(&["x", "y", "x", "z"]);
        assert_eq!(registry.novel_hashes("f", &list), hashes(&["x", "y", "z"]));
    }

    #[test]
    fn novel_hashes_skip_blocks_the_record_already_carries() {
        let mut registry = Registry::new();
        registry.commit_modify("f", 1, hashes(&["a", "b"]));
        assert_eq!(
            registry.novel_hashes("f", &hashes(&["b", "c", "a"])),
            hashes(&["c"])
        );
    }

    #[test]
    fn a_tombstone_carries_no_reusable_hashes() {
        let mut registry = Registry::new();
        registry.commit_modify("f", 1, hashes(&["a"]));
        registry.delete("f", 2).unwrap();
        // After a delete the whole new hashlist must be re-verified.
        assert_eq!(registry.novel_hashes("f", &hashes(&["a"])), hashes(&["a"]));
    }
}
