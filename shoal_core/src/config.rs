//! The cluster configuration file.
//!
//! Plain text, line oriented, UTF-8:
//!
//! ```text
//! B: 2
//! metadata: localhost:6000
//! block1: localhost:5000
//! block2: localhost:5001
//! ```
//!
//! Line 1 declares the shard count, line 2 the metadata endpoint, and the
//! following lines the block shards in index order (the first listed shard
//! is index 0). Endpoints are split at the last colon, so IPv6 literal
//! hosts keep their internal colons.

use std::{fmt, fs, path::Path};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("config line {0} is not a `key: value` pair")]
    MalformedLine(usize),
    #[error("config file ends early: {0} required line(s) missing")]
    Truncated(usize),
    #[error("invalid shard count {0:?}")]
    BadShardCount(String),
    #[error("shard count must be positive")]
    NoShards,
    #[error("invalid endpoint {0:?}")]
    BadEndpoint(String),
}

/// One `host:port` service address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parses `host:port`, splitting at the last colon so IPv6 literal
    /// hosts survive.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::BadEndpoint(s.to_string()))?;
        let port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::BadEndpoint(s.to_string()))?;
        Ok(Endpoint {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Parsed cluster configuration: where the metadata service and every
/// block shard live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub metadata: Endpoint,
    /// Block shards in index order; a hash `h` lives on
    /// `shards[shard_for(h, shards.len())]`.
    pub shards: Vec<Endpoint>,
}

impl ClusterConfig {
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut lines = text.lines().enumerate();

        let count = value_of(lines.next(), 1)?;
        let shard_count: usize = count
            .parse()
            .map_err(|_| ConfigError::BadShardCount(count.to_string()))?;
        if shard_count == 0 {
            return Err(ConfigError::NoShards);
        }

        let metadata = Endpoint::parse(value_of(lines.next(), shard_count + 1)?)?;
        let mut shards = Vec::with_capacity(shard_count);
        for i in 0..shard_count {
            shards.push(Endpoint::parse(value_of(lines.next(), shard_count - i)?)?);
        }

        Ok(ClusterConfig { metadata, shards })
    }
}

/// The value side of one `key: value` config line; `remaining` is how
/// many required lines were still expected, for the truncation error.
fn value_of(line: Option<(usize, &str)>, remaining: usize) -> Result<&str, ConfigError> {
    let (index, line) = line.ok_or(ConfigError::Truncated(remaining))?;
    line.split_once(": ")
        .map(|(_, value)| value.trim())
        .ok_or(ConfigError::MalformedLine(index + 1))
}
