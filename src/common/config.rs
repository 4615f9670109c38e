//! Cluster configuration for minidfs components
//!
//! The on-disk format is a flat key=value text file:
//!
//! ```text
//! coordinator.port=12345
//! coordinator.staging_dir=./coord-staging
//! chunk_size=1024
//! node.count=3
//! node.min_reachable=1
//! node.1.host=127.0.0.1
//! node.1.port=9001
//! node.2.host=127.0.0.1
//! node.2.port=9002
//! node.3.host=127.0.0.1
//! node.3.port=9003
//! ```
//!
//! Node keys are 1-based in the file; in memory nodes are indexed 0..K.

use crate::common::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A storage node endpoint. Immutable: the node set is fixed for the
/// lifetime of the coordinator process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNode {
    pub host: String,
    pub port: u16,
}

impl StorageNode {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Connectable `host:port` form.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for StorageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Raw key=value view of a config file, with typed accessors.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pairs: HashMap<String, String>,
}

impl RawConfig {
    /// Parse a key=value file. Blank lines and `#` comments are ignored;
    /// whitespace around keys and values is trimmed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut pairs = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                pairs.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Result<&str> {
        self.pairs
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::InvalidConfig(format!("missing key: {}", key)))
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.pairs
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_parsed<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.get(key)?;
        raw.parse()
            .map_err(|e| Error::InvalidConfig(format!("key {}: {} ({})", key, e, raw)))
    }
}

/// Typed cluster configuration.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Coordinator listen port.
    pub coordinator_port: u16,

    /// Directory for transient reconstruction staging files.
    pub staging_dir: PathBuf,

    /// Buffer size for relaying byte streams.
    pub chunk_size: usize,

    /// The fixed node set, index 0..K. K is also the fragment count.
    pub nodes: Vec<StorageNode>,

    /// Minimum nodes that must answer the startup probe.
    pub min_reachable: usize,
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_raw(&RawConfig::load(path)?)
    }

    pub fn from_raw(raw: &RawConfig) -> Result<Self> {
        let count: usize = raw.get_parsed("node.count")?;
        if count == 0 {
            return Err(Error::InvalidConfig("node.count must be at least 1".into()));
        }

        let mut nodes = Vec::with_capacity(count);
        for i in 1..=count {
            let host = raw.get(&format!("node.{}.host", i))?.to_string();
            let port = raw.get_parsed(&format!("node.{}.port", i))?;
            nodes.push(StorageNode { host, port });
        }

        let chunk_size: usize = raw.get_parsed("chunk_size")?;
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be at least 1".into()));
        }

        let min_reachable = raw
            .get_or("node.min_reachable", "1")
            .parse()
            .map_err(|_| Error::InvalidConfig("node.min_reachable must be a number".into()))?;

        Ok(Self {
            coordinator_port: raw.get_parsed("coordinator.port")?,
            staging_dir: PathBuf::from(raw.get_or("coordinator.staging_dir", "./coord-staging")),
            chunk_size,
            nodes,
            min_reachable,
        })
    }

    /// Fragment count: one fragment per configured node.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
