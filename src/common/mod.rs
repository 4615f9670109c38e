//! Common types shared by the coordinator, the storage nodes and the client

pub mod config;
pub mod error;
pub mod fragment;
pub mod wire;

pub use config::{ClusterConfig, RawConfig, StorageNode};
pub use error::{Error, Result};
pub use fragment::{fragment_len, fragment_name, fragment_prefix, strip_fragment_suffix};
