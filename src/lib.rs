//! # minidfs
//!
//! A minimal distributed file store with:
//! - A coordinator that splits every uploaded file into K fragments
//!   (K = configured node count) and replicates each fragment to all nodes
//! - Flat-directory storage nodes with no cross-node awareness
//! - Round-robin failover on reads (up to 3 attempts per fragment)
//! - A length-prefixed synchronous wire protocol, one connection per operation
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   STORE_FILE / FETCH_FILE / LIST / DELETE
//! │   Client   ├──────────────┐
//! └────────────┘              │
//!                     ┌───────▼────────┐
//!                     │  Coordinator   │  (fragmentation, replication,
//!                     └───────┬────────┘   reconstruction, aggregation)
//!            STORE / RETRIEVE │ LIST / DELETE_PREFIX
//!        ┌────────────┬───────┴─────┬────────────┐
//!   ┌────▼─────┐ ┌────▼─────┐ ┌────▼─────┐ ┌────▼─────┐
//!   │  Node 0  │ │  Node 1  │ │  Node 2  │ │  Node …  │
//!   │ flat dir │ │ flat dir │ │ flat dir │ │          │
//!   └──────────┘ └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! Every node ends up holding every fragment: node `i` is the primary for
//! fragment `i` and a replica target for all the others.
//!
//! ## Usage
//!
//! ### Start storage nodes
//! ```bash
//! minidfs-node --listen 9001
//! minidfs-node --listen 9002
//! minidfs-node --listen 9003
//! ```
//!
//! ### Start the coordinator
//! ```bash
//! minidfs-coord --config cluster.conf
//! ```
//!
//! ### Use the interactive client
//! ```bash
//! minidfs --coordinator 127.0.0.1:12345
//! > PUT ./report.pdf
//! > LS
//! > GET report.pdf ./downloads
//! > RM report.pdf
//! > exit
//! ```

pub mod client;
pub mod common;
pub mod coordinator;
pub mod node;

// Re-export commonly used types
pub use common::{ClusterConfig, Error, Result};
pub use coordinator::Coordinator;
pub use node::NodeServer;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
