//! Coordinator implementation
//!
//! The coordinator owns all distributed logic:
//! - Fragmentation: split an upload into K fragments (K = node count)
//! - Replication: copy every fragment to every node, sequentially
//! - Reconstruction: reassemble a file with round-robin failover reads
//! - Aggregation: fan listing and deletion out to all nodes
//!
//! Nodes never talk to each other; every cross-node byte moves through a
//! coordinator-held connection pair.

pub mod node_client;
pub mod registry;
pub mod server;

pub use registry::{NodeRegistry, StaticRegistry};
pub use server::Coordinator;
