//! Storage node implementation
//!
//! A node is a durable flat fragment store behind four operations:
//! store, retrieve, list and delete-by-prefix. It has no awareness of the
//! rest of the cluster; replication is entirely driven by the coordinator.

pub mod server;
pub mod store;

pub use server::NodeServer;
pub use store::FragmentStore;
