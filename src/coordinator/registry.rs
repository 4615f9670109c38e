//! Node registry and reachability probing
//!
//! The registry is a capability returning the current node set. The static
//! implementation wraps the configured list; a discovery-backed one could
//! replace it without touching the orchestration code. Reachability is never
//! cached: every operation that needs liveness re-probes by connecting.

use crate::common::{Error, Result, StorageNode};
use tokio::net::TcpStream;

pub trait NodeRegistry: Send + Sync {
    /// The fixed node set. Index `i` is the primary for fragment `i`.
    fn nodes(&self) -> &[StorageNode];
}

/// Registry over the configured, process-lifetime node list.
pub struct StaticRegistry {
    nodes: Vec<StorageNode>,
}

impl StaticRegistry {
    pub fn new(nodes: Vec<StorageNode>) -> Self {
        Self { nodes }
    }
}

impl NodeRegistry for StaticRegistry {
    fn nodes(&self) -> &[StorageNode] {
        &self.nodes
    }
}

/// Can we open a connection to this node right now?
pub async fn probe(node: &StorageNode) -> bool {
    TcpStream::connect(node.addr()).await.is_ok()
}

/// Fresh probe of every registered node; returns the indices that answered.
pub async fn reachable(registry: &dyn NodeRegistry) -> Vec<usize> {
    let mut alive = Vec::new();
    for (index, node) in registry.nodes().iter().enumerate() {
        if probe(node).await {
            alive.push(index);
        } else {
            tracing::warn!("storage node unreachable: {}", node);
        }
    }
    alive
}

/// Startup probe: error unless at least `required` nodes answered.
pub async fn require_reachable(registry: &dyn NodeRegistry, required: usize) -> Result<usize> {
    let alive = reachable(registry).await.len();
    let total = registry.nodes().len();
    if alive < required {
        return Err(Error::TooFewNodes {
            reachable: alive,
            total,
            required,
        });
    }
    Ok(alive)
}
