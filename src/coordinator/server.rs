//! Coordinator server and request orchestration
//!
//! One task per accepted client connection; within a request every network
//! and disk step runs sequentially, with no pipelining across fragments and
//! no parallel replication fan-out. Independent requests interleave freely at
//! the storage nodes: there is no per-file lock and no ordering guarantee
//! between, say, a concurrent upload and delete of the same name.

use crate::common::wire::{self, op};
use crate::common::{fragment, ClusterConfig, Error, Result};
use crate::coordinator::node_client::{self, NodeClient};
use crate::coordinator::registry::{self, NodeRegistry, StaticRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

/// Retrieval attempts per fragment index during reconstruction.
const FETCH_ATTEMPTS: usize = 3;

pub struct Coordinator {
    shared: Arc<Shared>,
}

struct Shared {
    config: ClusterConfig,
    registry: Arc<dyn NodeRegistry>,
}

impl Coordinator {
    pub fn new(config: ClusterConfig) -> Self {
        let registry = Arc::new(StaticRegistry::new(config.nodes.clone()));
        Self::with_registry(config, registry)
    }

    /// Swap in a different registry implementation (discovery-backed, test
    /// double, ...). The orchestration logic only sees the capability.
    pub fn with_registry(config: ClusterConfig, registry: Arc<dyn NodeRegistry>) -> Self {
        Self {
            shared: Arc::new(Shared { config, registry }),
        }
    }

    pub async fn serve(self) -> Result<()> {
        let port = self.shared.config.coordinator_port;
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener (used by tests to pick free ports).
    ///
    /// Fails before accepting anything if the startup probe finds fewer than
    /// the configured minimum of reachable nodes.
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        let shared = self.shared;

        tracing::info!("Starting coordinator");
        tracing::info!("  Listening on: {}", listener.local_addr()?);
        tracing::info!("  Storage nodes: {}", shared.registry.nodes().len());
        tracing::info!("  Staging dir: {}", shared.config.staging_dir.display());

        let alive =
            registry::require_reachable(shared.registry.as_ref(), shared.config.min_reachable)
                .await?;
        tracing::info!(
            "✓ Coordinator ready ({}/{} nodes reachable)",
            alive,
            shared.registry.nodes().len()
        );

        fs::create_dir_all(&shared.config.staging_dir).await?;

        loop {
            let (stream, peer) = listener.accept().await?;
            let shared = shared.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_session(stream, &shared).await {
                    tracing::error!("client session from {} failed: {}", peer, e);
                }
            });
        }
    }
}

async fn handle_session(mut stream: TcpStream, shared: &Shared) -> Result<()> {
    let opcode = wire::read_string(&mut stream).await?;
    match opcode.as_str() {
        op::STORE_FILE => {
            let name = wire::read_string(&mut stream).await?;
            let size = wire::read_size(&mut stream).await?;
            // No response on this path: a failed upload surfaces to the
            // client only as a dropped connection.
            upload(shared, &mut stream, &name, size).await?;
        }
        op::FETCH_FILE => {
            let name = wire::read_string(&mut stream).await?;
            fetch(shared, &mut stream, &name).await?;
        }
        op::LIST => {
            list(shared, &mut stream).await?;
        }
        op::DELETE => {
            let name = wire::read_string(&mut stream).await?;
            delete(shared, &mut stream, &name).await?;
        }
        other => {
            let e = Error::UnknownCommand(other.to_string());
            tracing::warn!("{}", e);
            wire::write_string(&mut stream, &e.to_string()).await?;
        }
    }
    Ok(())
}

/// Split the upload into K fragments and replicate each to every other node.
///
/// Fragment `index` goes to node `index` first, streamed straight off the
/// client connection; its K−1 replications complete before the next fragment
/// starts. A failed primary store aborts the upload and leaves the fragments
/// already written in place; a failed replication leg is logged and skipped,
/// leaving that fragment under-replicated.
async fn upload(shared: &Shared, stream: &mut TcpStream, name: &str, size: u64) -> Result<()> {
    fragment::validate_name(name)?;

    let nodes = shared.registry.nodes();
    let count = nodes.len();
    let chunk_size = shared.config.chunk_size;

    for index in 0..count {
        let object = fragment::fragment_name(name, index);
        let len = fragment::fragment_len(size, count, index);

        let primary = NodeClient::connect(&nodes[index], chunk_size).await?;
        primary.store_from(&object, len, stream).await?;
        tracing::debug!("fragment {} ({} bytes) stored on {}", object, len, nodes[index]);

        for target in 0..count {
            if target == index {
                continue;
            }
            match node_client::replicate(&nodes[index], &nodes[target], &object, chunk_size).await
            {
                Ok(copied) => {
                    tracing::debug!("replicated {} ({} bytes) to {}", object, copied, nodes[target])
                }
                Err(e) => {
                    tracing::warn!("replication of {} to {} failed: {}", object, nodes[target], e)
                }
            }
        }
    }

    tracing::info!("distributed {} ({} bytes across {} nodes)", name, size, count);
    Ok(())
}

/// Reconstruct a file into a staging object and stream it to the client.
///
/// The staging object is transient: it is deleted after a successful send
/// and discarded on failure, leaving the node fragments as the only durable
/// copies. On any error the client receives the error text as its status and
/// zero payload bytes.
async fn fetch(shared: &Shared, stream: &mut TcpStream, name: &str) -> Result<()> {
    if let Err(e) = fragment::validate_name(name) {
        wire::write_string(stream, &e.to_string()).await?;
        return Ok(());
    }

    let staging = shared.config.staging_dir.join(name);
    match reconstruct(shared, name, &staging).await {
        Ok(size) => {
            wire::write_string(stream, wire::STATUS_OK).await?;
            wire::write_size(stream, size).await?;
            let mut file = File::open(&staging).await?;
            wire::copy_exact(&mut file, stream, size, shared.config.chunk_size).await?;
            stream.flush().await?;

            if let Err(e) = fs::remove_file(&staging).await {
                tracing::warn!("failed to remove staging file {}: {}", staging.display(), e);
            }
            tracing::info!("served {} ({} bytes)", name, size);
        }
        Err(e) => {
            tracing::error!("fetch of {} failed: {}", name, e);
            let _ = fs::remove_file(&staging).await;
            wire::write_string(stream, &e.to_string()).await?;
        }
    }
    Ok(())
}

/// Gather fragments 0..K in order, with round-robin failover per index:
/// attempt `a` for fragment `i` asks node `(i + a) mod K`, blind to observed
/// liveness. Exhausting the attempts for any index fails the whole fetch.
///
/// Retries do not rewind the staging file: an attempt that dies mid-copy
/// leaves its partial bytes in place and the next success appends after
/// them. Only attempts that fail before the first byte (refused connects,
/// missing objects) fail over cleanly.
async fn reconstruct(shared: &Shared, name: &str, staging: &std::path::Path) -> Result<u64> {
    let nodes = shared.registry.nodes();
    let count = nodes.len();
    let chunk_size = shared.config.chunk_size;

    let mut out = File::create(staging).await?;
    let mut total = 0u64;

    for index in 0..count {
        let object = fragment::fragment_name(name, index);
        let mut recovered = None;

        for attempt in 0..FETCH_ATTEMPTS {
            let node = &nodes[(index + attempt) % count];
            match NodeClient::connect(node, chunk_size).await {
                Ok(client) => match client.retrieve_to(&object, &mut out).await {
                    Ok(len) => {
                        recovered = Some(len);
                        break;
                    }
                    Err(e) => tracing::warn!("{} on {}: {}", object, node, e),
                },
                Err(e) => tracing::warn!("{} on {}: {}", object, node, e),
            }
        }

        match recovered {
            Some(len) => total += len,
            None => {
                return Err(Error::FragmentExhausted {
                    name: name.to_string(),
                    index,
                    attempts: FETCH_ATTEMPTS,
                })
            }
        }
    }

    out.flush().await?;
    Ok(total)
}

/// Fan LIST out to every node, fold fragment names back into logical names
/// and respond with the deduplicated set. Unreachable nodes are skipped; if
/// none responded the listing is empty, which the client cannot tell apart
/// from an empty cluster.
async fn list(shared: &Shared, stream: &mut TcpStream) -> Result<()> {
    let chunk_size = shared.config.chunk_size;
    let mut files = HashSet::new();
    let mut responsive = 0usize;

    for node in shared.registry.nodes() {
        let objects = match NodeClient::connect(node, chunk_size).await {
            Ok(client) => client.list().await,
            Err(e) => Err(e),
        };
        match objects {
            Ok(objects) => {
                responsive += 1;
                for object in objects {
                    files.insert(fragment::strip_fragment_suffix(&object).to_string());
                }
            }
            Err(e) => tracing::warn!("skipping {} for LIST: {}", node, e),
        }
    }

    if responsive == 0 {
        tracing::warn!("no storage nodes responded to LIST");
    }

    wire::write_count(stream, files.len()).await?;
    for name in &files {
        wire::write_string(stream, name).await?;
    }
    Ok(())
}

/// Delete the file's fragments from every node that is reachable right now.
///
/// Liveness is re-probed fresh; nodes that are down are excluded entirely,
/// so their fragment copies survive and the file reappears in listings once
/// they return. Success requires every reachable node to report a complete
/// delete.
async fn delete(shared: &Shared, stream: &mut TcpStream, name: &str) -> Result<()> {
    if let Err(e) = fragment::validate_name(name) {
        wire::write_string(stream, &e.to_string()).await?;
        return Ok(());
    }

    let nodes = shared.registry.nodes();
    let chunk_size = shared.config.chunk_size;

    let alive = registry::reachable(shared.registry.as_ref()).await;
    if alive.is_empty() {
        wire::write_string(stream, "no storage nodes reachable").await?;
        return Ok(());
    }

    let mut failed = Vec::new();
    for index in alive {
        let node = &nodes[index];
        let outcome = match NodeClient::connect(node, chunk_size).await {
            Ok(client) => client.delete_prefix(name).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("{} reported an incomplete delete of {}", node, name);
                failed.push(node.addr());
            }
            Err(e) => {
                tracing::warn!("delete of {} on {} failed: {}", name, node, e);
                failed.push(node.addr());
            }
        }
    }

    if failed.is_empty() {
        tracing::info!("deleted {} from all reachable nodes", name);
        wire::write_string(stream, wire::STATUS_OK).await?;
    } else {
        let e = Error::DeletionFailed(failed.join(", "));
        wire::write_string(stream, &e.to_string()).await?;
    }
    Ok(())
}
