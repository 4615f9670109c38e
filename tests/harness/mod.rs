//! In-process test cluster: K storage nodes + one coordinator on ephemeral
//! ports, with direct filesystem access to every node directory.

#![allow(dead_code)]

use minidfs::client::Client;
use minidfs::common::{ClusterConfig, StorageNode};
use minidfs::{Coordinator, NodeServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct TestCluster {
    pub client: Client,
    pub coord_addr: SocketAddr,
    pub node_addrs: Vec<SocketAddr>,
    pub node_dirs: Vec<PathBuf>,
    node_handles: Vec<JoinHandle<()>>,
    chunk_size: usize,
    _tmp: TempDir,
}

impl TestCluster {
    /// Bind everything on 127.0.0.1 ephemeral ports and start serving.
    pub async fn start(node_count: usize, chunk_size: usize) -> Self {
        let tmp = TempDir::new().unwrap();

        let mut node_addrs = Vec::new();
        let mut node_dirs = Vec::new();
        let mut node_handles = Vec::new();
        for index in 0..node_count {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let dir = tmp.path().join(format!("node-{}", index));

            let server = NodeServer::new(addr.port(), dir.clone(), chunk_size);
            node_handles.push(tokio::spawn(async move {
                let _ = server.serve_on(listener).await;
            }));
            node_addrs.push(addr);
            node_dirs.push(dir);
        }

        let config = ClusterConfig {
            coordinator_port: 0,
            staging_dir: tmp.path().join("staging"),
            chunk_size,
            nodes: node_addrs
                .iter()
                .map(|a| StorageNode::new("127.0.0.1", a.port()))
                .collect(),
            min_reachable: 1,
        };

        let coord_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let coord_addr = coord_listener.local_addr().unwrap();
        let coordinator = Coordinator::new(config);
        tokio::spawn(async move {
            let _ = coordinator.serve_on(coord_listener).await;
        });

        Self {
            client: Client::new(coord_addr.to_string(), chunk_size),
            coord_addr,
            node_addrs,
            node_dirs,
            node_handles,
            chunk_size,
            _tmp: tmp,
        }
    }

    /// Stop one node; its listener is gone once this returns.
    pub async fn kill_node(&mut self, index: usize) {
        self.node_handles[index].abort();
        let _ = (&mut self.node_handles[index]).await;
    }

    /// Bring a killed node back on its old port with its old data directory.
    pub async fn restart_node(&mut self, index: usize) {
        let addr = self.node_addrs[index];
        let mut listener = None;
        for _ in 0..50 {
            match TcpListener::bind(addr).await {
                Ok(l) => {
                    listener = Some(l);
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
        let listener = listener.expect("node port did not free up");

        let server = NodeServer::new(addr.port(), self.node_dirs[index].clone(), self.chunk_size);
        self.node_handles[index] = tokio::spawn(async move {
            let _ = server.serve_on(listener).await;
        });
    }

    /// Sorted object names currently on node `index`.
    pub fn node_objects(&self, index: usize) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.node_dirs[index]) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .filter_map(|e| e.file_name().into_string().ok())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Size of one object on one node.
    pub fn object_size(&self, index: usize, object: &str) -> u64 {
        std::fs::metadata(self.node_dirs[index].join(object))
            .unwrap()
            .len()
    }

    /// Remove one object from one node behind the coordinator's back.
    pub fn drop_object(&self, index: usize, object: &str) {
        std::fs::remove_file(self.node_dirs[index].join(object)).unwrap();
    }
}

/// Deterministic pseudo-random payload.
pub fn payload(size: usize) -> Vec<u8> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(size as u64 ^ 0x5eed);
    (0..size).map(|_| rng.gen()).collect()
}
