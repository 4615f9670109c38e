//! Storage node server
//!
//! One task per accepted connection, one operation per connection. Session
//! failures are logged and terminate only that session.

use crate::common::wire::{self, node_op};
use crate::common::Result;
use crate::node::store::FragmentStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

pub struct NodeServer {
    listen_port: u16,
    data_dir: PathBuf,
    chunk_size: usize,
}

impl NodeServer {
    pub fn new(listen_port: u16, data_dir: PathBuf, chunk_size: usize) -> Self {
        Self {
            listen_port,
            data_dir,
            chunk_size,
        }
    }

    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.listen_port)).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener (used by tests to pick free ports).
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        tracing::info!("Starting storage node");
        tracing::info!("  Listening on: {}", listener.local_addr()?);
        tracing::info!("  Data directory: {}", self.data_dir.display());

        let store = Arc::new(FragmentStore::open(&self.data_dir).await?);

        tracing::info!("✓ Storage node ready");

        loop {
            let (stream, peer) = listener.accept().await?;
            let store = store.clone();
            let chunk_size = self.chunk_size;
            tokio::spawn(async move {
                if let Err(e) = handle_session(stream, store, chunk_size).await {
                    tracing::error!("session from {} failed: {}", peer, e);
                }
            });
        }
    }
}

async fn handle_session(
    mut stream: TcpStream,
    store: Arc<FragmentStore>,
    chunk_size: usize,
) -> Result<()> {
    let opcode = wire::read_string(&mut stream).await?;
    match opcode.as_str() {
        node_op::STORE => {
            let name = wire::read_string(&mut stream).await?;
            let size = wire::read_size(&mut stream).await?;
            store.write_from(&name, size, &mut stream, chunk_size).await?;
            tracing::info!("stored {} ({} bytes)", name, size);
        }
        node_op::RETRIEVE => {
            let name = wire::read_string(&mut stream).await?;
            // An absent object closes the connection without a response;
            // the caller cannot tell it apart from a network failure.
            let (size, mut file) = match store.open_read(&name).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!("retrieve of {} failed: {}", name, e);
                    return Ok(());
                }
            };
            wire::write_size(&mut stream, size).await?;
            wire::copy_exact(&mut file, &mut stream, size, chunk_size).await?;
            tracing::info!("sent {} ({} bytes)", name, size);
        }
        node_op::LIST => {
            let names = store.list().await?;
            wire::write_count(&mut stream, names.len()).await?;
            for name in &names {
                wire::write_string(&mut stream, name).await?;
            }
        }
        node_op::DELETE_PREFIX => {
            let name = wire::read_string(&mut stream).await?;
            let status = match store.delete_prefix(&name).await {
                Ok(true) => wire::STATUS_OK,
                Ok(false) => wire::STATUS_ERROR,
                Err(e) => {
                    tracing::warn!("delete of {} failed: {}", name, e);
                    wire::STATUS_ERROR
                }
            };
            wire::write_string(&mut stream, status).await?;
        }
        other => {
            let e = crate::common::Error::UnknownCommand(other.to_string());
            tracing::warn!("{}", e);
            wire::write_string(&mut stream, &e.to_string()).await?;
        }
    }
    Ok(())
}
