//! One-connection-per-operation client for the node protocol
//!
//! Matching the wire model, a `NodeClient` wraps exactly one fresh TCP
//! connection and every operation consumes it. Connection pooling could be
//! hidden behind this type later without changing the orchestration code.

use crate::common::wire::{self, node_op};
use crate::common::{Error, Result, StorageNode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct NodeClient {
    stream: TcpStream,
    chunk_size: usize,
}

impl NodeClient {
    /// Open a fresh connection. A refusal is the connectivity error the
    /// orchestration layers count, skip or fail over on.
    pub async fn connect(node: &StorageNode, chunk_size: usize) -> Result<Self> {
        let stream = TcpStream::connect(node.addr())
            .await
            .map_err(|_| Error::Unreachable(node.addr()))?;
        Ok(Self { stream, chunk_size })
    }

    /// Send a STORE header; the caller then relays exactly `size` bytes.
    pub async fn begin_store(&mut self, name: &str, size: u64) -> Result<()> {
        wire::write_string(&mut self.stream, node_op::STORE).await?;
        wire::write_string(&mut self.stream, name).await?;
        wire::write_size(&mut self.stream, size).await?;
        Ok(())
    }

    /// Send a RETRIEVE request and read the size header. A node holding no
    /// such object closes the connection instead, which surfaces here as an
    /// I/O error indistinguishable from a network failure.
    pub async fn begin_retrieve(&mut self, name: &str) -> Result<u64> {
        wire::write_string(&mut self.stream, node_op::RETRIEVE).await?;
        wire::write_string(&mut self.stream, name).await?;
        wire::read_size(&mut self.stream).await
    }

    /// Store `size` bytes streamed out of `reader`.
    pub async fn store_from<R>(mut self, name: &str, size: u64, reader: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        self.begin_store(name, size).await?;
        wire::copy_exact(reader, &mut self.stream, size, self.chunk_size).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Retrieve an object into `writer`, returning its size.
    pub async fn retrieve_to<W>(mut self, name: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let size = self.begin_retrieve(name).await?;
        wire::copy_exact(&mut self.stream, writer, size, self.chunk_size).await?;
        Ok(size)
    }

    /// Every object name the node currently holds.
    pub async fn list(mut self) -> Result<Vec<String>> {
        wire::write_string(&mut self.stream, node_op::LIST).await?;
        let count = wire::read_count(&mut self.stream).await?;
        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            names.push(wire::read_string(&mut self.stream).await?);
        }
        Ok(names)
    }

    /// Delete every object prefixed by `name + ".part"`; Ok(true) means the
    /// node reported a complete delete.
    pub async fn delete_prefix(mut self, name: &str) -> Result<bool> {
        wire::write_string(&mut self.stream, node_op::DELETE_PREFIX).await?;
        wire::write_string(&mut self.stream, name).await?;
        let status = wire::read_string(&mut self.stream).await?;
        Ok(status == wire::STATUS_OK)
    }
}

/// Copy one fragment object from `src` to `dst` via retrieve-then-store,
/// relaying through this process. Returns the bytes copied.
pub async fn replicate(
    src: &StorageNode,
    dst: &StorageNode,
    object: &str,
    chunk_size: usize,
) -> Result<u64> {
    let mut source = NodeClient::connect(src, chunk_size).await?;
    let size = source.begin_retrieve(object).await?;

    let mut target = NodeClient::connect(dst, chunk_size).await?;
    target.begin_store(object, size).await?;
    wire::copy_exact(&mut source.stream, &mut target.stream, size, chunk_size).await?;
    target.stream.flush().await?;
    Ok(size)
}
