//! Client-side operations against the coordinator
//!
//! Each operation opens its own connection, mirroring the wire model. Used
//! by the interactive `minidfs` binary and by the integration tests.

use crate::common::wire::{self, op};
use crate::common::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct Client {
    coordinator: String,
    chunk_size: usize,
}

impl Client {
    pub fn new(coordinator: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            coordinator: coordinator.into(),
            chunk_size,
        }
    }

    async fn connect(&self) -> Result<TcpStream> {
        TcpStream::connect(&self.coordinator)
            .await
            .map_err(|_| Error::Unreachable(self.coordinator.clone()))
    }

    /// Upload a local file under its file name. Returns (name, size).
    pub async fn put(&self, path: &Path) -> Result<(String, u64)> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidName(path.display().to_string()))?
            .to_string();

        let mut file = File::open(path).await?;
        let size = file.metadata().await?.len();

        let mut stream = self.connect().await?;
        wire::write_string(&mut stream, op::STORE_FILE).await?;
        wire::write_string(&mut stream, &name).await?;
        wire::write_size(&mut stream, size).await?;
        wire::copy_exact(&mut file, &mut stream, size, self.chunk_size).await?;
        stream.shutdown().await?;

        // The protocol has no ack; the coordinator closing the connection is
        // the only signal that distribution has finished (or failed).
        let mut sink = [0u8; 32];
        while stream.read(&mut sink).await? > 0 {}
        Ok((name, size))
    }

    /// Upload an in-memory payload under an explicit name.
    pub async fn put_bytes(&self, name: &str, data: &[u8]) -> Result<()> {
        let mut stream = self.connect().await?;
        wire::write_string(&mut stream, op::STORE_FILE).await?;
        wire::write_string(&mut stream, name).await?;
        wire::write_size(&mut stream, data.len() as u64).await?;
        let mut cursor = std::io::Cursor::new(data);
        wire::copy_exact(&mut cursor, &mut stream, data.len() as u64, self.chunk_size).await?;
        stream.shutdown().await?;

        let mut sink = [0u8; 32];
        while stream.read(&mut sink).await? > 0 {}
        Ok(())
    }

    /// Fetch a file into `dest` (a directory keeps the original name).
    /// Returns the path written and the byte count.
    pub async fn get(&self, name: &str, dest: &Path) -> Result<(PathBuf, u64)> {
        let mut stream = self.begin_fetch(name).await?;
        let size = wire::read_size(&mut stream).await?;

        let target = if dest.is_dir() {
            dest.join(name)
        } else {
            dest.to_path_buf()
        };
        let mut file = File::create(&target).await?;
        wire::copy_exact(&mut stream, &mut file, size, self.chunk_size).await?;
        file.flush().await?;
        Ok((target, size))
    }

    /// Fetch a file into memory.
    pub async fn get_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let mut stream = self.begin_fetch(name).await?;
        let size = wire::read_size(&mut stream).await?;
        let mut data = Vec::with_capacity(size as usize);
        wire::copy_exact(&mut stream, &mut data, size, self.chunk_size).await?;
        Ok(data)
    }

    async fn begin_fetch(&self, name: &str) -> Result<TcpStream> {
        let mut stream = self.connect().await?;
        wire::write_string(&mut stream, op::FETCH_FILE).await?;
        wire::write_string(&mut stream, name).await?;
        let status = wire::read_string(&mut stream).await?;
        if status != wire::STATUS_OK {
            return Err(Error::Other(status));
        }
        Ok(stream)
    }

    /// Logical file names currently known to the cluster.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut stream = self.connect().await?;
        wire::write_string(&mut stream, op::LIST).await?;
        let count = wire::read_count(&mut stream).await?;
        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            names.push(wire::read_string(&mut stream).await?);
        }
        Ok(names)
    }

    /// Delete a file from every reachable node.
    pub async fn remove(&self, name: &str) -> Result<()> {
        let mut stream = self.connect().await?;
        wire::write_string(&mut stream, op::DELETE).await?;
        wire::write_string(&mut stream, name).await?;
        let status = wire::read_string(&mut stream).await?;
        if status != wire::STATUS_OK {
            return Err(Error::Other(status));
        }
        Ok(())
    }

    /// Send a raw opcode and read the status line back. Exposed for
    /// protocol-level checks.
    pub async fn raw_command(&self, opcode: &str) -> Result<String> {
        let mut stream = self.connect().await?;
        wire::write_string(&mut stream, opcode).await?;
        wire::read_string(&mut stream).await
    }
}
