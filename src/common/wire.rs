//! Wire protocol primitives
//!
//! Every operation gets its own TCP connection and runs a synchronous
//! request/response exchange; there is no multiplexing and no framing beyond
//! the fields themselves. Encoding:
//! - strings: u16 big-endian byte length + UTF-8 bytes
//! - sizes:   i64 big-endian
//! - counts:  i32 big-endian
//!
//! Bulk payloads are relayed in `chunk_size` pieces and never buffered whole.

use crate::common::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Client → coordinator opcodes.
pub mod op {
    pub const STORE_FILE: &str = "STORE_FILE";
    pub const FETCH_FILE: &str = "FETCH_FILE";
    pub const LIST: &str = "LIST";
    pub const DELETE: &str = "DELETE";
}

/// Coordinator → node opcodes.
pub mod node_op {
    pub const STORE: &str = "STORE";
    pub const RETRIEVE: &str = "RETRIEVE";
    pub const LIST: &str = "LIST";
    pub const DELETE_PREFIX: &str = "DELETE_PREFIX";
}

/// Success status string.
pub const STATUS_OK: &str = "OK";

/// Error status used by a node whose delete-by-prefix left objects behind.
pub const STATUS_ERROR: &str = "ERROR";

/// Write a length-prefixed UTF-8 string.
pub async fn write_string<W: AsyncWrite + Unpin>(w: &mut W, s: &str) -> Result<()> {
    if s.len() > u16::MAX as usize {
        return Err(Error::Protocol(format!("string too long: {} bytes", s.len())));
    }
    w.write_u16(s.len() as u16).await?;
    w.write_all(s.as_bytes()).await?;
    Ok(())
}

/// Read a length-prefixed UTF-8 string.
pub async fn read_string<R: AsyncRead + Unpin>(r: &mut R) -> Result<String> {
    let len = r.read_u16().await? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await?;
    String::from_utf8(buf).map_err(|e| Error::Protocol(format!("invalid UTF-8 string: {}", e)))
}

/// Write a byte size as i64 big-endian.
pub async fn write_size<W: AsyncWrite + Unpin>(w: &mut W, size: u64) -> Result<()> {
    let size = i64::try_from(size)
        .map_err(|_| Error::Protocol(format!("size out of range: {}", size)))?;
    w.write_i64(size).await?;
    Ok(())
}

/// Read an i64 big-endian byte size; negative values are a protocol error.
pub async fn read_size<R: AsyncRead + Unpin>(r: &mut R) -> Result<u64> {
    let size = r.read_i64().await?;
    u64::try_from(size).map_err(|_| Error::Protocol(format!("negative size: {}", size)))
}

/// Write an element count as i32 big-endian.
pub async fn write_count<W: AsyncWrite + Unpin>(w: &mut W, count: usize) -> Result<()> {
    let count = i32::try_from(count)
        .map_err(|_| Error::Protocol(format!("count out of range: {}", count)))?;
    w.write_i32(count).await?;
    Ok(())
}

/// Read an i32 big-endian element count; negative values are a protocol error.
pub async fn read_count<R: AsyncRead + Unpin>(r: &mut R) -> Result<usize> {
    let count = r.read_i32().await?;
    usize::try_from(count).map_err(|_| Error::Protocol(format!("negative count: {}", count)))
}

/// Copy exactly `len` bytes from `r` to `w` in `chunk_size` pieces.
pub async fn copy_exact<R, W>(r: &mut R, w: &mut W, len: u64, chunk_size: usize) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        r.read_exact(&mut buf[..n]).await?;
        w.write_all(&buf[..n]).await?;
        remaining -= n as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn string_round_trip() {
        let (mut a, mut b) = tokio::io::duplex(256);
        write_string(&mut a, "report.pdf").await.unwrap();
        write_string(&mut a, "").await.unwrap();
        assert_eq!(read_string(&mut b).await.unwrap(), "report.pdf");
        assert_eq!(read_string(&mut b).await.unwrap(), "");
    }

    #[tokio::test]
    async fn size_and_count_round_trip() {
        let (mut a, mut b) = tokio::io::duplex(64);
        write_size(&mut a, 0).await.unwrap();
        write_size(&mut a, 1 << 40).await.unwrap();
        write_count(&mut a, 7).await.unwrap();
        assert_eq!(read_size(&mut b).await.unwrap(), 0);
        assert_eq!(read_size(&mut b).await.unwrap(), 1 << 40);
        assert_eq!(read_count(&mut b).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn negative_size_is_a_protocol_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_i64(&mut a, -1).await.unwrap();
        assert!(matches!(
            read_size(&mut b).await.unwrap_err(),
            Error::Protocol(_)
        ));
    }

    #[tokio::test]
    async fn copy_exact_respects_length() {
        let payload: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let (mut a, mut b) = tokio::io::duplex(4096);
        a.write_all(&payload).await.unwrap();
        a.write_all(b"trailing").await.unwrap();

        let mut out = Vec::new();
        // chunk smaller than payload to exercise the loop
        copy_exact(&mut b, &mut out, 1000, 64).await.unwrap();
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn short_stream_fails_copy() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(b"abc").await.unwrap();
        drop(a);

        let mut out = Vec::new();
        assert!(copy_exact(&mut b, &mut out, 10, 8).await.is_err());
    }
}
