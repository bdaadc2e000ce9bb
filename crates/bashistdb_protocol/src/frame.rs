//! Length-prefixed framing of ciphertext blobs.
//!
//! A frame is a 4-byte big-endian length followed by exactly that many bytes.

use crate::error::{ProtocolError, ProtocolResult};
use bytes::{BufMut, BytesMut};
use std::io::{Read, Write};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest frame body accepted from a peer.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Initial buffer size when reading a body. The buffer grows only as bytes
/// actually arrive, so the unauthenticated length prefix never sizes an
/// allocation on its own.
const READ_CHUNK: usize = 8 * 1024;

/// Wraps `body` in a frame.
pub fn encode_frame(body: &[u8]) -> ProtocolResult<Vec<u8>> {
    let len = checked_len(body.len())?;
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
    buf.put_u32(len);
    buf.put_slice(body);
    Ok(buf.to_vec())
}

/// Returns the body of a complete frame.
///
/// # Errors
///
/// Returns a transport error if the prefix is missing, the declared length
/// exceeds [`MAX_FRAME_LEN`], or the declared length disagrees with the
/// number of bytes present.
pub fn decode_frame(wire: &[u8]) -> ProtocolResult<&[u8]> {
    if wire.len() < LENGTH_PREFIX_SIZE {
        return Err(ProtocolError::transport("truncated length prefix"));
    }
    let (prefix, body) = wire.split_at(LENGTH_PREFIX_SIZE);
    let declared = declared_len(prefix)?;
    if body.len() != declared {
        return Err(ProtocolError::transport(format!(
            "frame length mismatch: declared {declared}, got {}",
            body.len()
        )));
    }
    Ok(body)
}

/// Writes one frame to a blocking stream.
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> ProtocolResult<()> {
    let frame = encode_frame(body)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame body from a blocking stream.
pub fn read_frame<R: Read>(reader: &mut R) -> ProtocolResult<Vec<u8>> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut prefix)?;
    let len = declared_len(&prefix)?;
    let mut body = Vec::with_capacity(len.min(READ_CHUNK));
    reader.by_ref().take(len as u64).read_to_end(&mut body)?;
    complete_body(body, len)
}

/// Writes one frame to an async stream.
pub async fn write_frame_async<W>(writer: &mut W, body: &[u8]) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(body)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame body from an async stream.
pub async fn read_frame_async<R>(reader: &mut R) -> ProtocolResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut prefix).await?;
    let len = declared_len(&prefix)?;
    let mut body = Vec::with_capacity(len.min(READ_CHUNK));
    (&mut *reader).take(len as u64).read_to_end(&mut body).await?;
    complete_body(body, len)
}

fn complete_body(body: Vec<u8>, len: usize) -> ProtocolResult<Vec<u8>> {
    if body.len() < len {
        return Err(ProtocolError::transport(
            "connection closed before a full frame",
        ));
    }
    Ok(body)
}

fn checked_len(len: usize) -> ProtocolResult<u32> {
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::transport(format!(
            "frame too large: {len} > {MAX_FRAME_LEN}"
        )));
    }
    u32::try_from(len).map_err(|_| ProtocolError::transport("frame too large"))
}

fn declared_len(prefix: &[u8]) -> ProtocolResult<usize> {
    let bytes: [u8; LENGTH_PREFIX_SIZE] = prefix
        .try_into()
        .map_err(|_| ProtocolError::transport("truncated length prefix"))?;
    let len = u32::from_be_bytes(bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::transport(format!(
            "declared frame length {len} exceeds {MAX_FRAME_LEN}"
        )));
    }
    Ok(len)
}
