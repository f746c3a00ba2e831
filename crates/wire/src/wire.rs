// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed JSON framing.
//!
//! A frame is `[i32 LE length N][N bytes of UTF-8 JSON]`. A peer that closes
//! mid-frame is a clean disconnect (`Ok(None)`), while a malformed or
//! oversized frame is a [`ProtocolError`] and must be surfaced loudly.

use std::io;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{CommandRequest, CommandResponse};

/// Hard ceiling on a declared payload length (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Errors raised by the framing layer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("protocol violation: declared frame length {0} outside 1..={max}", max = MAX_FRAME_SIZE)]
    InvalidLength(i32),

    #[error("protocol violation: {0} byte payload cannot be framed")]
    TooLarge(usize),

    #[error("protocol violation: malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Operation timed out")]
    Timeout,
}

impl ProtocolError {
    /// True for errors that indicate a buggy or incompatible peer rather
    /// than a transport hiccup.
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::InvalidLength(_) | Self::TooLarge(_) | Self::Json(_))
    }
}

/// Serialize a value to compact JSON (no length prefix).
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize a JSON payload (no length prefix).
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write one frame: length prefix, payload, flush.
pub async fn write_message<W>(writer: &mut W, data: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let len = i32::try_from(data.len()).map_err(|_| ProtocolError::TooLarge(data.len()))?;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame's payload.
///
/// Returns `Ok(None)` when the stream ends before a full frame arrived.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    if !read_full(reader, &mut header).await? {
        return Ok(None);
    }

    let len = i32::from_le_bytes(header);
    let size = usize::try_from(len).unwrap_or(0);
    if size == 0 || size > MAX_FRAME_SIZE {
        return Err(ProtocolError::InvalidLength(len));
    }

    let mut payload = vec![0u8; size];
    if !read_full(reader, &mut payload).await? {
        return Ok(None);
    }
    Ok(Some(payload))
}

/// Fill `buf` completely, looping over short reads.
///
/// Returns `false` if the peer went away first.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_disconnect(&e) => return Ok(false),
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
    )
}

/// Serialize `value` and write it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = encode(value)?;
    write_message(writer, &data).await
}

/// Read one frame and deserialize it.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    match read_message(reader).await? {
        Some(payload) => Ok(Some(decode(&payload)?)),
        None => Ok(None),
    }
}

/// Read a request, giving up after `timeout`.
pub async fn read_request<R>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Option<CommandRequest>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    tokio::time::timeout(timeout, read_frame(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Write a response, giving up after `timeout`.
pub async fn write_response<W>(
    writer: &mut W,
    response: &CommandResponse,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    tokio::time::timeout(timeout, write_frame(writer, response))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Write a request. The caller bounds the whole exchange.
pub async fn write_request<W>(writer: &mut W, request: &CommandRequest) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    write_frame(writer, request).await
}

/// Read a response. The caller bounds the whole exchange.
pub async fn read_response<R>(reader: &mut R) -> Result<Option<CommandResponse>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    read_frame(reader).await
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
