//! Reading RESP frames from network streams.
//!
//! Every connection owns a [`BytesMut`] buffer. Reads append to it and the
//! decoders consume complete frames from the front, so a frame split across
//! several TCP reads is reassembled and bytes belonging to the next frame are
//! kept for the following call.

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::resp::{parse_snapshot_payload, RespError, RespValue};

pub const READ_BUFFER_CAPACITY: usize = 4096;

/// Errors that can occur while reading and parsing frames from network streams.
#[derive(Error, Debug, PartialEq)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("RESP parse error: {0}")]
    RespParseError(#[from] RespError),
}

impl CommandReadError {
    pub fn as_string(&self) -> String {
        match self {
            CommandReadError::IoError(msg) => RespValue::Error(format!("ERR {}", msg)).encode(),
            CommandReadError::ConnectionClosed => {
                RespValue::Error("ERR connection closed".to_string()).encode()
            }
            CommandReadError::RespParseError(err) => err.as_string(),
        }
    }
}

pub fn new_read_buffer() -> BytesMut {
    BytesMut::with_capacity(READ_BUFFER_CAPACITY)
}

/// Reads from `stream` until at least one complete request is buffered and
/// returns every complete request available.
///
/// # Returns
///
/// * `Ok(Vec<RespValue>)` - One or more decoded request arrays
/// * `Err(CommandReadError::ConnectionClosed)` - The peer closed the stream
/// * `Err(CommandReadError::IoError)` - Reading from the stream failed
/// * `Err(CommandReadError::RespParseError)` - The buffered bytes are not a valid request
pub async fn read_and_parse_resp<R>(
    stream: &mut R,
    buffer: &mut BytesMut,
) -> Result<Vec<RespValue>, CommandReadError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let (values, read) = RespValue::parse_requests(buffer)?;

        if !values.is_empty() {
            buffer.advance(read);
            return Ok(values);
        }

        fill_buffer(stream, buffer).await?;
    }
}

/// Reads a single reply frame of any type.
pub async fn read_reply<R>(stream: &mut R, buffer: &mut BytesMut) -> Result<RespValue, CommandReadError>
where
    R: AsyncRead + Unpin,
{
    read_frame(stream, buffer, RespValue::parse_reply).await
}

/// Reads the `$<len>\r\n<bytes>` snapshot transfer sent after FULLRESYNC.
pub async fn read_snapshot_payload<R>(
    stream: &mut R,
    buffer: &mut BytesMut,
) -> Result<Vec<u8>, CommandReadError>
where
    R: AsyncRead + Unpin,
{
    read_frame(stream, buffer, parse_snapshot_payload).await
}

async fn read_frame<R, T>(
    stream: &mut R,
    buffer: &mut BytesMut,
    parse: fn(&[u8]) -> Result<(T, usize), RespError>,
) -> Result<T, CommandReadError>
where
    R: AsyncRead + Unpin,
{
    loop {
        match parse(buffer) {
            Ok((frame, read)) => {
                buffer.advance(read);
                return Ok(frame);
            }
            Err(RespError::Incomplete) => fill_buffer(stream, buffer).await?,
            Err(e) => return Err(e.into()),
        }
    }
}

async fn fill_buffer<R>(stream: &mut R, buffer: &mut BytesMut) -> Result<(), CommandReadError>
where
    R: AsyncRead + Unpin,
{
    let number_of_bytes = stream
        .read_buf(buffer)
        .await
        .map_err(|e| CommandReadError::IoError(e.to_string()))?;

    if number_of_bytes == 0 {
        return Err(CommandReadError::ConnectionClosed);
    }

    Ok(())
}
