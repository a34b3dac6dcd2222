//! RESP (REdis Serialization Protocol) encoding and decoding.
//!
//! Requests arrive as arrays of bulk strings. Replies are simple strings,
//! errors, bulk strings, null bulk strings or arrays of bulk strings. Decoding
//! works on a byte buffer that may hold a partial frame: a short buffer is
//! reported as [`RespError::Incomplete`] so the caller can read more bytes,
//! while a malformed frame is a [`RespError::Protocol`].

use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Largest element count accepted in a request array.
const MAX_ARRAY_LENGTH: usize = 1024 * 1024;
/// Largest bulk string or snapshot payload accepted, in bytes.
const MAX_BULK_LENGTH: usize = 512 * 1024 * 1024;

#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RespError {
    pub fn as_string(&self) -> String {
        match self {
            RespError::Incomplete => RespValue::Error("ERR incomplete frame".to_string()).encode(),
            RespError::Protocol(msg) => {
                RespValue::Error(format!("ERR Protocol error: {}", msg)).encode()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    BulkString(String),
    Null,
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(s) => format!("-{}\r\n", s),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::Null => "$-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());

                for element in elements {
                    encoded.push_str(&element.encode());
                }

                encoded
            }
        }
    }

    /// Builds a request frame (array of bulk strings) from plain arguments.
    pub fn command(arguments: &[&str]) -> Self {
        RespValue::Array(
            arguments
                .iter()
                .map(|arg| RespValue::BulkString(arg.to_string()))
                .collect(),
        )
    }

    /// Decodes one client request from the start of `buffer`.
    ///
    /// Only the array-of-bulk-strings form is accepted. On success returns the
    /// decoded array together with the number of bytes it occupied.
    pub fn parse_request(buffer: &[u8]) -> Result<(RespValue, usize), RespError> {
        let Some(&first) = buffer.first() else {
            return Err(RespError::Incomplete);
        };

        if first != b'*' {
            return Err(RespError::Protocol(format!(
                "expected '*', got '{}'",
                first as char
            )));
        }

        let (header, mut cursor) = read_line(buffer, 1)?;
        let count = parse_length(header)?;

        if count > MAX_ARRAY_LENGTH {
            return Err(RespError::Protocol(format!(
                "invalid multibulk length '{}'",
                header
            )));
        }

        let mut elements = Vec::new();

        for _ in 0..count {
            let Some(&marker) = buffer.get(cursor) else {
                return Err(RespError::Incomplete);
            };

            if marker != b'$' {
                return Err(RespError::Protocol(format!(
                    "expected '$', got '{}'",
                    marker as char
                )));
            }

            let (element, next) = parse_bulk_string(buffer, cursor + 1)?;
            elements.push(element);
            cursor = next;
        }

        Ok((RespValue::Array(elements), cursor))
    }

    /// Decodes every complete request at the start of `buffer`.
    ///
    /// Stops at the first incomplete frame; the returned byte count covers only
    /// the frames that were decoded.
    pub fn parse_requests(buffer: &[u8]) -> Result<(Vec<RespValue>, usize), RespError> {
        let mut values = Vec::new();
        let mut cursor = 0;

        while cursor < buffer.len() {
            match RespValue::parse_request(&buffer[cursor..]) {
                Ok((value, read)) => {
                    values.push(value);
                    cursor += read;
                }
                Err(RespError::Incomplete) => break,
                Err(e) => return Err(e),
            }
        }

        Ok((values, cursor))
    }

    /// Decodes a single reply frame of any type, as sent by a master during
    /// the handshake.
    pub fn parse_reply(buffer: &[u8]) -> Result<(RespValue, usize), RespError> {
        let Some(&first) = buffer.first() else {
            return Err(RespError::Incomplete);
        };

        match first {
            b'+' => {
                let (line, next) = read_line(buffer, 1)?;
                Ok((RespValue::SimpleString(line.to_string()), next))
            }
            b'-' => {
                let (line, next) = read_line(buffer, 1)?;
                Ok((RespValue::Error(line.to_string()), next))
            }
            b'$' => parse_bulk_string(buffer, 1),
            b'*' => RespValue::parse_request(buffer),
            other => Err(RespError::Protocol(format!(
                "unexpected reply type '{}'",
                other as char
            ))),
        }
    }
}

/// Decodes the snapshot transfer that follows `+FULLRESYNC`.
///
/// The payload is framed like a bulk string but has no trailing CRLF.
pub fn parse_snapshot_payload(buffer: &[u8]) -> Result<(Vec<u8>, usize), RespError> {
    let Some(&first) = buffer.first() else {
        return Err(RespError::Incomplete);
    };

    if first != b'$' {
        return Err(RespError::Protocol(format!(
            "expected '$', got '{}'",
            first as char
        )));
    }

    let (header, start) = read_line(buffer, 1)?;
    let length = parse_bulk_length(header)?;
    let end = checked_offset(start, length)?;

    if buffer.len() < end {
        return Err(RespError::Incomplete);
    }

    Ok((buffer[start..end].to_vec(), end))
}

/// Frames raw snapshot bytes for transfer to a replica.
pub fn encode_snapshot_payload(content: &[u8]) -> Vec<u8> {
    let mut encoded = format!("${}\r\n", content.len()).into_bytes();
    encoded.extend_from_slice(content);
    encoded
}

/// Parses `<len>\r\n<payload>\r\n` starting right after the `$` marker.
fn parse_bulk_string(buffer: &[u8], cursor: usize) -> Result<(RespValue, usize), RespError> {
    let (header, start) = read_line(buffer, cursor)?;

    if header == "-1" {
        return Ok((RespValue::Null, start));
    }

    let length = parse_bulk_length(header)?;
    let end = checked_offset(start, length)?;
    let next = checked_offset(end, CRLF.len())?;

    if buffer.len() < next {
        return Err(RespError::Incomplete);
    }

    if &buffer[end..next] != CRLF {
        return Err(RespError::Protocol(
            "bulk string is longer than its declared length".to_string(),
        ));
    }

    let content = std::str::from_utf8(&buffer[start..end])
        .map_err(|_| RespError::Protocol("invalid UTF-8 in bulk string".to_string()))?;

    Ok((RespValue::BulkString(content.to_string()), next))
}

/// Returns the line starting at `cursor` (without its CRLF) and the index of
/// the byte following the CRLF.
fn read_line(buffer: &[u8], cursor: usize) -> Result<(&str, usize), RespError> {
    let rest = buffer.get(cursor..).ok_or(RespError::Incomplete)?;

    let Some(position) = rest.windows(CRLF.len()).position(|window| window == CRLF) else {
        return Err(RespError::Incomplete);
    };

    let line = std::str::from_utf8(&rest[..position])
        .map_err(|_| RespError::Protocol("invalid UTF-8 in header".to_string()))?;

    Ok((line, cursor + position + CRLF.len()))
}

fn parse_length(header: &str) -> Result<usize, RespError> {
    if header.is_empty() || !header.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RespError::Protocol(format!("invalid length '{}'", header)));
    }

    header
        .parse::<usize>()
        .map_err(|_| RespError::Protocol(format!("invalid length '{}'", header)))
}

fn parse_bulk_length(header: &str) -> Result<usize, RespError> {
    let length = parse_length(header)?;

    if length > MAX_BULK_LENGTH {
        return Err(RespError::Protocol(format!("invalid bulk length '{}'", header)));
    }

    Ok(length)
}

fn checked_offset(start: usize, length: usize) -> Result<usize, RespError> {
    start
        .checked_add(length)
        .ok_or_else(|| RespError::Protocol("frame length overflows buffer offset".to_string()))
}
