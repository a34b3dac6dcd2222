use bytes::BytesMut;
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};

use crate::{
    input::{read_reply, read_snapshot_payload, CommandReadError},
    resp::RespValue,
};

#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("could not connect to master at {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },
    #[error("could not send {step} to master: {source}")]
    Write {
        step: &'static str,
        source: std::io::Error,
    },
    #[error("could not read {step} reply from master: {source}")]
    Read {
        step: &'static str,
        source: CommandReadError,
    },
    #[error("unexpected {step} reply from master: {reply}")]
    UnexpectedReply { step: &'static str, reply: String },
}

/// Identity announced by the master in its `FULLRESYNC` reply.
#[derive(Debug, Clone, PartialEq)]
pub struct FullResync {
    pub replication_id: String,
    pub offset: i64,
}

pub async fn connect_to_master(host: &str, port: u16) -> Result<TcpStream, HandshakeError> {
    let address = format!("{}:{}", host, port);

    TcpStream::connect(&address)
        .await
        .map_err(|source| HandshakeError::Connect { address, source })
}

/// Runs the four-step replica handshake on an open master connection.
///
/// Replies to `PING` and both `REPLCONF` commands are logged and otherwise
/// ignored. The snapshot sent after `FULLRESYNC` is read and discarded. Any
/// bytes the master sent after the snapshot stay in `buffer`.
pub async fn handshake<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    listening_port: u16,
) -> Result<FullResync, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let listening_port = listening_port.to_string();

    let reply = send_and_read_reply(stream, buffer, "PING", &["PING"]).await?;
    tracing::debug!(?reply, "master answered PING");

    let reply = send_and_read_reply(
        stream,
        buffer,
        "REPLCONF listening-port",
        &["REPLCONF", "listening-port", &listening_port],
    )
    .await?;
    tracing::debug!(?reply, "master answered REPLCONF listening-port");

    let reply = send_and_read_reply(
        stream,
        buffer,
        "REPLCONF capa",
        &["REPLCONF", "capa", "psync2"],
    )
    .await?;
    tracing::debug!(?reply, "master answered REPLCONF capa");

    let reply = send_and_read_reply(stream, buffer, "PSYNC", &["PSYNC", "?", "-1"]).await?;
    let full_resync = parse_full_resync(reply)?;

    let snapshot = read_snapshot_payload(stream, buffer)
        .await
        .map_err(|source| HandshakeError::Read {
            step: "snapshot",
            source,
        })?;

    tracing::info!(
        replication_id = %full_resync.replication_id,
        offset = full_resync.offset,
        snapshot_bytes = snapshot.len(),
        "completed handshake with master"
    );

    Ok(full_resync)
}

async fn send_and_read_reply<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    step: &'static str,
    command: &[&str],
) -> Result<RespValue, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = RespValue::command(command).encode();

    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|source| HandshakeError::Write { step, source })?;
    stream
        .flush()
        .await
        .map_err(|source| HandshakeError::Write { step, source })?;

    read_reply(stream, buffer)
        .await
        .map_err(|source| HandshakeError::Read { step, source })
}

/// Parses `FULLRESYNC <replid> <offset>`.
fn parse_full_resync(reply: RespValue) -> Result<FullResync, HandshakeError> {
    let unexpected = |reply: &RespValue| HandshakeError::UnexpectedReply {
        step: "PSYNC",
        reply: reply.encode().trim_end().to_string(),
    };

    let RespValue::SimpleString(line) = &reply else {
        return Err(unexpected(&reply));
    };

    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        ["FULLRESYNC", replication_id, offset] => {
            let offset = offset.parse::<i64>().map_err(|_| unexpected(&reply))?;

            Ok(FullResync {
                replication_id: replication_id.to_string(),
                offset,
            })
        }
        _ => Err(unexpected(&reply)),
    }
}
