use std::sync::Arc;

use bytes::BytesMut;
use tokio::{
    io::AsyncWriteExt,
    net::{tcp::OwnedWriteHalf, TcpStream},
    sync::Mutex,
};

use crate::{
    commands::{CommandHandler, CommandResult},
    input::{new_read_buffer, read_and_parse_resp, CommandReadError},
    key_value_store::KeyValueStore,
    rdb::snapshot_payload,
    replication::ReplicationManager,
    resp::encode_snapshot_payload,
    server::{RedisRole, RedisServer},
};

pub type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Serves one client connection until it disconnects or sends a malformed
/// frame.
///
/// On a master, a connection that issues `PSYNC` is registered as a replica
/// after the snapshot transfer and gets no further replies. It is removed
/// from the registry when it disconnects.
pub async fn handle_client_connection(
    stream: TcpStream,
    client_address: String,
    server: Arc<RedisServer>,
    store: Arc<KeyValueStore>,
    replication: Arc<ReplicationManager>,
) {
    let mut buffer = new_read_buffer();

    let (mut reader, writer) = stream.into_split();
    let writer: SharedWriter = Arc::new(Mutex::new(writer));

    let mut is_replica = false;

    'connection: loop {
        let parsed_input = match read_and_parse_resp(&mut reader, &mut buffer).await {
            Ok(values) => values,
            Err(CommandReadError::ConnectionClosed) => {
                tracing::debug!(client = %client_address, "connection closed");
                break;
            }
            Err(e @ CommandReadError::RespParseError(_)) => {
                tracing::warn!(client = %client_address, error = %e, "closing connection");

                if !is_replica {
                    if let Err(e) = thread_safe_write_to_stream(&writer, e.as_string().as_bytes()).await {
                        tracing::warn!(client = %client_address, error = %e, "error writing to stream");
                    }
                }

                break;
            }
            Err(e) => {
                tracing::warn!(client = %client_address, error = %e, "error reading from stream");
                break;
            }
        };

        for input in parsed_input {
            if is_replica {
                tracing::debug!(replica = %client_address, ?input, "ignoring command from replica");
                continue;
            }

            let command_handler = match CommandHandler::new(input) {
                Ok(handler) => handler,
                Err(e) => {
                    if let Err(e) = thread_safe_write_to_stream(&writer, e.as_string().as_bytes()).await {
                        tracing::warn!(client = %client_address, error = %e, "error writing to stream");
                        break 'connection;
                    }
                    continue;
                }
            };

            let command_result = match server.role {
                RedisRole::Master => {
                    command_handler
                        .handle_command_for_master_server(
                            Arc::clone(&server),
                            &client_address,
                            Arc::clone(&store),
                            Arc::clone(&replication),
                        )
                        .await
                }
                RedisRole::Replica(_) => {
                    command_handler
                        .handle_command_for_replica_server(
                            Arc::clone(&server),
                            &client_address,
                            Arc::clone(&store),
                            Arc::clone(&replication),
                        )
                        .await
                }
            };

            let response = match command_result {
                Ok(CommandResult::NoResponse) => continue,
                Ok(CommandResult::Response(response)) => response,
                Ok(CommandResult::Sync(response)) => {
                    if let Err(e) = start_full_resync(&server, &writer, &response).await {
                        tracing::warn!(replica = %client_address, error = %e, "full resync failed");
                        break 'connection;
                    }

                    replication
                        .register(client_address.clone(), Arc::clone(&writer))
                        .await;
                    is_replica = true;

                    continue;
                }
                Err(e) => e.as_string(),
            };

            if let Err(e) = thread_safe_write_to_stream(&writer, response.as_bytes()).await {
                tracing::warn!(client = %client_address, error = %e, "error writing to stream");
                break 'connection;
            }
        }
    }

    if is_replica {
        replication.unregister(&client_address).await;
    }
}

/// Writes the `FULLRESYNC` reply followed by the snapshot transfer.
async fn start_full_resync(
    server: &RedisServer,
    writer: &SharedWriter,
    response: &str,
) -> anyhow::Result<()> {
    let snapshot = snapshot_payload(server.rdb_path()).await?;

    let mut writer_guard = writer.lock().await;
    writer_guard.write_all(response.as_bytes()).await?;
    writer_guard
        .write_all(&encode_snapshot_payload(&snapshot))
        .await?;
    writer_guard.flush().await?;

    tracing::debug!(snapshot_bytes = snapshot.len(), "snapshot sent to replica");

    Ok(())
}

/// Applies the write stream coming from the master on a replica.
///
/// `buffer` holds whatever the handshake already read past the snapshot. The
/// master is never expected to close this stream, so its end is logged as an
/// error.
pub async fn handle_master_connection(
    mut stream: TcpStream,
    mut buffer: BytesMut,
    store: Arc<KeyValueStore>,
) {
    loop {
        let parsed_input = match read_and_parse_resp(&mut stream, &mut buffer).await {
            Ok(values) => values,
            Err(CommandReadError::ConnectionClosed) => {
                tracing::error!("master closed the replication stream");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "replication stream failed");
                break;
            }
        };

        for input in parsed_input {
            let command_handler = match CommandHandler::new(input) {
                Ok(handler) => handler,
                Err(e) => {
                    tracing::warn!(error = %e, "invalid command from master");
                    continue;
                }
            };

            if let Err(e) = command_handler
                .handle_command_for_replica_master_connection(Arc::clone(&store))
                .await
            {
                tracing::warn!(command = %command_handler.name, error = %e, "failed to apply command from master");
            }
        }
    }
}

pub async fn thread_safe_write_to_stream(
    writer: &SharedWriter,
    response: &[u8],
) -> tokio::io::Result<()> {
    let mut writer_guard = writer.lock().await;
    writer_guard.write_all(response).await?;
    writer_guard.flush().await?;

    Ok(())
}

