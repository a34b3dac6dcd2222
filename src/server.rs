use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{error::ErrorKind, Parser};
use rand::RngCore;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::{
    connection::{handle_client_connection, handle_master_connection},
    input::new_read_buffer,
    key_value_store::KeyValueStore,
    rdb::load_snapshot,
    replication::{connect_to_master, handshake, ReplicationManager},
};

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("Invalid command line flag: {0}")]
    InvalidCommandLineFlag(String),
    #[error("Invalid command line flag value: {0}")]
    InvalidCommandLineFlagValue(String),
    /// `--help` or `--version` was requested; holds the rendered text.
    #[error("{0}")]
    Help(String),
}

#[derive(Parser, Debug)]
#[command(name = "replikv", version, about = "Key-value server with master/replica replication")]
struct CommandLineArgs {
    /// Port to listen on
    #[arg(long, default_value_t = 6379)]
    port: u16,

    /// Run as a replica of the master at "<host> <port>"
    #[arg(long, value_name = "HOST PORT", value_parser = parse_replica_of)]
    replicaof: Option<(String, u16)>,

    /// Directory holding the snapshot file
    #[arg(long, default_value = ".")]
    dir: String,

    /// Snapshot file name
    #[arg(long, default_value = "dump.rdb")]
    dbfilename: String,
}

fn parse_replica_of(value: &str) -> Result<(String, u16), String> {
    let parts: Vec<&str> = value.split_whitespace().collect();

    match parts.as_slice() {
        [host, port] => {
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("invalid master port '{}'", port))?;

            Ok((host.to_string(), port))
        }
        _ => Err(format!("expected \"<host> <port>\", got '{}'", value)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedisRole {
    Master,
    Replica((String, u16)),
}

impl RedisRole {
    pub fn as_string(&self) -> &'static str {
        match self {
            RedisRole::Master => "master",
            RedisRole::Replica(_) => "slave",
        }
    }
}

/// Node identity and configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct RedisServer {
    pub port: u16,
    pub role: RedisRole,
    pub repl_id: String,
    pub repl_offset: u64,
    pub rdb_directory: String,
    pub rdb_filename: String,
}

impl RedisServer {
    /// Builds the node configuration from command line arguments. The first
    /// item is the program name.
    pub fn new<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let args = CommandLineArgs::try_parse_from(command_line_args).map_err(|e| {
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => CliError::Help(e.to_string()),
                ErrorKind::UnknownArgument => CliError::InvalidCommandLineFlag(e.to_string()),
                _ => CliError::InvalidCommandLineFlagValue(e.to_string()),
            }
        })?;

        let role = match args.replicaof {
            Some(master) => RedisRole::Replica(master),
            None => RedisRole::Master,
        };

        Ok(RedisServer {
            port: args.port,
            role,
            repl_id: generate_replication_id(),
            repl_offset: 0,
            rdb_directory: args.dir,
            rdb_filename: args.dbfilename,
        })
    }

    pub fn rdb_path(&self) -> PathBuf {
        PathBuf::from(&self.rdb_directory).join(&self.rdb_filename)
    }

    /// Fields of the `INFO replication` section, in display order.
    pub fn replication_info(&self, connected_replicas: usize) -> Vec<(&'static str, String)> {
        match &self.role {
            RedisRole::Master => vec![
                ("role", self.role.as_string().to_string()),
                ("connected_slaves", connected_replicas.to_string()),
                ("master_replid", self.repl_id.clone()),
                ("master_repl_offset", self.repl_offset.to_string()),
            ],
            RedisRole::Replica((host, port)) => vec![
                ("role", self.role.as_string().to_string()),
                ("master_host", host.clone()),
                ("master_port", port.to_string()),
            ],
        }
    }

    /// Loads the configured snapshot into a new store. A missing or
    /// unreadable snapshot yields an empty store.
    pub async fn load_store(&self) -> Arc<KeyValueStore> {
        let path = self.rdb_path();

        match load_snapshot(&path).await {
            Ok(rdb_parser) => {
                tracing::info!(
                    path = %path.display(),
                    keys = rdb_parser.entries.len(),
                    "loaded snapshot"
                );
                KeyValueStore::with_snapshot(rdb_parser.entries)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "starting with an empty store");
                KeyValueStore::new()
            }
        }
    }

    /// Binds the configured port and serves until the listener fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let address = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;

        serve(self, listener).await
    }
}

fn generate_replication_id() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);

    hex::encode(bytes)
}

/// Starts a node on an already bound listener.
///
/// Loads the snapshot, then, for a replica, connects to the master and runs
/// the handshake before accepting clients. Failing to reach the master is an
/// error; a handshake that breaks off is logged and the replica keeps serving
/// its own snapshot.
pub async fn serve(server: RedisServer, listener: TcpListener) -> anyhow::Result<()> {
    let server = Arc::new(server);
    let store = server.load_store().await;
    let replication = Arc::new(ReplicationManager::new());

    if let RedisRole::Replica((host, port)) = &server.role {
        let mut stream = connect_to_master(host, *port).await?;
        let mut buffer = new_read_buffer();

        match handshake(&mut stream, &mut buffer, server.port).await {
            Ok(_) => {
                tokio::spawn(handle_master_connection(stream, buffer, Arc::clone(&store)));
            }
            Err(e) => {
                tracing::error!(error = %e, "handshake with master failed");
            }
        }
    }

    tracing::info!(
        address = %listener.local_addr()?,
        role = server.role.as_string(),
        "accepting connections"
    );

    loop {
        let (stream, address) = listener
            .accept()
            .await
            .context("failed to accept connection")?;

        tracing::debug!(client = %address, "accepted connection");

        tokio::spawn(handle_client_connection(
            stream,
            address.to_string(),
            Arc::clone(&server),
            Arc::clone(&store),
            Arc::clone(&replication),
        ));
    }
}
