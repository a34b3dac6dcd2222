use std::sync::Arc;

use crate::{
    commands::{
        command_error::CommandError,
        config_get::config_get,
        echo::echo,
        get::get,
        info::info,
        keys::keys,
        ping::ping,
        replication::{psync, replconf},
        set::set,
    },
    key_value_store::KeyValueStore,
    replication::ReplicationManager,
    resp::RespValue,
    server::RedisServer,
};

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Nothing is written back to the connection.
    NoResponse,
    /// An encoded reply for the connection.
    Response(String),
    /// A `FULLRESYNC` reply; the connection becomes a replica.
    Sync(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<String>,
    pub input: RespValue,
}

impl CommandHandler {
    /// Splits a decoded request into an upper-cased command name and its
    /// arguments. `CONFIG GET` is treated as a single command name.
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = &input else {
            return Err(CommandError::InvalidCommand);
        };

        let mut strings = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                RespValue::BulkString(s) => strings.push(s.clone()),
                _ => return Err(CommandError::InvalidCommandArgument),
            }
        }

        let mut strings = strings.into_iter();

        let Some(name) = strings.next() else {
            return Err(CommandError::InvalidCommand);
        };
        let mut name = name.to_uppercase();
        let mut arguments: Vec<String> = strings.collect();

        if name == "CONFIG"
            && arguments
                .first()
                .is_some_and(|sub_command| sub_command.eq_ignore_ascii_case("GET"))
        {
            name = "CONFIG GET".to_string();
            arguments.remove(0);
        }

        Ok(Self {
            name,
            arguments,
            input,
        })
    }

    pub fn is_write_command(&self) -> bool {
        self.name == "SET"
    }

    /// Commands answered the same way regardless of the node's role.
    async fn handle_command(
        &self,
        server: Arc<RedisServer>,
        client_address: &str,
        store: Arc<KeyValueStore>,
        replication: Arc<ReplicationManager>,
    ) -> Result<CommandResult, CommandError> {
        match self.name.as_str() {
            "PING" => ping(self.arguments.clone()),
            "ECHO" => echo(self.arguments.clone()),
            "GET" => get(store, self.arguments.clone()).await,
            "SET" => set(store, self.arguments.clone()).await,
            "CONFIG GET" => config_get(server, self.arguments.clone()).await,
            "KEYS" => keys(store, self.arguments.clone()).await,
            "INFO" => info(server, replication, self.arguments.clone()).await,
            "REPLCONF" => replconf(client_address, self.arguments.clone()),
            _ => {
                tracing::debug!(command = %self.name, "acknowledging unknown command");
                Ok(CommandResult::Response(
                    RespValue::SimpleString("OK".to_string()).encode(),
                ))
            }
        }
    }

    /// Runs a client command on a master. Accepted writes are forwarded to
    /// every registered replica.
    pub async fn handle_command_for_master_server(
        &self,
        server: Arc<RedisServer>,
        client_address: &str,
        store: Arc<KeyValueStore>,
        replication: Arc<ReplicationManager>,
    ) -> Result<CommandResult, CommandError> {
        if self.name == "PSYNC" {
            return psync(server, self.arguments.clone());
        }

        let command_result = self
            .handle_command(server, client_address, store, Arc::clone(&replication))
            .await?;

        if self.is_write_command() {
            replication.propagate(&self.input).await;
        }

        Ok(command_result)
    }

    /// Runs a client command on a replica. Writes are applied locally and not
    /// forwarded anywhere.
    pub async fn handle_command_for_replica_server(
        &self,
        server: Arc<RedisServer>,
        client_address: &str,
        store: Arc<KeyValueStore>,
        replication: Arc<ReplicationManager>,
    ) -> Result<CommandResult, CommandError> {
        if self.name == "PSYNC" {
            return Err(CommandError::PsyncOnReplica);
        }

        self.handle_command(server, client_address, store, replication)
            .await
    }

    /// Applies a command streamed by the master. Only `SET` is applied and
    /// nothing is ever replied.
    pub async fn handle_command_for_replica_master_connection(
        &self,
        store: Arc<KeyValueStore>,
    ) -> Result<CommandResult, CommandError> {
        if self.is_write_command() {
            set(store, self.arguments.clone()).await?;
        } else {
            tracing::debug!(command = %self.name, "ignoring command from master");
        }

        Ok(CommandResult::NoResponse)
    }
}
