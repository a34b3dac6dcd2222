use std::sync::Arc;

use crate::{
    commands::{CommandError, CommandResult},
    resp::RespValue,
    server::RedisServer,
};

pub struct ConfigGetArguments {
    pub parameters: Vec<String>,
}

impl ConfigGetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::InvalidConfigGetCommand);
        }

        Ok(ConfigGetArguments {
            parameters: arguments,
        })
    }
}

/// Replies with a flat `[name, value, ...]` array for `dir` and `dbfilename`.
pub async fn config_get(
    server: Arc<RedisServer>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;
    let mut response = Vec::new();

    for parameter in config_get_arguments.parameters {
        let value = match parameter.to_lowercase().as_str() {
            "dir" => server.rdb_directory.clone(),
            "dbfilename" => server.rdb_filename.clone(),
            _ => return Err(CommandError::InvalidConfigGetCommandArgument),
        };

        response.push(RespValue::BulkString(parameter));
        response.push(RespValue::BulkString(value));
    }

    Ok(CommandResult::Response(RespValue::Array(response).encode()))
}
