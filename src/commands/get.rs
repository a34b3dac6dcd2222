use std::sync::Arc;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::InvalidGetCommand)?;

        Ok(Self { key })
    }
}

/// Handles the GET command.
///
/// Looks the key up in the live mapping, then in the snapshot. Expired
/// entries are reported as absent.
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - A bulk string with the value, or a null
///   bulk string when the key is absent
/// * `Err(CommandError::InvalidGetCommand)` - If the number of arguments is not exactly 1
pub async fn get(
    store: Arc<KeyValueStore>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let response = match store.get(&get_arguments.key).await {
        Some(value) => RespValue::BulkString(value),
        None => RespValue::Null,
    };

    Ok(CommandResult::Response(response.encode()))
}
