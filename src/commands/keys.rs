use std::sync::Arc;

use globset::Glob;

use crate::{
    commands::{CommandError, CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct KeysArguments {
    pub pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [pattern]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::InvalidKeysCommand)?;

        Ok(KeysArguments { pattern })
    }
}

pub async fn keys(
    store: Arc<KeyValueStore>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;

    let glob = Glob::new(&keys_arguments.pattern)
        .map_err(|e| CommandError::InvalidGlobPattern(e.to_string()))?
        .compile_matcher();

    let mut keys = store.keys().await;
    keys.sort();

    let response = keys
        .into_iter()
        .filter(|key| glob.is_match(key))
        .map(RespValue::BulkString)
        .collect();

    Ok(CommandResult::Response(RespValue::Array(response).encode()))
}
