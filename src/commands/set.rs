use std::{sync::Arc, time::Duration};

use tokio::time::Instant;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Represents the parsed arguments for the SET command
#[derive(Debug, PartialEq)]
pub struct SetArguments {
    /// The key to write
    pub key: String,
    /// The value to be stored under the given key
    pub value: String,
    /// Time to live of the key value pair
    pub ttl: Option<Duration>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - A vector of strings representing the command arguments:
    ///   - Format 1: `[key, value]` - For permanent storage
    ///   - Format 2: `[key, value, "PX", milliseconds]` - Expiring storage
    ///   - Format 3: `[key, value, "EX", seconds]` - Expiring storage
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::InvalidSetCommand)` - If the number of arguments is not 2 or 4
    /// * `Err(CommandError::InvalidSetCommandArgument)` - If the expiration option is not "PX" or "EX"
    /// * `Err(CommandError::InvalidSetCommandExpiration)` - If the expiration time is not a
    ///   non-negative integer, or is too far in the future to be a deadline
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let result = SetArguments::parse(vec![
    ///     "mykey".to_string(),
    ///     "hello".to_string(),
    ///     "px".to_string(),
    ///     "1000".to_string()
    /// ]);
    /// // Returns: Ok(SetArguments { key: "mykey", value: "hello", ttl: Some(1s) })
    /// ```
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 4 {
            return Err(CommandError::InvalidSetCommand);
        }

        let mut arguments = arguments.into_iter();
        let (Some(key), Some(value)) = (arguments.next(), arguments.next()) else {
            return Err(CommandError::InvalidSetCommand);
        };

        let ttl = match (arguments.next(), arguments.next()) {
            (Some(option), Some(amount)) => {
                let amount = amount
                    .parse::<u64>()
                    .map_err(|_| CommandError::InvalidSetCommandExpiration);

                let ttl = match option.to_lowercase().as_str() {
                    "px" => Duration::from_millis(amount?),
                    "ex" => Duration::from_secs(amount?),
                    _ => return Err(CommandError::InvalidSetCommandArgument),
                };

                // The deadline must be representable as an instant.
                if Instant::now().checked_add(ttl).is_none() {
                    return Err(CommandError::InvalidSetCommandExpiration);
                }

                Some(ttl)
            }
            _ => None,
        };

        Ok(Self { key, value, ttl })
    }
}

/// Handles the SET command.
///
/// Stores a key-value pair in the live mapping with an optional expiration.
/// A non-numeric expiration drops the write; the caller still acknowledges it
/// because [`CommandError::InvalidSetCommandExpiration`] encodes as `+OK`.
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - `+OK` once the write is applied
/// * `Err(CommandError)` - If the arguments are invalid, see [`SetArguments::parse`]
pub async fn set(
    store: Arc<KeyValueStore>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let set_arguments = match SetArguments::parse(arguments) {
        Ok(set_arguments) => set_arguments,
        Err(e) => {
            if e == CommandError::InvalidSetCommandExpiration {
                tracing::warn!("dropping SET with invalid expiration");
            }

            return Err(e);
        }
    };

    if !store
        .set(set_arguments.key, set_arguments.value, set_arguments.ttl)
        .await
    {
        return Err(CommandError::InvalidSetCommandExpiration);
    }

    Ok(CommandResult::Response(
        RespValue::SimpleString("OK".to_string()).encode(),
    ))
}
