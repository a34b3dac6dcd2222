//! REPLCONF command implementation.
//!
//! Replicas send REPLCONF during the handshake to announce their listening
//! port and capabilities. The master records nothing and always acknowledges.

use crate::{
    commands::{CommandError, CommandResult},
    resp::RespValue,
};

#[derive(Debug, PartialEq)]
enum ReplconfConfiguration {
    ListeningPort(String),
    Capability(String),
    Other { name: String, value: String },
}

/// Represents the parsed arguments for the REPLCONF command.
pub struct ReplconfArguments {
    configuration: Vec<ReplconfConfiguration>,
}

impl ReplconfArguments {
    /// Parses `REPLCONF <option> <value> [<option> <value> ...]`.
    ///
    /// # Returns
    ///
    /// * `Ok(ReplconfArguments)` - Successfully parsed option/value pairs
    /// * `Err(CommandError::InvalidReplconfCommand)` - If there are no arguments or
    ///   an option is missing its value
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() % 2 != 0 {
            return Err(CommandError::InvalidReplconfCommand);
        }

        let configuration = arguments
            .chunks(2)
            .map(|pair| {
                let (name, value) = (pair[0].clone(), pair[1].clone());

                match name.to_lowercase().as_str() {
                    "listening-port" => ReplconfConfiguration::ListeningPort(value),
                    "capa" => ReplconfConfiguration::Capability(value),
                    _ => ReplconfConfiguration::Other { name, value },
                }
            })
            .collect();

        Ok(Self { configuration })
    }
}

/// Handles the REPLCONF command.
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - Always `+OK`
/// * `Err(CommandError::InvalidReplconfCommand)` - If argument parsing fails
pub fn replconf(
    client_address: &str,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let replconf_arguments = ReplconfArguments::parse(arguments)?;

    for configuration in replconf_arguments.configuration {
        match configuration {
            ReplconfConfiguration::ListeningPort(port) => {
                tracing::debug!(client = %client_address, port = %port, "replica listening port");
            }
            ReplconfConfiguration::Capability(capability) => {
                tracing::debug!(client = %client_address, capability = %capability, "replica capability");
            }
            ReplconfConfiguration::Other { name, value } => {
                tracing::debug!(client = %client_address, name = %name, value = %value, "ignoring REPLCONF option");
            }
        }
    }

    Ok(CommandResult::Response(
        RespValue::SimpleString("OK".to_string()).encode(),
    ))
}
