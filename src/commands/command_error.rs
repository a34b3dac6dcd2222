use thiserror::Error;

use crate::resp::RespValue;

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,
    #[error("invalid command argument")]
    InvalidCommandArgument,
    #[error("invalid PING command")]
    InvalidPingCommand,
    #[error("invalid ECHO command")]
    InvalidEchoCommand,
    #[error("invalid GET command")]
    InvalidGetCommand,
    #[error("invalid SET command")]
    InvalidSetCommand,
    #[error("invalid SET command argument")]
    InvalidSetCommandArgument,
    #[error("invalid SET command expiration")]
    InvalidSetCommandExpiration,
    #[error("invalid CONFIG GET command")]
    InvalidConfigGetCommand,
    #[error("invalid CONFIG GET command argument")]
    InvalidConfigGetCommandArgument,
    #[error("invalid KEYS command")]
    InvalidKeysCommand,
    #[error("invalid glob pattern: {0}")]
    InvalidGlobPattern(String),
    #[error("invalid INFO command")]
    InvalidInfoCommand,
    #[error("invalid INFO section")]
    InvalidInfoSection,
    #[error("invalid REPLCONF command")]
    InvalidReplconfCommand,
    #[error("invalid PSYNC command")]
    InvalidPsyncCommand,
    #[error("invalid PSYNC offset")]
    InvalidPsyncOffset,
    #[error("PSYNC is only supported by a master")]
    PsyncOnReplica,
}

impl CommandError {
    pub fn as_string(&self) -> String {
        match self {
            CommandError::InvalidCommand => {
                RespValue::Error("ERR Invalid command".to_string()).encode()
            }
            CommandError::InvalidCommandArgument => {
                RespValue::Error("ERR Invalid command argument".to_string()).encode()
            }
            CommandError::InvalidPingCommand => {
                RespValue::Error("ERR wrong number of arguments for 'ping' command".to_string())
                    .encode()
            }
            CommandError::InvalidEchoCommand => {
                RespValue::Error("ERR wrong number of arguments for 'echo' command".to_string())
                    .encode()
            }
            CommandError::InvalidGetCommand => {
                RespValue::Error("ERR wrong number of arguments for 'get' command".to_string())
                    .encode()
            }
            CommandError::InvalidSetCommand => {
                RespValue::Error("ERR wrong number of arguments for 'set' command".to_string())
                    .encode()
            }
            CommandError::InvalidSetCommandArgument => {
                RespValue::Error("ERR syntax error".to_string()).encode()
            }
            // The write is dropped but the client still gets an acknowledgement.
            CommandError::InvalidSetCommandExpiration => {
                RespValue::SimpleString("OK".to_string()).encode()
            }
            CommandError::InvalidConfigGetCommand => RespValue::Error(
                "ERR wrong number of arguments for 'config|get' command".to_string(),
            )
            .encode(),
            CommandError::InvalidConfigGetCommandArgument => {
                RespValue::Error("ERR Invalid CONFIG GET command argument".to_string()).encode()
            }
            CommandError::InvalidKeysCommand => {
                RespValue::Error("ERR wrong number of arguments for 'keys' command".to_string())
                    .encode()
            }
            CommandError::InvalidGlobPattern(e) => {
                RespValue::Error(format!("ERR Invalid pattern: {}", e)).encode()
            }
            CommandError::InvalidInfoCommand => {
                RespValue::Error("ERR Invalid INFO command".to_string()).encode()
            }
            CommandError::InvalidInfoSection => {
                RespValue::Error("ERR Invalid INFO section".to_string()).encode()
            }
            CommandError::InvalidReplconfCommand => {
                RespValue::Error("ERR wrong number of arguments for 'replconf' command".to_string())
                    .encode()
            }
            CommandError::InvalidPsyncCommand => {
                RespValue::Error("ERR wrong number of arguments for 'psync' command".to_string())
                    .encode()
            }
            CommandError::InvalidPsyncOffset => {
                RespValue::Error("ERR Invalid PSYNC offset".to_string()).encode()
            }
            CommandError::PsyncOnReplica => {
                RespValue::Error("ERR PSYNC is only supported by a master".to_string()).encode()
            }
        }
    }
}
