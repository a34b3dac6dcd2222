//! PSYNC command implementation.
//!
//! Only full resynchronization is supported: whatever replication id and
//! offset the replica asks for, the master answers with `FULLRESYNC`.

use std::sync::Arc;

use crate::{
    commands::{CommandError, CommandResult},
    resp::RespValue,
    server::RedisServer,
};

/// Represents the parsed arguments for the PSYNC command.
pub struct PsyncArguments {
    /// The replication ID known to the replica, `?` when it has none
    pub master_repl_id: String,
    /// The replica's replication offset, `-1` when it has none
    pub offset: i64,
}

impl PsyncArguments {
    /// # Returns
    ///
    /// * `Ok(PsyncArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::InvalidPsyncCommand)` - If not exactly 2 arguments
    /// * `Err(CommandError::InvalidPsyncOffset)` - If offset is not a valid integer
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [master_repl_id, offset]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::InvalidPsyncCommand)?;

        let offset = offset
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidPsyncOffset)?;

        Ok(Self {
            master_repl_id,
            offset,
        })
    }
}

/// Handles the PSYNC command.
///
/// Returns [`CommandResult::Sync`] carrying `+FULLRESYNC <repl_id> <offset>`.
/// The connection dispatcher writes it, streams the snapshot and registers
/// the connection as a replica.
pub fn psync(server: Arc<RedisServer>, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let psync_arguments = PsyncArguments::parse(arguments)?;

    tracing::debug!(
        requested_repl_id = %psync_arguments.master_repl_id,
        requested_offset = psync_arguments.offset,
        "full resynchronization requested"
    );

    Ok(CommandResult::Sync(
        RespValue::SimpleString(format!(
            "FULLRESYNC {} {}",
            server.repl_id, server.repl_offset
        ))
        .encode(),
    ))
}
