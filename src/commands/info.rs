use std::sync::Arc;

use crate::{
    commands::{CommandError, CommandResult},
    replication::ReplicationManager,
    resp::RespValue,
    server::RedisServer,
};

enum InfoSection {
    Default,
    Replication,
}

pub struct InfoArguments {
    section: InfoSection,
}

impl InfoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::InvalidInfoCommand);
        }

        let Some(section) = arguments.first() else {
            return Ok(InfoArguments {
                section: InfoSection::Default,
            });
        };

        let section = match section.to_lowercase().as_str() {
            "replication" => InfoSection::Replication,
            _ => return Err(CommandError::InvalidInfoSection),
        };

        Ok(InfoArguments { section })
    }
}

pub async fn info(
    server: Arc<RedisServer>,
    replication: Arc<ReplicationManager>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let info_arguments = InfoArguments::parse(arguments)?;

    // Replication is the only section tracked, so it is also the default.
    let fields = match info_arguments.section {
        InfoSection::Default | InfoSection::Replication => {
            server.replication_info(replication.replica_count().await)
        }
    };

    let body = fields
        .iter()
        .map(|(name, value)| format!("{}:{}", name, value))
        .collect::<Vec<_>>()
        .join("\r\n");

    Ok(CommandResult::Response(RespValue::BulkString(body).encode()))
}
