use std::process::ExitCode;

use replikv::server::{CliError, RedisServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server = match RedisServer::new(std::env::args()) {
        Ok(server) => server,
        Err(CliError::Help(text)) => {
            println!("{}", text);
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::from(2));
        }
    };

    server.run().await?;

    Ok(ExitCode::SUCCESS)
}
