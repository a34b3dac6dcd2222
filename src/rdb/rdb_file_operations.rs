use std::path::Path;

use crate::rdb::{RdbError, RdbParser};

/// A valid snapshot with metadata and no keys, sent to replicas when the
/// master has no snapshot file of its own.
const EMPTY_RDB_HEX: &str = "524544495330303131fa0972656469732d76657205372e322e30fa0a72656469732d62697473c040fa056374696d65c26d08bc65fa08757365642d6d656dc2b0c41000fa08616f662d62617365c000fff06e3bfec0ff5aa2";

pub fn empty_rdb() -> Result<Vec<u8>, RdbError> {
    hex::decode(EMPTY_RDB_HEX).map_err(|e| RdbError::InvalidHeader(e.to_string()))
}

/// Reads and parses the snapshot file at `path`.
pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<RdbParser, RdbError> {
    let bytes = tokio::fs::read(path.as_ref()).await?;

    let mut rdb_parser = RdbParser::new();
    rdb_parser.parse(&bytes)?;

    tracing::debug!(
        path = %path.as_ref().display(),
        keys = rdb_parser.entries.len(),
        "parsed snapshot file"
    );

    Ok(rdb_parser)
}

/// Returns the bytes to transfer to a replica after `FULLRESYNC`: the
/// snapshot file at `path` if it exists, otherwise the built-in empty image.
pub async fn snapshot_payload(path: impl AsRef<Path>) -> Result<Vec<u8>, RdbError> {
    match tokio::fs::read(path.as_ref()).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => empty_rdb(),
        Err(e) => Err(e.into()),
    }
}
