//! RDB snapshot loading.
//!
//! The snapshot is read once at startup into an immutable record set. See
//! <https://rdb.fnordig.de/file_format.html> for the format.

mod encoding;
mod get_slice;
mod opcode;
mod rdb_file_operations;
mod rdb_parser;

use thiserror::Error;

pub use rdb_file_operations::{empty_rdb, load_snapshot, snapshot_payload};
pub use rdb_parser::{RdbEntry, RdbParser};

#[derive(Error, Debug)]
pub enum RdbError {
    #[error("unexpected end of snapshot data")]
    UnexpectedEof,
    #[error("invalid snapshot header: {0}")]
    InvalidHeader(String),
    #[error("unsupported encoding: 0x{0:02X}")]
    UnsupportedEncoding(u8),
    #[error("unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),
    #[error("invalid UTF-8 in snapshot string")]
    InvalidUtf8,
    #[error("invalid expiration timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
