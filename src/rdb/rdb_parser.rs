use std::collections::HashMap;

use jiff::Timestamp;

use crate::rdb::{
    opcode::{parse_magic_string, parse_opcode, OpCodeResponse},
    RdbError,
};

/// A string value loaded from a snapshot, with its absolute expiry if any.
#[derive(Debug, Clone, PartialEq)]
pub struct RdbEntry {
    pub value: String,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Default)]
pub struct RdbParser {
    pub magic_string: Option<String>,
    pub redis_version: Option<String>,
    pub metadata: HashMap<String, String>,
    pub db_number: Option<usize>,
    pub hash_table_size: Option<usize>,
    pub expiry_hash_table_size: Option<usize>,
    pub entries: HashMap<String, RdbEntry>,
    pub crc64_checksum: Option<Vec<u8>>,
}

impl RdbParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a complete snapshot image.
    ///
    /// Records whose expiry is not after the current time are dropped. Parsing
    /// stops at the end-of-file opcode; a stream that ends before it is an
    /// [`RdbError::UnexpectedEof`].
    pub fn parse(&mut self, bytes: &[u8]) -> Result<(), RdbError> {
        self.parse_at(bytes, Timestamp::now())
    }

    /// Same as [`RdbParser::parse`], with expiry evaluated against `now`.
    pub fn parse_at(&mut self, bytes: &[u8], now: Timestamp) -> Result<(), RdbError> {
        let magic_string_response = parse_magic_string(bytes)?;
        let mut cursor = magic_string_response.number_of_read_bytes;
        self.magic_string = Some(magic_string_response.magic_string);
        self.redis_version = Some(magic_string_response.redis_version);

        loop {
            let (result, bytes_read) = parse_opcode(bytes, cursor)?;
            cursor += bytes_read;

            match result {
                OpCodeResponse::Metadata { key, value } => {
                    self.metadata.insert(key, value);
                }
                OpCodeResponse::ResizeDb {
                    db_hash_table_size,
                    expiry_hash_table_size,
                } => {
                    self.hash_table_size = Some(db_hash_table_size);
                    self.expiry_hash_table_size = Some(expiry_hash_table_size);
                }
                OpCodeResponse::Database { database_number } => {
                    self.db_number = Some(database_number);
                }
                OpCodeResponse::ExpirationSeconds {
                    key,
                    value,
                    expiration,
                } => {
                    let expires_at = Timestamp::from_second(expiration)
                        .map_err(|e| RdbError::InvalidTimestamp(e.to_string()))?;
                    self.insert_unless_expired(key, value, expires_at, now);
                }
                OpCodeResponse::ExpirationMilliseconds {
                    key,
                    value,
                    expiration,
                } => {
                    let expires_at = Timestamp::from_millisecond(expiration)
                        .map_err(|e| RdbError::InvalidTimestamp(e.to_string()))?;
                    self.insert_unless_expired(key, value, expires_at, now);
                }
                OpCodeResponse::KeyValuePair { key, value } => {
                    self.entries.insert(
                        key,
                        RdbEntry {
                            value,
                            expires_at: None,
                        },
                    );
                }
                OpCodeResponse::EndOfFile { crc64_checksum } => {
                    self.crc64_checksum = crc64_checksum;
                    return Ok(());
                }
            }
        }
    }

    fn insert_unless_expired(
        &mut self,
        key: String,
        value: String,
        expires_at: Timestamp,
        now: Timestamp,
    ) {
        if expires_at <= now {
            tracing::debug!(key = %key, "dropping expired snapshot entry");
            return;
        }

        self.entries.insert(
            key,
            RdbEntry {
                value,
                expires_at: Some(expires_at),
            },
        );
    }
}
