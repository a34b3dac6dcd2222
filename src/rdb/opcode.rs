use crate::rdb::{
    encoding::{parse_length_encoded_integer, parse_string},
    get_slice::{get_array, get_buffer_slice, get_byte},
    RdbError,
};

const METADATA_OPCODE: u8 = 0xFA;
const RESIZE_DB_OPCODE: u8 = 0xFB;
const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
const DATABASE_OPCODE: u8 = 0xFE;
const END_OF_FILE_OPCODE: u8 = 0xFF;
const STRING_VALUE_TYPE: u8 = 0x00;

const MAGIC_STRING: &str = "REDIS";
const MAGIC_STRING_LENGTH: usize = 5;
const VERSION_LENGTH: usize = 4;
const CHECKSUM_LENGTH: usize = 8;

#[derive(Debug, PartialEq)]
pub enum OpCodeResponse {
    Metadata {
        key: String,
        value: String,
    },
    ResizeDb {
        db_hash_table_size: usize,
        expiry_hash_table_size: usize,
    },
    Database {
        database_number: usize,
    },
    ExpirationSeconds {
        key: String,
        value: String,
        expiration: i64,
    },
    ExpirationMilliseconds {
        key: String,
        value: String,
        expiration: i64,
    },
    EndOfFile {
        crc64_checksum: Option<Vec<u8>>,
    },
    KeyValuePair {
        key: String,
        value: String,
    },
}

/// Parses the record starting at `cursor` and returns it together with the
/// number of bytes it occupied.
pub fn parse_opcode(bytes: &[u8], cursor: usize) -> Result<(OpCodeResponse, usize), RdbError> {
    let mut temp_cursor = cursor;
    let opcode = get_byte(bytes, temp_cursor)?;
    temp_cursor += 1;

    let response = match opcode {
        METADATA_OPCODE => {
            let (key, key_bytes) = parse_string(bytes, temp_cursor)?;
            temp_cursor += key_bytes;
            let (value, value_bytes) = parse_string(bytes, temp_cursor)?;
            temp_cursor += value_bytes;

            OpCodeResponse::Metadata { key, value }
        }
        RESIZE_DB_OPCODE => {
            let (db_hash_table_size, db_bytes) = parse_length_encoded_integer(bytes, temp_cursor)?;
            temp_cursor += db_bytes;

            let (expiry_hash_table_size, expiry_bytes) =
                parse_length_encoded_integer(bytes, temp_cursor)?;
            temp_cursor += expiry_bytes;

            OpCodeResponse::ResizeDb {
                db_hash_table_size,
                expiry_hash_table_size,
            }
        }
        DATABASE_OPCODE => {
            let (database_number, database_bytes) =
                parse_length_encoded_integer(bytes, temp_cursor)?;
            temp_cursor += database_bytes;

            OpCodeResponse::Database { database_number }
        }
        EXPIRATION_SECONDS_OPCODE => {
            let unix_timestamp: [u8; 4] = get_array(bytes, temp_cursor)?;
            temp_cursor += 4;

            let (key, value, key_value_bytes) = parse_key_value_pair(bytes, temp_cursor)?;
            temp_cursor += key_value_bytes;

            OpCodeResponse::ExpirationSeconds {
                key,
                value,
                expiration: u32::from_le_bytes(unix_timestamp) as i64,
            }
        }
        EXPIRATION_MILLISECONDS_OPCODE => {
            let unix_timestamp: [u8; 8] = get_array(bytes, temp_cursor)?;
            temp_cursor += 8;

            let (key, value, key_value_bytes) = parse_key_value_pair(bytes, temp_cursor)?;
            temp_cursor += key_value_bytes;

            let expiration = i64::try_from(u64::from_le_bytes(unix_timestamp))
                .map_err(|e| RdbError::InvalidTimestamp(e.to_string()))?;

            OpCodeResponse::ExpirationMilliseconds {
                key,
                value,
                expiration,
            }
        }
        END_OF_FILE_OPCODE => {
            // Older snapshot versions end without a checksum.
            let crc64_checksum = get_buffer_slice(bytes, temp_cursor, CHECKSUM_LENGTH)
                .ok()
                .map(|checksum| checksum.to_vec());
            temp_cursor += crc64_checksum.as_ref().map_or(0, Vec::len);

            OpCodeResponse::EndOfFile { crc64_checksum }
        }
        _ => {
            // Anything else is the value type of a key/value pair without expiry.
            let (key, value, key_value_bytes) = parse_key_value_pair(bytes, cursor)?;
            temp_cursor = cursor + key_value_bytes;

            OpCodeResponse::KeyValuePair { key, value }
        }
    };

    Ok((response, temp_cursor - cursor))
}

/// Parses `<value type> <key> <value>`. Only string values are supported.
fn parse_key_value_pair(bytes: &[u8], cursor: usize) -> Result<(String, String, usize), RdbError> {
    let mut temp_cursor = cursor;
    let value_type = get_byte(bytes, temp_cursor)?;
    temp_cursor += 1;

    if value_type != STRING_VALUE_TYPE {
        return Err(RdbError::UnknownOpcode(value_type));
    }

    let (key, key_bytes) = parse_string(bytes, temp_cursor)?;
    temp_cursor += key_bytes;
    let (value, value_bytes) = parse_string(bytes, temp_cursor)?;
    temp_cursor += value_bytes;

    Ok((key, value, temp_cursor - cursor))
}

pub struct MagicStringResponse {
    pub number_of_read_bytes: usize,
    pub magic_string: String,
    pub redis_version: String,
}

/// Validates the `REDIS` magic string and the 4-digit version that follows.
pub fn parse_magic_string(bytes: &[u8]) -> Result<MagicStringResponse, RdbError> {
    let magic_string = get_buffer_slice(bytes, 0, MAGIC_STRING_LENGTH)?;

    if magic_string != MAGIC_STRING.as_bytes() {
        return Err(RdbError::InvalidHeader(format!(
            "invalid magic string {:02X?}",
            magic_string
        )));
    }

    let redis_version = get_buffer_slice(bytes, MAGIC_STRING_LENGTH, VERSION_LENGTH)?;

    if !redis_version.iter().all(u8::is_ascii_digit) {
        return Err(RdbError::InvalidHeader(format!(
            "invalid version {:02X?}",
            redis_version
        )));
    }

    Ok(MagicStringResponse {
        number_of_read_bytes: MAGIC_STRING_LENGTH + VERSION_LENGTH,
        magic_string: MAGIC_STRING.to_string(),
        redis_version: String::from_utf8_lossy(redis_version).to_string(),
    })
}
