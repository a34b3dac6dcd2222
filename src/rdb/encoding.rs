use crate::rdb::{
    get_slice::{get_array, get_buffer_slice, get_byte},
    RdbError,
};

#[derive(Debug, PartialEq)]
enum ValueEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
}

/// Reads the tagged length prefix at `cursor`.
///
/// The top two bits of the first byte select the scheme:
/// - `00`: the remaining 6 bits are the length
/// - `01`: 14-bit length, the remaining 6 bits followed by one more byte
/// - `10`: a 4-byte big-endian length follows
/// - `11`: the remaining 6 bits select an integer encoding (3 is LZF and unsupported)
fn parse_length_encoding(bytes: &[u8], cursor: usize) -> Result<(ValueEncoding, usize), RdbError> {
    let mut temp_cursor = cursor;
    let byte = get_byte(bytes, temp_cursor)?;
    temp_cursor += 1;

    let value_encoding = match byte >> 6 {
        0b00 => ValueEncoding::Length((byte & 0b0011_1111) as usize),
        0b01 => {
            let lower_8_bits = get_byte(bytes, temp_cursor)? as usize;
            temp_cursor += 1;

            let high_6_bits = (byte & 0b0011_1111) as usize;

            ValueEncoding::Length((high_6_bits << 8) | lower_8_bits)
        }
        0b10 => {
            let length: [u8; 4] = get_array(bytes, temp_cursor)?;
            temp_cursor += 4;

            ValueEncoding::Length(u32::from_be_bytes(length) as usize)
        }
        _ => match byte & 0b0011_1111 {
            0 => ValueEncoding::Int8,
            1 => ValueEncoding::Int16,
            2 => ValueEncoding::Int32,
            _ => return Err(RdbError::UnsupportedEncoding(byte)),
        },
    };

    Ok((value_encoding, temp_cursor - cursor))
}

/// Reads a length-encoded integer, as used by the resize and select-db opcodes.
pub fn parse_length_encoded_integer(bytes: &[u8], cursor: usize) -> Result<(usize, usize), RdbError> {
    let (value_encoding, bytes_read) = parse_length_encoding(bytes, cursor)?;

    match value_encoding {
        ValueEncoding::Length(value) => Ok((value, bytes_read)),
        _ => Err(RdbError::UnsupportedEncoding(get_byte(bytes, cursor)?)),
    }
}

/// Reads a string at `cursor`, returning it with the number of bytes consumed.
///
/// Integer-encoded strings are rendered as their decimal representation.
/// The 14-bit length form and LZF-compressed strings fail with
/// [`RdbError::UnsupportedEncoding`].
pub fn parse_string(bytes: &[u8], cursor: usize) -> Result<(String, usize), RdbError> {
    let first_byte = get_byte(bytes, cursor)?;

    if first_byte >> 6 == 0b01 {
        return Err(RdbError::UnsupportedEncoding(first_byte));
    }

    let (value_encoding, length_bytes) = parse_length_encoding(bytes, cursor)?;
    let mut temp_cursor = cursor + length_bytes;

    let value = match value_encoding {
        ValueEncoding::Length(length) => {
            let byte_slice = get_buffer_slice(bytes, temp_cursor, length)?;
            temp_cursor += length;

            std::str::from_utf8(byte_slice)
                .map_err(|_| RdbError::InvalidUtf8)?
                .to_string()
        }
        ValueEncoding::Int8 => {
            let value = get_byte(bytes, temp_cursor)? as i8;
            temp_cursor += 1;

            value.to_string()
        }
        ValueEncoding::Int16 => {
            let value: [u8; 2] = get_array(bytes, temp_cursor)?;
            temp_cursor += 2;

            u16::from_be_bytes(value).to_string()
        }
        ValueEncoding::Int32 => {
            let value: [u8; 4] = get_array(bytes, temp_cursor)?;
            temp_cursor += 4;

            u32::from_be_bytes(value).to_string()
        }
    };

    Ok((value, temp_cursor - cursor))
}
