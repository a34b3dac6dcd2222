use crate::rdb::RdbError;

pub fn get_buffer_slice(buffer: &[u8], cursor: usize, len: usize) -> Result<&[u8], RdbError> {
    if cursor + len > buffer.len() {
        return Err(RdbError::UnexpectedEof);
    }

    Ok(&buffer[cursor..cursor + len])
}

pub fn get_byte(buffer: &[u8], cursor: usize) -> Result<u8, RdbError> {
    buffer.get(cursor).copied().ok_or(RdbError::UnexpectedEof)
}

pub fn get_array<const N: usize>(buffer: &[u8], cursor: usize) -> Result<[u8; N], RdbError> {
    let slice = get_buffer_slice(buffer, cursor, N)?;

    slice.try_into().map_err(|_| RdbError::UnexpectedEof)
}
