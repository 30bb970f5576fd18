use super::error::AttrError;
use super::layout;

/// Decodes a string attribute blob.
///
/// Layout: u32 LE length, 4 reserved bytes, `length` bytes of UTF-8,
/// 4 reserved bytes. Invalid UTF-8 decodes lossily; captures are not
/// trusted to be clean.
pub fn parse_string_attr(data: &[u8]) -> Result<String, AttrError> {
    if data.len() < layout::STRING_PAYLOAD_OFFSET {
        return Err(AttrError::TooShort {
            needed: layout::STRING_PAYLOAD_OFFSET,
            actual: data.len(),
        });
    }
    let len_bytes = &data[layout::STRING_LEN_RANGE];
    let length = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
    let end = layout::STRING_PAYLOAD_OFFSET
        .checked_add(length as usize)
        .ok_or(AttrError::LengthBeyondBlob {
            length,
            actual: data.len(),
        })?;
    let payload = data
        .get(layout::STRING_PAYLOAD_OFFSET..end)
        .ok_or(AttrError::LengthBeyondBlob {
            length,
            actual: data.len(),
        })?;
    Ok(String::from_utf8_lossy(payload).into_owned())
}

/// Decodes a numeric attribute blob: big-endian u32 at the front.
pub fn parse_u32_attr(data: &[u8]) -> Result<u32, AttrError> {
    if data.len() < layout::NUMERIC_LEN {
        return Err(AttrError::TooShort {
            needed: layout::NUMERIC_LEN,
            actual: data.len(),
        });
    }
    Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]]))
}
