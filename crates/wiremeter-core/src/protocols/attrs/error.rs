use thiserror::Error;

/// Errors from attribute blob decoding.
#[derive(Debug, Error)]
pub enum AttrError {
    #[error("attribute blob too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("string length {length} exceeds blob of {actual} bytes")]
    LengthBeyondBlob { length: u32, actual: usize },
}
