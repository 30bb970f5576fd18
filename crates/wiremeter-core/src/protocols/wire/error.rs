use thiserror::Error;

/// Errors from the tag/value reader.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("input truncated: need {needed} more bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("varint longer than 10 bytes")]
    VarintOverflow,
    #[error("field number 0 is reserved")]
    ZeroFieldNumber,
    #[error("unknown wire type {value}")]
    UnknownWireType { value: u8 },
    #[error("length {length} exceeds remaining input of {available}")]
    LengthBeyondInput { length: u64, available: usize },
}
