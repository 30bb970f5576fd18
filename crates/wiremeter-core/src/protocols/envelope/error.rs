use thiserror::Error;

/// Errors from envelope parsing and frame decompression.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("frame too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("declared frame size {declared} exceeds buffer of {actual}")]
    SizeBeyondBuffer { declared: u32, actual: usize },
    #[error("declared frame size {declared} below minimum")]
    SizeBelowMinimum { declared: u32 },
    #[error("decompression failed: {message}")]
    Decompress { message: String },
    #[error("decompressed frame of {actual} bytes exceeds cap of {cap}")]
    DecompressedTooLarge { actual: usize, cap: usize },
}
