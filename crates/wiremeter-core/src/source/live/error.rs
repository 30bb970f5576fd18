use thiserror::Error;

/// Errors produced by device enumeration and the live source.
#[derive(Debug, Error)]
pub enum LiveCaptureError {
    #[error("capture backend unavailable: {message}")]
    Backend { message: String },
    #[error("no capture devices present")]
    NoDevices,
    #[error("device index {index} out of range (have 0..{available})")]
    BadIndex { index: usize, available: usize },
    #[error("capture error ({context}): {message}")]
    Capture {
        context: &'static str,
        message: String,
    },
}
