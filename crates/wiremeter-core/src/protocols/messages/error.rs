use thiserror::Error;

use crate::protocols::wire::WireError;

/// Errors from typed message decoding.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("{message}: required field {field} missing")]
    MissingField { message: &'static str, field: u32 },
}

pub(crate) fn missing(message: &'static str, field: u32) -> MessageError {
    MessageError::MissingField { message, field }
}
