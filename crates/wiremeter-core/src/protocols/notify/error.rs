use thiserror::Error;

/// Errors from notify-header parsing.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notify header too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
