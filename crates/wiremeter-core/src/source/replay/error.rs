use thiserror::Error;

/// Errors produced by the replay source.
#[derive(Debug, Error)]
pub enum ReplaySourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture parse error ({context}): {message}")]
    Pcap {
        context: &'static str,
        message: String,
    },
}
