use thiserror::Error;

/// Errors from link-layer slicing.
#[derive(Debug, Error)]
pub enum TcpError {
    #[error("packet slicing failed: {0}")]
    Slice(String),
    #[error("missing network layer")]
    MissingNetworkLayer,
}
