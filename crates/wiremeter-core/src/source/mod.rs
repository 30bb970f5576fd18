//! Packet sources feeding the pipeline.
//!
//! Sources abstract where raw link-layer frames come from: a live device
//! in promiscuous mode, or a recorded PCAP/PCAPNG file replayed offline.
//! Both yield frames in capture order with optional timestamps and
//! linktype metadata; everything downstream is source-agnostic.

mod live;
mod replay;

pub use live::{DeviceInfo, LiveSource, default_device_index, list_devices};
pub use replay::ReplayFileSource;

use pcap_parser::Linktype;
use thiserror::Error;

/// Raw link-layer frame emitted by a `PacketSource`.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    /// Capture timestamp in seconds (if available).
    pub ts: Option<f64>,
    /// Link type for the raw payload.
    pub linktype: Linktype,
    /// Frame bytes.
    pub data: Vec<u8>,
}

/// Abstract packet source for the capture pipeline.
pub trait PacketSource {
    /// Returns the next frame, or `None` at end of stream.
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

/// Errors produced by `PacketSource` implementations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture backend missing: {0}")]
    BackendMissing(String),
    #[error("no capture devices available")]
    DeviceUnavailable,
    #[error("invalid device index {index} (have 0..{available})")]
    DeviceInvalid { index: usize, available: usize },
    #[error("capture error: {0}")]
    Capture(String),
    #[error("replay parse error: {0}")]
    Replay(String),
}

impl From<live::error::LiveCaptureError> for SourceError {
    fn from(value: live::error::LiveCaptureError) -> Self {
        use live::error::LiveCaptureError;
        match value {
            LiveCaptureError::Backend { message } => SourceError::BackendMissing(message),
            LiveCaptureError::NoDevices => SourceError::DeviceUnavailable,
            LiveCaptureError::BadIndex { index, available } => {
                SourceError::DeviceInvalid { index, available }
            }
            LiveCaptureError::Capture { context, message } => {
                SourceError::Capture(format!("{context}: {message}"))
            }
        }
    }
}

impl From<replay::error::ReplaySourceError> for SourceError {
    fn from(value: replay::error::ReplaySourceError) -> Self {
        use replay::error::ReplaySourceError;
        match value {
            ReplaySourceError::Io(err) => SourceError::Io(err),
            ReplaySourceError::Pcap { context, message } => {
                SourceError::Replay(format!("{context}: {message}"))
            }
        }
    }
}
