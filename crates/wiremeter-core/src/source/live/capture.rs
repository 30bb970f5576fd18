use pcap::{Active, Capture};
use pcap_parser::Linktype;

use super::devices::{DeviceInfo, default_device_index, list_devices};
use super::error::LiveCaptureError;
use super::layout;
use crate::source::{PacketEvent, PacketSource, SourceError};

/// Live promiscuous capture on one device.
///
/// The handle owns the underlying libpcap capture; dropping it closes the
/// device. There is no reopen: switching devices means constructing a new
/// `LiveSource` after the old one is gone.
pub struct LiveSource {
    capture: Capture<Active>,
    linktype: Linktype,
    device: DeviceInfo,
}

impl LiveSource {
    /// Opens the device at `index` from a fresh enumeration snapshot.
    pub fn open(index: usize) -> Result<Self, SourceError> {
        let devices = list_devices()?;
        let device = devices
            .get(index)
            .cloned()
            .ok_or(LiveCaptureError::BadIndex {
                index,
                available: devices.len(),
            })?;
        Self::open_device(device)
    }

    /// Opens `selected` if set, otherwise the default device (first
    /// non-loopback entry with an IPv4 address).
    pub fn open_selected(selected: Option<usize>) -> Result<Self, SourceError> {
        match selected {
            Some(index) => Self::open(index),
            None => {
                let devices = list_devices()?;
                let index =
                    default_device_index(&devices).ok_or(LiveCaptureError::NoDevices)?;
                Self::open_device(devices[index].clone())
            }
        }
    }

    fn open_device(device: DeviceInfo) -> Result<Self, SourceError> {
        let inactive = Capture::from_device(device.name.as_str()).map_err(|err| {
            LiveCaptureError::Capture {
                context: "capture init",
                message: err.to_string(),
            }
        })?;
        let mut capture = inactive
            .promisc(true)
            .snaplen(layout::SNAPLEN)
            .buffer_size(layout::BUFFER_BYTES)
            .timeout(layout::READ_TIMEOUT_MS)
            .open()
            .map_err(|err| LiveCaptureError::Capture {
                context: "capture open",
                message: err.to_string(),
            })?;
        capture
            .filter(layout::BPF_FILTER, true)
            .map_err(|err| LiveCaptureError::Capture {
                context: "bpf filter",
                message: err.to_string(),
            })?;
        let linktype = Linktype(capture.get_datalink().0);
        Ok(Self {
            capture,
            linktype,
            device,
        })
    }

    /// The device this source was opened on.
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// Non-blocking-ish poll: `Ok(None)` means the read timeout elapsed
    /// with no traffic, so callers can check stop flags between reads.
    pub fn try_next(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        match self.capture.next_packet() {
            Ok(packet) => {
                let ts = packet.header.ts;
                let seconds = ts.tv_sec as f64 + ts.tv_usec as f64 * 1e-6;
                Ok(Some(PacketEvent {
                    ts: Some(seconds),
                    linktype: self.linktype,
                    data: packet.data.to_vec(),
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(pcap::Error::NoMorePackets) => Err(LiveCaptureError::Capture {
                context: "capture read",
                message: "device closed".to_string(),
            }
            .into()),
            Err(err) => Err(LiveCaptureError::Capture {
                context: "capture read",
                message: err.to_string(),
            }
            .into()),
        }
    }
}

impl PacketSource for LiveSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        loop {
            if let Some(event) = self.try_next()? {
                return Ok(Some(event));
            }
        }
    }
}
