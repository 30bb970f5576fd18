use std::net::IpAddr;

use serde::Serialize;

use super::error::LiveCaptureError;
use crate::source::SourceError;

/// One capture device from an enumeration snapshot.
///
/// `index` is stable within the snapshot that produced it; `name` is the
/// OS-level identifier used to open the device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub description: Option<String>,
    pub addresses: Vec<IpAddr>,
    pub is_loopback: bool,
}

/// Enumerates available capture devices with stable indices.
pub fn list_devices() -> Result<Vec<DeviceInfo>, SourceError> {
    let raw = pcap::Device::list().map_err(|err| LiveCaptureError::Backend {
        message: err.to_string(),
    })?;
    if raw.is_empty() {
        return Err(LiveCaptureError::NoDevices.into());
    }
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, device)| DeviceInfo {
            index,
            name: device.name,
            description: device.desc,
            addresses: device.addresses.into_iter().map(|a| a.addr).collect(),
            is_loopback: device.flags.is_loopback(),
        })
        .collect())
}

/// Default device: the first non-loopback entry with an IPv4 address.
pub fn default_device_index(devices: &[DeviceInfo]) -> Option<usize> {
    devices
        .iter()
        .find(|device| {
            !device.is_loopback && device.addresses.iter().any(|addr| addr.is_ipv4())
        })
        .map(|device| device.index)
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use super::{DeviceInfo, default_device_index};

    fn device(index: usize, addresses: Vec<IpAddr>, is_loopback: bool) -> DeviceInfo {
        DeviceInfo {
            index,
            name: format!("dev{index}"),
            description: None,
            addresses,
            is_loopback,
        }
    }

    #[test]
    fn default_skips_loopback() {
        let devices = vec![
            device(0, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)], true),
            device(1, vec![IpAddr::V4(Ipv4Addr::new(192, 168, 0, 7))], false),
        ];
        assert_eq!(default_device_index(&devices), Some(1));
    }

    #[test]
    fn default_requires_ipv4() {
        let devices = vec![
            device(0, vec![IpAddr::V6(Ipv6Addr::LOCALHOST)], false),
            device(1, vec![], false),
            device(2, vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))], false),
        ];
        assert_eq!(default_device_index(&devices), Some(2));
    }

    #[test]
    fn default_none_when_nothing_qualifies() {
        let devices = vec![device(0, vec![], false)];
        assert_eq!(default_device_index(&devices), None);
    }
}
