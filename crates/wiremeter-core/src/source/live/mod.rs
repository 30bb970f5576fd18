//! Live capture source.
//!
//! Opens one device in promiscuous mode with a `tcp` BPF filter and a
//! large kernel ring, and emits raw frames. Device handles are fully
//! closed on drop; switching devices is open-new-after-drop, never reuse.

pub(crate) mod error;
mod capture;
mod devices;
mod layout;

pub use capture::LiveSource;
pub use devices::{DeviceInfo, default_device_index, list_devices};
