//! Common types for transport layer

use crate::device_registry::InterfaceTriple;

/// Device identification information
#[derive(Debug, Clone)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// bcdDevice release number
    pub release: u16,
    /// hidraw node path
    pub device_path: String,
    /// USB interface number
    pub interface_number: i32,
    /// Interface class/subclass/protocol, when sysfs exposes it
    pub interface: Option<InterfaceTriple>,
    /// Serial number if available
    pub serial: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
}

/// Discovered device that can be opened
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Device information
    pub info: TransportDeviceInfo,
}

/// Pipeline state of a report reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Created, no read issued yet
    Idle,
    /// A read is outstanding
    Submitted,
    /// Last read delivered a report
    Completed,
    /// Last read failed with a transient error
    Failed,
    /// Loop has stopped and will not read again
    ShuttingDown,
}

impl ReaderState {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => ReaderState::Idle,
            1 => ReaderState::Submitted,
            2 => ReaderState::Completed,
            3 => ReaderState::Failed,
            _ => ReaderState::ShuttingDown,
        }
    }
}

/// Why a reader loop stopped on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoneReason {
    /// Device unplugged or connection reset
    Disconnected,
    /// Too many consecutive transient errors
    ErrorLimit(u32),
    /// Any other terminal error, carried as text
    Other(String),
}

/// Notification sent once to the lifecycle owner when a reader dies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGone {
    /// Name of the reader that stopped
    pub reader: String,
    /// hidraw path of the device
    pub device_path: String,
    pub reason: GoneReason,
}
