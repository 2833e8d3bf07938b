//! Transport layer for Bosto tablets
//!
//! Finds the tablet's pen interface on the HID bus and runs the interrupt
//! report reader loops that feed the decoder.

pub mod device_registry;
pub mod error;
pub mod report_reader;
pub mod types;

mod discovery;

pub use device_registry::{
    is_supported, InterfaceTriple, PID_BOSTO_14WA, SUPPORTED_PIDS, VENDOR_ID,
};
pub use discovery::{DeviceDiscovery, HidDiscovery};
pub use error::TransportError;
pub use report_reader::{ReaderConfig, ReportHandler, ReportReader, ReportSource};
pub use types::{DeviceGone, DiscoveredDevice, GoneReason, ReaderState, TransportDeviceInfo};
