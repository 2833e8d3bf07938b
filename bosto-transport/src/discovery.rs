//! Device discovery for Bosto tablets

use std::ffi::CString;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use hidapi::HidApi;
use tracing::{debug, warn};

use crate::device_registry::{self, InterfaceTriple};
use crate::error::TransportError;
use crate::report_reader::ReportSource;
use crate::types::{DiscoveredDevice, TransportDeviceInfo};

/// Device discovery abstraction
#[async_trait]
pub trait DeviceDiscovery: Send + Sync {
    /// List currently available devices
    async fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError>;

    /// Open a fresh handle on a device's pen interface
    ///
    /// Every call returns an independent handle. On hidraw each open file
    /// receives its own copy of every input report.
    async fn open_device(
        &self,
        device: &DiscoveredDevice,
    ) -> Result<Box<dyn ReportSource>, TransportError>;
}

/// HID device discovery over hidraw
pub struct HidDiscovery {
    /// Known VID/PID pairs to look for
    known_devices: Vec<(u16, u16)>,
    /// Interface triple the pen endpoint must report
    interface: InterfaceTriple,
}

impl Default for HidDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl HidDiscovery {
    /// Create a discovery instance for every supported product
    pub fn new() -> Self {
        Self {
            known_devices: device_registry::SUPPORTED_PIDS
                .iter()
                .map(|&pid| (device_registry::VENDOR_ID, pid))
                .collect(),
            interface: InterfaceTriple::PEN,
        }
    }

    fn is_known_device(&self, vid: u16, pid: u16) -> bool {
        self.known_devices.contains(&(vid, pid))
    }

    /// Decide whether a hidraw node is the pen interface.
    ///
    /// When sysfs does not expose the triple the vid/pid match stands on its own.
    fn is_pen_interface(&self, triple: Option<InterfaceTriple>, path: &str) -> bool {
        match triple {
            Some(t) if t == self.interface => true,
            Some(t) => {
                debug!("Skipping {}: interface {} is not {}", path, t, self.interface);
                false
            }
            None => {
                debug!(
                    "No interface descriptor for {}, accepting on VID/PID alone",
                    path
                );
                true
            }
        }
    }
}

#[async_trait]
impl DeviceDiscovery for HidDiscovery {
    async fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        let api = HidApi::new()?;
        let mut devices = Vec::new();

        for device_info in api.device_list() {
            let vid = device_info.vendor_id();
            let pid = device_info.product_id();

            if !self.is_known_device(vid, pid) {
                continue;
            }

            let path = device_info.path().to_string_lossy().to_string();
            let interface = read_interface_triple(&path);
            if !self.is_pen_interface(interface, &path) {
                continue;
            }

            debug!(
                "Found device: VID={:04X} PID={:04X} if={} path={}",
                vid,
                pid,
                device_info.interface_number(),
                path
            );

            devices.push(DiscoveredDevice {
                info: TransportDeviceInfo {
                    vid,
                    pid,
                    release: device_info.release_number(),
                    device_path: path,
                    interface_number: device_info.interface_number(),
                    interface,
                    serial: device_info.serial_number().map(|s| s.to_string()),
                    product_name: device_info.product_string().map(|s| s.to_string()),
                },
            });
        }

        debug!("Found {} devices", devices.len());
        Ok(devices)
    }

    async fn open_device(
        &self,
        device: &DiscoveredDevice,
    ) -> Result<Box<dyn ReportSource>, TransportError> {
        let api = HidApi::new()?;
        let path = CString::new(device.info.device_path.as_str())
            .map_err(|e| TransportError::Internal(format!("bad device path: {e}")))?;

        let handle = api.open_path(&path).map_err(|e| match TransportError::from(e) {
            TransportError::HidError(msg) => TransportError::DeviceNotFound(format!(
                "{} ({:04X}:{:04X}): {}",
                device.info.device_path, device.info.vid, device.info.pid, msg
            )),
            other => other,
        })?;

        // Blocking reads with an explicit timeout are used by the reader
        if let Err(e) = handle.set_blocking_mode(true) {
            warn!("Failed to set blocking mode on {}: {}", device.info.device_path, e);
        }

        debug!(
            "Opened {:04X}:{:04X} at {}",
            device.info.vid, device.info.pid, device.info.device_path
        );
        Ok(Box::new(handle))
    }
}

/// Read the USB interface triple behind a hidraw node from sysfs.
///
/// `/sys/class/hidraw/hidrawN/device` points at the HID device, whose parent
/// directory is the USB interface carrying the `bInterface*` attributes.
fn read_interface_triple(device_path: &str) -> Option<InterfaceTriple> {
    let node = Path::new(device_path).file_name()?.to_str()?;
    let hid_dev = fs::canonicalize(Path::new("/sys/class/hidraw").join(node).join("device")).ok()?;
    let intf = hid_dev.parent()?;

    let attr = |name: &str| -> Option<u8> {
        let raw = fs::read_to_string(intf.join(name)).ok()?;
        parse_hex_attr(&raw)
    };

    Some(InterfaceTriple {
        class: attr("bInterfaceClass")?,
        sub_class: attr("bInterfaceSubClass")?,
        protocol: attr("bInterfaceProtocol")?,
    })
}

/// sysfs prints interface descriptor bytes as two hex digits
fn parse_hex_attr(raw: &str) -> Option<u8> {
    u8::from_str_radix(raw.trim(), 16).ok()
}
