//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Connection reset or device removed
    #[error("Device disconnected")]
    Disconnected,

    /// Reader was asked to stop
    #[error("Transport shutting down")]
    Shutdown,

    #[error("Communication timeout")]
    Timeout,

    #[error("Short report: expected {expected} bytes, got {actual}")]
    ShortReport { expected: usize, actual: usize },

    // HID-specific errors
    #[error("HID error: {0}")]
    HidError(String),

    #[error("HID permission denied: {0}")]
    HidPermissionDenied(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    /// Whether this error ends a reader loop for good.
    ///
    /// Terminal errors are never retried. Everything else is treated as a
    /// transient transfer failure and the read is resubmitted.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransportError::Disconnected
                | TransportError::Shutdown
                | TransportError::DeviceNotFound(_)
        )
    }
}

/// Error strings hidraw/libusb produce once the device has gone away
const DISCONNECT_MARKERS: &[&str] = &[
    "No such device",
    "ENODEV",
    "Input/output error",
    "EIO",
    "disconnected",
    "Broken pipe",
    "ESHUTDOWN",
    "ECONNRESET",
];

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") {
            TransportError::HidPermissionDenied(msg)
        } else if DISCONNECT_MARKERS.iter().any(|m| msg.contains(m)) {
            TransportError::Disconnected
        } else {
            TransportError::HidError(msg)
        }
    }
}
