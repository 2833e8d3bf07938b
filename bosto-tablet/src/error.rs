//! Tablet error types

use bosto_transport::TransportError;
use thiserror::Error;

/// Errors from tablet operations
#[derive(Error, Debug)]
pub enum TabletError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// No feature table entry for this product
    #[error("Unsupported device {vid:04x}:{pid:04x}")]
    UnsupportedDevice { vid: u16, pid: u16 },
}
