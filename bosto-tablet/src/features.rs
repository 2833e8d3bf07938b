//! Feature table: per-product report geometry and axis ranges

use bosto_transport::device_registry::{PID_BOSTO_14WA, VENDOR_ID};

use crate::error::TabletError;

/// Report length in bytes for every supported tablet
pub const PKGLEN_MAX: usize = 10;

/// Tablet family, selects protocol quirks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabletType {
    Bosto14Wa,
}

/// Immutable geometry for one product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub pid: u16,
    pub name: &'static str,
    pub tablet_type: TabletType,
    /// Bytes per interrupt report
    pub report_len: usize,
    pub max_x: i32,
    pub max_y: i32,
    pub max_tilt_x: i32,
    pub max_tilt_y: i32,
    pub max_pressure: i32,
}

static FEATURES: &[DeviceProfile] = &[DeviceProfile {
    pid: PID_BOSTO_14WA,
    name: "Bosto Kingtee 14WA",
    tablet_type: TabletType::Bosto14Wa,
    report_len: PKGLEN_MAX,
    max_x: 0x27de,
    max_y: 0x1cfe,
    max_tilt_x: 0x3f,
    max_tilt_y: 0x7f,
    max_pressure: 2048,
}];

/// Find the profile for a product id
pub fn lookup(pid: u16) -> Result<&'static DeviceProfile, TabletError> {
    FEATURES
        .iter()
        .find(|f| f.pid == pid)
        .ok_or(TabletError::UnsupportedDevice { vid: VENDOR_ID, pid })
}
