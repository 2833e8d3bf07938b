//! Device router: picks the logical device a sample belongs to

use crate::decoder::DeviceId;
use crate::sink::LogicalDevice;

/// Eraser id goes to the eraser device, everything else to the stylus
#[inline]
pub fn route(current_id: DeviceId) -> LogicalDevice {
    if current_id == DeviceId::ERASER {
        LogicalDevice::Eraser
    } else {
        LogicalDevice::Stylus
    }
}
