// Bosto tablet driver - shared library
// Configuration, device lifecycle, and output sinks

pub mod config;
pub mod driver;
pub mod log_sink;
pub mod virtual_tablet;

pub use config::{DriverConfig, ReaderSettings};
pub use driver::{DriverError, TabletDriver};
pub use log_sink::LogSink;
pub use virtual_tablet::{UsbIdentity, VirtualDeviceError, VirtualTablet};
