//! Bosto tablet protocol
//!
//! Decodes the tablet's interrupt reports and publishes them as two logical
//! pointing devices, a stylus and an eraser, multiplexed over one stream.

pub mod decoder;
pub mod error;
pub mod features;
pub mod packet;
pub mod router;
pub mod sink;
pub mod tablet;

pub use decoder::{
    decode, decode_report, Decoded, DeviceId, KeyEvent, PointerSample, Tool, ToolState,
    PEN_WRITE_DELAY,
};
pub use error::TabletError;
pub use features::{lookup, DeviceProfile, TabletType};
pub use packet::{parse_report, PenPacket};
pub use router::route;
pub use sink::{AbsAxis, Button, LogicalDevice, MiscCode, OutputSink, RecordingSink, SinkEvent};
pub use tablet::Tablet;
