//! Sink that logs decoded frames instead of creating input devices
//!
//! Used by `monitor`, which needs no uinput access.

use bosto_tablet::{AbsAxis, Button, LogicalDevice, MiscCode, OutputSink};
use std::fmt::Write;
use tracing::{info, trace};

#[derive(Debug, Default)]
struct Frame {
    text: String,
}

/// Logs one line per non-empty frame
#[derive(Debug, Default)]
pub struct LogSink {
    stylus: Frame,
    eraser: Frame,
    /// Sequence number of the last frame logged
    frames: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&mut self, device: LogicalDevice) -> &mut Frame {
        match device {
            LogicalDevice::Stylus => &mut self.stylus,
            LogicalDevice::Eraser => &mut self.eraser,
        }
    }

    fn append(&mut self, device: LogicalDevice, item: std::fmt::Arguments<'_>) {
        let frame = self.frame(device);
        if !frame.text.is_empty() {
            frame.text.push(' ');
        }
        let _ = frame.text.write_fmt(item);
    }
}

impl OutputSink for LogSink {
    fn report_key(&mut self, device: LogicalDevice, key: Button, pressed: bool) {
        self.append(device, format_args!("{:?}={}", key, u8::from(pressed)));
    }

    fn report_absolute(&mut self, device: LogicalDevice, axis: AbsAxis, value: i32) {
        self.append(device, format_args!("{:?}={}", axis, value));
    }

    fn report_misc(&mut self, device: LogicalDevice, code: MiscCode, value: i32) {
        self.append(device, format_args!("{:?}={:#06x}", code, value));
    }

    fn sync(&mut self, device: LogicalDevice) {
        let text = std::mem::take(&mut self.frame(device).text);
        if text.is_empty() {
            trace!("[{}] sync", device.display_name());
        } else {
            self.frames += 1;
            info!("#{} [{}] {}", self.frames, device.display_name(), text);
        }
    }
}
