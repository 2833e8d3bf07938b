//! Output sink contract
//!
//! The decoder never talks to the host input layer directly. It reports
//! key, absolute-axis and misc events plus sync markers to an
//! [`OutputSink`], addressed to one of the two logical devices. The uinput
//! backend lives in the driver binary; [`RecordingSink`] captures events
//! for tests and protocol debugging.

/// One of the two virtual pointing devices fed from a single report stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalDevice {
    Stylus,
    Eraser,
}

impl LogicalDevice {
    /// Both devices, in sync order
    pub const ALL: [LogicalDevice; 2] = [LogicalDevice::Stylus, LogicalDevice::Eraser];

    pub fn display_name(&self) -> &'static str {
        match self {
            LogicalDevice::Stylus => "Pen",
            LogicalDevice::Eraser => "Eraser",
        }
    }
}

/// Discrete buttons exposed by each logical device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Tip touching the surface
    Touch,
    Stylus,
    Stylus2,
    ToolPen,
    ToolBrush,
    ToolRubber,
    ToolPencil,
    ToolAirbrush,
    ToolFinger,
    ToolMouse,
    /// Digitizer present
    Digi,
}

impl Button {
    /// Every button a logical device advertises
    pub const ALL: &'static [Button] = &[
        Button::Digi,
        Button::Touch,
        Button::Stylus,
        Button::Stylus2,
        Button::ToolPen,
        Button::ToolBrush,
        Button::ToolRubber,
        Button::ToolPencil,
        Button::ToolAirbrush,
        Button::ToolFinger,
        Button::ToolMouse,
    ];
}

/// Absolute axes exposed by each logical device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsAxis {
    X,
    Y,
    Pressure,
    /// Carries the active device id
    Misc,
}

impl AbsAxis {
    pub const ALL: &'static [AbsAxis] = &[AbsAxis::X, AbsAxis::Y, AbsAxis::Pressure, AbsAxis::Misc];
}

/// Miscellaneous event channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MiscCode {
    Serial,
}

/// Receiver of synthesized input events.
///
/// Called on the report reader's thread while the tablet state lock is held,
/// so implementations must return promptly.
pub trait OutputSink: Send {
    fn report_key(&mut self, device: LogicalDevice, key: Button, pressed: bool);
    fn report_absolute(&mut self, device: LogicalDevice, axis: AbsAxis, value: i32);
    fn report_misc(&mut self, device: LogicalDevice, code: MiscCode, value: i32);
    /// End of one event frame for `device`
    fn sync(&mut self, device: LogicalDevice);
}

/// A single event as seen by a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Key(Button, bool),
    Abs(AbsAxis, i32),
    Misc(MiscCode, i32),
    Sync,
}

/// Sink that stores every event in order
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Vec<(LogicalDevice, SinkEvent)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, in emission order
    pub fn events(&self) -> &[(LogicalDevice, SinkEvent)] {
        &self.events
    }

    /// Events addressed to one device
    pub fn events_for(&self, device: LogicalDevice) -> Vec<SinkEvent> {
        self.events
            .iter()
            .filter(|(d, _)| *d == device)
            .map(|(_, e)| *e)
            .collect()
    }

    /// Number of sync markers sent to `device`
    pub fn sync_count(&self, device: LogicalDevice) -> usize {
        self.events
            .iter()
            .filter(|(d, e)| *d == device && *e == SinkEvent::Sync)
            .count()
    }

    /// Latest value reported on `axis` for `device`
    pub fn last_abs(&self, device: LogicalDevice, axis: AbsAxis) -> Option<i32> {
        self.events.iter().rev().find_map(|(d, e)| match e {
            SinkEvent::Abs(a, v) if *d == device && *a == axis => Some(*v),
            _ => None,
        })
    }

    /// Latest state reported for `key` on `device`
    pub fn last_key(&self, device: LogicalDevice, key: Button) -> Option<bool> {
        self.events.iter().rev().find_map(|(d, e)| match e {
            SinkEvent::Key(k, v) if *d == device && *k == key => Some(*v),
            _ => None,
        })
    }

    /// Drop everything recorded so far
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl OutputSink for RecordingSink {
    fn report_key(&mut self, device: LogicalDevice, key: Button, pressed: bool) {
        self.events.push((device, SinkEvent::Key(key, pressed)));
    }

    fn report_absolute(&mut self, device: LogicalDevice, axis: AbsAxis, value: i32) {
        self.events.push((device, SinkEvent::Abs(axis, value)));
    }

    fn report_misc(&mut self, device: LogicalDevice, code: MiscCode, value: i32) {
        self.events.push((device, SinkEvent::Misc(code, value)));
    }

    fn sync(&mut self, device: LogicalDevice) {
        self.events.push((device, SinkEvent::Sync));
    }
}
