//! Stateful pen report decoder
//!
//! Turns one parsed report plus the shared [`ToolState`] into the key events
//! and pointer sample to publish. Proximity reports update the tool state;
//! contact reports consult it for the pressure settle gate.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::packet::{parse_report, tool_code, PenPacket};
use crate::router::route;
use crate::sink::{Button, LogicalDevice};

/// Delay between TOOL_IN and the first pressure reading let through.
/// Suppresses the spurious pressure the pen reports while settling.
pub const PEN_WRITE_DELAY: Duration = Duration::from_millis(230);

/// Device id published on the Misc axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceId(pub u8);

impl DeviceId {
    /// No tool in proximity
    pub const NONE: DeviceId = DeviceId(0x00);
    pub const STYLUS: DeviceId = DeviceId(0x02);
    pub const ERASER: DeviceId = DeviceId(0x0A);
}

/// Which end of the pen is in proximity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    None,
    Pen,
    Eraser,
}

impl Tool {
    /// The BTN_TOOL_* button announcing this tool
    pub fn button(self) -> Option<Button> {
        match self {
            Tool::None => None,
            Tool::Pen => Some(Button::ToolPen),
            Tool::Eraser => Some(Button::ToolRubber),
        }
    }
}

/// Proximity state shared by both logical devices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolState {
    pub current_tool: Tool,
    pub current_id: DeviceId,
    /// Earliest instant a contact may report pressure; set on every tool-in
    pub armed_at: Option<Instant>,
}

impl ToolState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the settle delay after the last tool-in has elapsed
    pub fn pressure_armed(&self, now: Instant) -> bool {
        self.armed_at.map_or(true, |armed_at| now >= armed_at)
    }
}

/// One decoded pointer position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerSample {
    pub x: u16,
    pub y: u16,
    pub pressure: u16,
    pub touch: bool,
    pub stylus2: bool,
    pub device_id: DeviceId,
}

/// A key transition destined for one logical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub device: LogicalDevice,
    pub key: Button,
    pub pressed: bool,
}

/// Everything one report produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub packet: PenPacket,
    /// Key transitions, in emission order
    pub keys: Vec<KeyEvent>,
    /// Position, pressure and id; zeroed when the report carried no geometry
    pub sample: PointerSample,
    /// Device the sample is published to
    pub target: LogicalDevice,
}

impl Decoded {
    pub fn is_heartbeat(&self) -> bool {
        self.packet == PenPacket::Heartbeat
    }
}

/// Parse and decode one raw report
pub fn decode_report(report: &[u8], state: &mut ToolState, now: Instant) -> Decoded {
    decode(parse_report(report), state, now)
}

/// Apply one parsed report to the tool state
pub fn decode(packet: PenPacket, state: &mut ToolState, now: Instant) -> Decoded {
    let mut keys = Vec::with_capacity(3);
    let mut sample = PointerSample::default();

    match packet {
        PenPacket::ToolOut => {
            tool_out(state, &mut keys);
            debug!(
                "TOOL OUT. PEN ID:Tool {:x}:{:?}",
                state.current_id.0, state.current_tool
            );
        }
        PenPacket::ToolIn { tool_code } => {
            tool_in(state, tool_code, now, &mut keys);
            debug!(
                "TOOL IN: ID:Tool {:x}:{:?}",
                state.current_id.0, state.current_tool
            );
        }
        PenPacket::Float { x, y, stylus2 } => {
            sample.x = x;
            sample.y = y;
            sample.stylus2 = stylus2;
            pen_keys(state, false, stylus2, &mut keys);
            debug!(
                "PEN FLOAT: ID:Tool {:x}:{:?}",
                state.current_id.0, state.current_tool
            );
        }
        PenPacket::Contact {
            x,
            y,
            stylus2,
            pressure,
        } => {
            sample.x = x;
            sample.y = y;
            sample.stylus2 = stylus2;
            sample.touch = true;
            sample.pressure = if state.pressure_armed(now) { pressure } else { 0 };
            pen_keys(state, true, stylus2, &mut keys);
            debug!(
                "PEN TOUCH: ID:Tool {:x}:{:?} p={}",
                state.current_id.0, state.current_tool, sample.pressure
            );
        }
        PenPacket::Heartbeat => {
            debug!("Tablet heartbeat, current id {:x}", state.current_id.0);
        }
        PenPacket::UnknownPenStatus(status) => {
            debug!("Unrecognized pen status {:02x}", status);
        }
        PenPacket::Malformed(first) => {
            debug!("Error packet. Packet data[0]: {:02x}", first);
        }
        PenPacket::Truncated(len) => {
            debug!("Truncated pen packet ({} bytes)", len);
        }
    }

    sample.device_id = state.current_id;

    Decoded {
        packet,
        keys,
        sample,
        target: route(state.current_id),
    }
}

fn tool_out(state: &mut ToolState, keys: &mut Vec<KeyEvent>) {
    if let Some(key) = state.current_tool.button() {
        keys.push(KeyEvent {
            device: route(state.current_id),
            key,
            pressed: false,
        });
    }
    state.current_id = DeviceId::NONE;
    state.current_tool = Tool::None;
}

fn tool_in(state: &mut ToolState, code: u8, now: Instant, keys: &mut Vec<KeyEvent>) {
    state.armed_at = Some(now + PEN_WRITE_DELAY);

    let (id, tool) = match code & 0xf0 {
        tool_code::STYLUS_TIP => (DeviceId::STYLUS, Tool::Pen),
        tool_code::ERASER => (DeviceId::ERASER, Tool::Eraser),
        other => {
            debug!("Unknown tablet tool {:02x}", other);
            (DeviceId::NONE, Tool::Pen)
        }
    };
    state.current_id = id;
    state.current_tool = tool;

    if let Some(key) = tool.button() {
        keys.push(KeyEvent {
            device: route(id),
            key,
            pressed: true,
        });
    }
}

fn pen_keys(state: &ToolState, touch: bool, stylus2: bool, keys: &mut Vec<KeyEvent>) {
    let device = route(state.current_id);
    if let Some(key) = state.current_tool.button() {
        keys.push(KeyEvent {
            device,
            key,
            pressed: true,
        });
    }
    keys.push(KeyEvent {
        device,
        key: Button::Touch,
        pressed: touch,
    });
    keys.push(KeyEvent {
        device,
        key: Button::Stylus2,
        pressed: stylus2,
    });
}
