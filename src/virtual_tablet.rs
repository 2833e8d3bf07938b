//! Virtual stylus/eraser devices using evdev/uinput
//!
//! Creates one uinput device per logical device. Events are buffered per
//! device and written as a single frame on `sync`, which is when evdev
//! appends the SYN_REPORT.

use bosto_tablet::{AbsAxis, Button, DeviceProfile, LogicalDevice, MiscCode, OutputSink};
use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    MiscType, UinputAbsSetup,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound of the Misc axis, which carries the device id byte
const MISC_MAX: i32 = 0xff;

/// Errors from virtual device operations
#[derive(Debug, Error)]
pub enum VirtualDeviceError {
    #[error("Failed to create {device} device: {source}")]
    CreateDevice {
        device: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// USB identity copied onto the virtual devices
#[derive(Debug, Clone, Copy)]
pub struct UsbIdentity {
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

struct VirtualPen {
    device: VirtualDevice,
    pending: Vec<InputEvent>,
}

impl VirtualPen {
    fn new(name: &str, profile: &DeviceProfile, id: UsbIdentity) -> std::io::Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for &button in Button::ALL {
            keys.insert(button_code(button));
        }

        let mut msc = AttributeSet::<MiscType>::new();
        msc.insert(MiscType::MSC_SERIAL);

        let mut builder = VirtualDeviceBuilder::new()?
            .name(name)
            .input_id(InputId::new(BusType::BUS_USB, id.vendor, id.product, id.version))
            .with_keys(&keys)?
            .with_msc(&msc)?;

        for &axis in AbsAxis::ALL {
            let max = match axis {
                AbsAxis::X => profile.max_x,
                AbsAxis::Y => profile.max_y,
                AbsAxis::Pressure => profile.max_pressure,
                AbsAxis::Misc => MISC_MAX,
            };
            let setup = UinputAbsSetup::new(axis_code(axis), AbsInfo::new(0, 0, max, 0, 0, 0));
            builder = builder.with_absolute_axis(&setup)?;
        }

        Ok(Self {
            device: builder.build()?,
            pending: Vec::with_capacity(16),
        })
    }

    fn push(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let result = self.device.emit(&self.pending);
        self.pending.clear();
        result
    }
}

/// The pair of uinput devices for one physical tablet
pub struct VirtualTablet {
    stylus: VirtualPen,
    eraser: VirtualPen,
}

impl VirtualTablet {
    /// Create both virtual devices
    ///
    /// # Arguments
    /// * `name` - Name prefix; devices appear as `"<name> Pen"` and `"<name> Eraser"`
    /// * `profile` - Axis ranges
    /// * `id` - USB identity of the physical tablet
    pub fn new(
        name: &str,
        profile: &DeviceProfile,
        id: UsbIdentity,
    ) -> Result<Self, VirtualDeviceError> {
        let create = |device: LogicalDevice| {
            let full_name = format!("{} {}", name, device.display_name());
            VirtualPen::new(&full_name, profile, id).map_err(|source| {
                VirtualDeviceError::CreateDevice {
                    device: device.display_name(),
                    source,
                }
            })
        };

        // On failure the stylus device is dropped before returning
        let stylus = create(LogicalDevice::Stylus)?;
        let eraser = create(LogicalDevice::Eraser)?;
        debug!("Created virtual devices for {}", name);

        Ok(Self { stylus, eraser })
    }

    /// Get the device node of a logical device (e.g., /dev/input/eventX)
    pub fn device_path(&mut self, device: LogicalDevice) -> Option<std::path::PathBuf> {
        self.pen_mut(device)
            .device
            .enumerate_dev_nodes_blocking()
            .ok()?
            .next()?
            .ok()
    }

    fn pen_mut(&mut self, device: LogicalDevice) -> &mut VirtualPen {
        match device {
            LogicalDevice::Stylus => &mut self.stylus,
            LogicalDevice::Eraser => &mut self.eraser,
        }
    }
}

impl OutputSink for VirtualTablet {
    fn report_key(&mut self, device: LogicalDevice, key: Button, pressed: bool) {
        let event = InputEvent::new(EventType::KEY, button_code(key).code(), i32::from(pressed));
        self.pen_mut(device).push(event);
    }

    fn report_absolute(&mut self, device: LogicalDevice, axis: AbsAxis, value: i32) {
        let event = InputEvent::new(EventType::ABSOLUTE, axis_code(axis).0, value);
        self.pen_mut(device).push(event);
    }

    fn report_misc(&mut self, device: LogicalDevice, code: MiscCode, value: i32) {
        let code = match code {
            MiscCode::Serial => MiscType::MSC_SERIAL,
        };
        self.pen_mut(device)
            .push(InputEvent::new(EventType::MISC, code.0, value));
    }

    fn sync(&mut self, device: LogicalDevice) {
        if let Err(e) = self.pen_mut(device).flush() {
            warn!("Failed to emit {} events: {}", device.display_name(), e);
        }
    }
}

/// Convert a tablet button to its evdev key code
fn button_code(button: Button) -> Key {
    match button {
        Button::Touch => Key::BTN_TOUCH,
        Button::Stylus => Key::BTN_STYLUS,
        Button::Stylus2 => Key::BTN_STYLUS2,
        Button::ToolPen => Key::BTN_TOOL_PEN,
        Button::ToolBrush => Key::BTN_TOOL_BRUSH,
        Button::ToolRubber => Key::BTN_TOOL_RUBBER,
        Button::ToolPencil => Key::BTN_TOOL_PENCIL,
        Button::ToolAirbrush => Key::BTN_TOOL_AIRBRUSH,
        Button::ToolFinger => Key::BTN_TOOL_FINGER,
        Button::ToolMouse => Key::BTN_TOOL_MOUSE,
        // BTN_DIGI shares code 0x140 with BTN_TOOL_PEN
        Button::Digi => Key::BTN_TOOL_PEN,
    }
}

/// Convert a tablet axis to its evdev axis code
fn axis_code(axis: AbsAxis) -> AbsoluteAxisType {
    match axis {
        AbsAxis::X => AbsoluteAxisType::ABS_X,
        AbsAxis::Y => AbsoluteAxisType::ABS_Y,
        AbsAxis::Pressure => AbsoluteAxisType::ABS_PRESSURE,
        AbsAxis::Misc => AbsoluteAxisType::ABS_MISC,
    }
}
