//! Linux uinput backend.
//!
//! Registers either a keyboard+mouse or an Xbox 360 style gamepad through
//! `/dev/uinput` and writes input events to it. Every write is followed by a
//! SYN_REPORT (done by `evdev` inside `emit`).

use super::{
    BackendError, DeviceKind, GamepadAxis, GamepadButton, MouseButton, OutputCode,
    VirtualDevice as VirtualDeviceSink,
};
use crate::keys::KeyCode;
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    RelativeAxisType, UinputAbsSetup,
};
use log::{debug, info};

const KEYBOARD_NAME: &str = "pad2key Keyboard Mouse";
const GAMEPAD_NAME: &str = "Microsoft X-Box 360 pad";
const XBOX_VENDOR: u16 = 0x045e;
const XBOX_PRODUCT: u16 = 0x028e;

/// Virtual device backed by uinput
pub struct UinputDevice {
    kind: DeviceKind,
    device: Option<VirtualDevice>,
}

impl UinputDevice {
    /// Register a new virtual device with the capability set for `kind`.
    pub fn create(kind: DeviceKind) -> Result<Self, BackendError> {
        let device = match kind {
            DeviceKind::KeyboardMouse => build_keyboard_mouse(),
            DeviceKind::Gamepad => build_gamepad(),
        }
        .map_err(BackendError::Open)?;

        info!("✓ Created virtual {} device", kind);
        Ok(Self { kind, device: Some(device) })
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn emit(&mut self, events: &[InputEvent]) -> Result<(), BackendError> {
        let device = self.device.as_mut().ok_or(BackendError::Destroyed)?;
        device.emit(events).map_err(BackendError::Write)
    }

    fn key_event(&mut self, code: OutputCode, value: i32) -> Result<(), BackendError> {
        let supported = match (self.kind, code) {
            (DeviceKind::KeyboardMouse, OutputCode::Gamepad(_)) => false,
            (DeviceKind::Gamepad, OutputCode::Key(_) | OutputCode::Mouse(_)) => false,
            _ => true,
        };
        if !supported {
            return Err(BackendError::Unsupported(code.to_string(), self.kind));
        }
        self.emit(&[InputEvent::new(EventType::KEY, code.raw(), value)])
    }
}

impl VirtualDeviceSink for UinputDevice {
    fn press(&mut self, code: OutputCode) -> Result<(), BackendError> {
        self.key_event(code, 1)
    }

    fn release(&mut self, code: OutputCode) -> Result<(), BackendError> {
        self.key_event(code, 0)
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), BackendError> {
        if self.kind != DeviceKind::KeyboardMouse {
            return Err(BackendError::Unsupported("mouse motion".into(), self.kind));
        }
        let mut events = Vec::with_capacity(2);
        if dx != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_X.0, dx));
        }
        if dy != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_Y.0, dy));
        }
        if events.is_empty() {
            return Ok(());
        }
        self.emit(&events)
    }

    fn set_axis(&mut self, axis: GamepadAxis, value: i32) -> Result<(), BackendError> {
        if self.kind != DeviceKind::Gamepad {
            return Err(BackendError::Unsupported(axis.name().into(), self.kind));
        }
        self.emit(&[InputEvent::new(EventType::ABSOLUTE, axis.code(), value)])
    }

    fn destroy(&mut self) -> Result<(), BackendError> {
        // Dropping the handle issues UI_DEV_DESTROY
        match self.device.take() {
            Some(device) => {
                drop(device);
                info!("Virtual {} device destroyed", self.kind);
                Ok(())
            }
            None => Err(BackendError::Destroyed),
        }
    }
}

fn build_keyboard_mouse() -> std::io::Result<VirtualDevice> {
    let mut keys = AttributeSet::<Key>::new();
    for key in KeyCode::all() {
        keys.insert(Key::new(key.0));
    }
    for button in MouseButton::ALL {
        keys.insert(Key::new(button.code()));
    }

    let mut rel = AttributeSet::<RelativeAxisType>::new();
    rel.insert(RelativeAxisType::REL_X);
    rel.insert(RelativeAxisType::REL_Y);
    rel.insert(RelativeAxisType::REL_WHEEL);

    debug!("Registering keyboard/mouse with {} keys", keys.iter().count());

    VirtualDeviceBuilder::new()?
        .name(KEYBOARD_NAME)
        .input_id(InputId::new(BusType::BUS_USB, 0x1234, 0x5678, 1))
        .with_keys(&keys)?
        .with_relative_axes(&rel)?
        .build()
}

fn build_gamepad() -> std::io::Result<VirtualDevice> {
    let mut keys = AttributeSet::<Key>::new();
    for button in GamepadButton::ALL {
        keys.insert(Key::new(button.code()));
    }

    let mut builder = VirtualDeviceBuilder::new()?
        .name(GAMEPAD_NAME)
        .input_id(InputId::new(BusType::BUS_USB, XBOX_VENDOR, XBOX_PRODUCT, 0x110))
        .with_keys(&keys)?;

    for axis in GamepadAxis::ALL {
        let (min, max) = axis.range();
        let (fuzz, flat) = match axis {
            GamepadAxis::LeftX | GamepadAxis::LeftY | GamepadAxis::RightX | GamepadAxis::RightY => {
                (16, 128)
            }
            _ => (0, 0),
        };
        let setup = UinputAbsSetup::new(
            AbsoluteAxisType(axis.code()),
            AbsInfo::new(axis.center(), min, max, fuzz, flat, 0),
        );
        builder = builder.with_absolute_axis(&setup)?;
    }

    builder.build()
}
