//! Backend abstraction for the virtual output device
//!
//! This module provides a unified interface for sending synthesized keyboard,
//! mouse and gamepad events to the operating system, plus the emitter that
//! keeps track of which outputs are currently held.

pub mod emitter;
pub mod mock;
#[cfg(target_os = "linux")]
pub mod uinput;

pub use emitter::{OutputEmitter, Retained};
pub use mock::{DeviceEvent, MockDevice};
#[cfg(target_os = "linux")]
pub use uinput::UinputDevice;

use crate::keys::KeyCode;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to open virtual device: {0}")]
    Open(#[source] std::io::Error),

    #[error("Failed to write to virtual device: {0}")]
    Write(#[source] std::io::Error),

    #[error("Output {0} is not supported by a {1} device")]
    Unsupported(String, DeviceKind),

    #[error("Virtual device already destroyed")]
    Destroyed,

    #[error("Platform not supported")]
    PlatformNotSupported,
}

/// Which capability set the virtual device registers with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    /// Keyboard plus relative mouse
    #[default]
    KeyboardMouse,
    /// Xbox 360 style pad
    Gamepad,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::KeyboardMouse => f.write_str("keyboard/mouse"),
            DeviceKind::Gamepad => f.write_str("gamepad"),
        }
    }
}

/// Unified interface to the virtual device sink.
///
/// Implementations forward every call to the device; de-duplication of
/// repeated presses lives in [`OutputEmitter`], not here.
pub trait VirtualDevice {
    /// Press an output (key/button down event)
    fn press(&mut self, code: OutputCode) -> Result<(), BackendError>;

    /// Release an output (key/button up event)
    fn release(&mut self, code: OutputCode) -> Result<(), BackendError>;

    /// Move the pointer relatively by (dx, dy)
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), BackendError>;

    /// Write an absolute gamepad axis value, already in device range
    fn set_axis(&mut self, axis: GamepadAxis, value: i32) -> Result<(), BackendError>;

    /// Unregister the device. Further writes fail with [`BackendError::Destroyed`].
    fn destroy(&mut self) -> Result<(), BackendError>;
}

/// A discrete output that can be held down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputCode {
    Key(KeyCode),
    Mouse(MouseButton),
    Gamepad(GamepadButton),
}

impl OutputCode {
    /// Linux input-event code of this output
    pub fn raw(&self) -> u16 {
        match self {
            OutputCode::Key(key) => key.0,
            OutputCode::Mouse(button) => button.code(),
            OutputCode::Gamepad(button) => button.code(),
        }
    }
}

impl fmt::Display for OutputCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputCode::Key(key) => write!(f, "{}", key),
            OutputCode::Mouse(button) => f.write_str(button.name()),
            OutputCode::Gamepad(button) => f.write_str(button.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

    pub fn code(&self) -> u16 {
        match self {
            MouseButton::Left => 0x110,
            MouseButton::Right => 0x111,
            MouseButton::Middle => 0x112,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MouseButton::Left => "mouse_left",
            MouseButton::Right => "mouse_right",
            MouseButton::Middle => "mouse_middle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// Buttons of the virtual Xbox 360 pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GamepadButton {
    South,
    East,
    West,
    North,
    LeftShoulder,
    RightShoulder,
    Select,
    Start,
    Mode,
    LeftThumb,
    RightThumb,
}

impl GamepadButton {
    pub const ALL: [GamepadButton; 11] = [
        GamepadButton::South,
        GamepadButton::East,
        GamepadButton::West,
        GamepadButton::North,
        GamepadButton::LeftShoulder,
        GamepadButton::RightShoulder,
        GamepadButton::Select,
        GamepadButton::Start,
        GamepadButton::Mode,
        GamepadButton::LeftThumb,
        GamepadButton::RightThumb,
    ];

    pub fn code(&self) -> u16 {
        match self {
            GamepadButton::South => 0x130,
            GamepadButton::East => 0x131,
            GamepadButton::North => 0x133,
            GamepadButton::West => 0x134,
            GamepadButton::LeftShoulder => 0x136,
            GamepadButton::RightShoulder => 0x137,
            GamepadButton::Select => 0x13a,
            GamepadButton::Start => 0x13b,
            GamepadButton::Mode => 0x13c,
            GamepadButton::LeftThumb => 0x13d,
            GamepadButton::RightThumb => 0x13e,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GamepadButton::South => "pad_a",
            GamepadButton::East => "pad_b",
            GamepadButton::West => "pad_x",
            GamepadButton::North => "pad_y",
            GamepadButton::LeftShoulder => "pad_lb",
            GamepadButton::RightShoulder => "pad_rb",
            GamepadButton::Select => "pad_back",
            GamepadButton::Start => "pad_start",
            GamepadButton::Mode => "pad_guide",
            GamepadButton::LeftThumb => "pad_l3",
            GamepadButton::RightThumb => "pad_r3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// Absolute axes of the virtual Xbox 360 pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
    LeftTrigger,
    RightX,
    RightY,
    RightTrigger,
    HatX,
    HatY,
}

/// Stick range of a real Xbox 360 pad
pub const STICK_MIN: i32 = -32768;
pub const STICK_MAX: i32 = 32767;
/// Trigger range of a real Xbox 360 pad
pub const TRIGGER_MAX: i32 = 255;

impl GamepadAxis {
    pub const ALL: [GamepadAxis; 8] = [
        GamepadAxis::LeftX,
        GamepadAxis::LeftY,
        GamepadAxis::LeftTrigger,
        GamepadAxis::RightX,
        GamepadAxis::RightY,
        GamepadAxis::RightTrigger,
        GamepadAxis::HatX,
        GamepadAxis::HatY,
    ];

    /// Linux ABS_* code
    pub fn code(&self) -> u16 {
        match self {
            GamepadAxis::LeftX => 0x00,
            GamepadAxis::LeftY => 0x01,
            GamepadAxis::LeftTrigger => 0x02,
            GamepadAxis::RightX => 0x03,
            GamepadAxis::RightY => 0x04,
            GamepadAxis::RightTrigger => 0x05,
            GamepadAxis::HatX => 0x10,
            GamepadAxis::HatY => 0x11,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GamepadAxis::LeftX => "pad_lx",
            GamepadAxis::LeftY => "pad_ly",
            GamepadAxis::LeftTrigger => "pad_lt",
            GamepadAxis::RightX => "pad_rx",
            GamepadAxis::RightY => "pad_ry",
            GamepadAxis::RightTrigger => "pad_rt",
            GamepadAxis::HatX => "pad_hatx",
            GamepadAxis::HatY => "pad_haty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Device range as (min, max)
    pub fn range(&self) -> (i32, i32) {
        match self {
            GamepadAxis::LeftTrigger | GamepadAxis::RightTrigger => (0, TRIGGER_MAX),
            GamepadAxis::HatX | GamepadAxis::HatY => (-1, 1),
            _ => (STICK_MIN, STICK_MAX),
        }
    }

    /// Resting value of the axis
    pub fn center(&self) -> i32 {
        0
    }

    /// Scale a signed deflection in `[-1, 1]` to the full device range.
    ///
    /// Triggers only have a positive half, so the sign is dropped for them.
    pub fn scale(&self, deflection: f32) -> i32 {
        let deflection = deflection.clamp(-1.0, 1.0);
        let (min, max) = self.range();
        let value = if min == 0 {
            deflection.abs() * max as f32
        } else if deflection >= 0.0 {
            deflection * max as f32
        } else {
            deflection * -(min as f32)
        };
        (value.round() as i32).clamp(min, max)
    }
}
