//! Output actions a control can be bound to

use crate::backend::{DeviceKind, GamepadAxis, GamepadButton, MouseButton, OutputCode};
use crate::keys::KeyCode;
use std::fmt;

/// Direction of pointer motion driven by a held control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseDirection {
    Up,
    Down,
    Left,
    Right,
}

impl MouseDirection {
    const NAMES: [(&'static str, MouseDirection); 4] = [
        ("mouse_movement_up", MouseDirection::Up),
        ("mouse_movement_down", MouseDirection::Down),
        ("mouse_movement_left", MouseDirection::Left),
        ("mouse_movement_right", MouseDirection::Right),
    ];

    /// Unit vector (dx, dy); screen y grows downwards.
    pub fn unit(&self) -> (f32, f32) {
        match self {
            MouseDirection::Up => (0.0, -1.0),
            MouseDirection::Down => (0.0, 1.0),
            MouseDirection::Left => (-1.0, 0.0),
            MouseDirection::Right => (1.0, 0.0),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            MouseDirection::Up => "mouse_movement_up",
            MouseDirection::Down => "mouse_movement_down",
            MouseDirection::Left => "mouse_movement_left",
            MouseDirection::Right => "mouse_movement_right",
        }
    }
}

/// Action to perform when a control is activated.
///
/// Actions are plain data; applying them is the translator's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Hold a keyboard key while the control is held
    Key(KeyCode),

    /// Hold a mouse button while the control is held
    MouseButton(MouseButton),

    /// Move the pointer every tick, `scale` pixels at full deflection
    MouseMove { direction: MouseDirection, scale: f32 },

    /// Hold a virtual gamepad button
    GamepadButton(GamepadButton),

    /// Drive a virtual gamepad axis with the control's deflection
    GamepadAxis(GamepadAxis),

    /// Push the named profile onto the stack
    SwitchProfile(String),

    /// Push the named profile while held, pop it on release
    HoldProfile(String),

    /// Pop the top profile
    PopProfile,

    /// End the session
    Quit,
}

impl Action {
    /// Parse one config value into actions.
    ///
    /// Key combos (`ctrl+c`) expand into one key action per part, in order.
    /// `mouse_movement_*` tokens take an optional `:scale` suffix and fall back
    /// to `default_scale`. Returns the offending token on failure.
    pub fn parse_value(value: &str, default_scale: f32) -> Result<Vec<Action>, String> {
        let value = value.trim();
        if let Some((verb, arg)) = value.split_once(char::is_whitespace) {
            let arg = arg.trim();
            return match verb {
                "push" | "push_state" if !arg.is_empty() => Ok(vec![Action::SwitchProfile(arg.to_string())]),
                "hold" | "hold_state" if !arg.is_empty() => Ok(vec![Action::HoldProfile(arg.to_string())]),
                _ => Err(value.to_string()),
            };
        }

        match value {
            "pop" | "pop_state" => return Ok(vec![Action::PopProfile]),
            "quit" => return Ok(vec![Action::Quit]),
            _ => {}
        }

        if let Some(button) = MouseButton::from_name(value) {
            return Ok(vec![Action::MouseButton(button)]);
        }
        if let Some(button) = GamepadButton::from_name(value) {
            return Ok(vec![Action::GamepadButton(button)]);
        }
        if let Some(axis) = GamepadAxis::from_name(value) {
            return Ok(vec![Action::GamepadAxis(axis)]);
        }

        let (name, scale) = match value.split_once(':') {
            Some((name, scale)) => {
                let scale: f32 = scale.trim().parse().map_err(|_| value.to_string())?;
                if scale <= 0.0 {
                    return Err(value.to_string());
                }
                (name.trim(), Some(scale))
            }
            None => (value, None),
        };
        if let Some((_, direction)) = MouseDirection::NAMES.iter().find(|(n, _)| *n == name) {
            return Ok(vec![Action::MouseMove {
                direction: *direction,
                scale: scale.unwrap_or(default_scale),
            }]);
        }
        if scale.is_some() {
            return Err(value.to_string());
        }

        if let Some(key) = KeyCode::from_name(value) {
            return Ok(vec![Action::Key(key)]);
        }
        value
            .split('+')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|part| KeyCode::from_name(part).map(Action::Key).ok_or_else(|| part.to_string()))
            .collect()
    }

    /// The holdable output this action drives, if any
    pub fn output_code(&self) -> Option<OutputCode> {
        match self {
            Action::Key(key) => Some(OutputCode::Key(*key)),
            Action::MouseButton(button) => Some(OutputCode::Mouse(*button)),
            Action::GamepadButton(button) => Some(OutputCode::Gamepad(*button)),
            _ => None,
        }
    }

    /// Profile-stack and session directives (the only actions a hotkey may fire)
    pub fn is_directive(&self) -> bool {
        matches!(
            self,
            Action::SwitchProfile(_) | Action::HoldProfile(_) | Action::PopProfile | Action::Quit
        )
    }

    /// Device capability set needed to emit this action; `None` for directives
    pub fn device_kind(&self) -> Option<DeviceKind> {
        match self {
            Action::Key(_) | Action::MouseButton(_) | Action::MouseMove { .. } => {
                Some(DeviceKind::KeyboardMouse)
            }
            Action::GamepadButton(_) | Action::GamepadAxis(_) => Some(DeviceKind::Gamepad),
            _ => None,
        }
    }

    /// Name of the profile this action refers to
    pub fn profile_name(&self) -> Option<&str> {
        match self {
            Action::SwitchProfile(name) | Action::HoldProfile(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Key(key) => write!(f, "{}", key),
            Action::MouseButton(button) => f.write_str(button.name()),
            Action::MouseMove { direction, scale } => write!(f, "{}:{}", direction.name(), scale),
            Action::GamepadButton(button) => f.write_str(button.name()),
            Action::GamepadAxis(axis) => f.write_str(axis.name()),
            Action::SwitchProfile(name) => write!(f, "push {}", name),
            Action::HoldProfile(name) => write!(f, "hold {}", name),
            Action::PopProfile => f.write_str("pop"),
            Action::Quit => f.write_str("quit"),
        }
    }
}
