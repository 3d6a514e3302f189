//! Control identifiers - the physical inputs a mapping can bind
//!
//! Axes are split into a positive and a negative half so each half can be
//! bound on its own (left stick left -> `a`, left stick right -> `d`).

use std::fmt;

/// Digital controller buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Button {
    A, B, X, Y,
    L1, R1,
    L3, R3,
    Start, Back, Guide,
}

/// Analog axes. Y axes grow downwards; triggers only use the positive half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    L2,
    R2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HatDirection {
    Up,
    Down,
    Left,
    Right,
}

/// A single physical input element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlId {
    Button(Button),
    AxisPositive(Axis),
    AxisNegative(Axis),
    Hat(u8, HatDirection),
}

const BUTTON_NAMES: &[(&str, Button)] = &[
    ("a", Button::A),
    ("b", Button::B),
    ("x", Button::X),
    ("y", Button::Y),
    ("l1", Button::L1),
    ("r1", Button::R1),
    ("l3", Button::L3),
    ("r3", Button::R3),
    ("start", Button::Start),
    ("back", Button::Back),
    ("select", Button::Back),
    ("guide", Button::Guide),
];

const HALF_NAMES: &[(&str, ControlId)] = &[
    ("l2", ControlId::AxisPositive(Axis::L2)),
    ("r2", ControlId::AxisPositive(Axis::R2)),
    ("left_analog_up", ControlId::AxisNegative(Axis::LeftY)),
    ("left_analog_down", ControlId::AxisPositive(Axis::LeftY)),
    ("left_analog_left", ControlId::AxisNegative(Axis::LeftX)),
    ("left_analog_right", ControlId::AxisPositive(Axis::LeftX)),
    ("right_analog_up", ControlId::AxisNegative(Axis::RightY)),
    ("right_analog_down", ControlId::AxisPositive(Axis::RightY)),
    ("right_analog_left", ControlId::AxisNegative(Axis::RightX)),
    ("right_analog_right", ControlId::AxisPositive(Axis::RightX)),
];

const HAT_NAMES: &[(&str, HatDirection)] = &[
    ("up", HatDirection::Up),
    ("down", HatDirection::Down),
    ("left", HatDirection::Left),
    ("right", HatDirection::Right),
];

impl Axis {
    fn name(&self) -> &'static str {
        match self {
            Axis::LeftX => "left_x",
            Axis::LeftY => "left_y",
            Axis::RightX => "right_x",
            Axis::RightY => "right_y",
            Axis::L2 => "l2",
            Axis::R2 => "r2",
        }
    }
}

impl ControlId {
    /// Parse a config control name (`a`, `l2`, `up`, `left_analog_left`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        if let Some((_, button)) = BUTTON_NAMES.iter().find(|(n, _)| *n == lower) {
            return Some(ControlId::Button(*button));
        }
        if let Some((_, control)) = HALF_NAMES.iter().find(|(n, _)| *n == lower) {
            return Some(*control);
        }
        HAT_NAMES
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, dir)| ControlId::Hat(0, *dir))
    }

    /// Sign of the deflection this control represents, used when it drives
    /// an absolute gamepad axis.
    pub fn sign(&self) -> f32 {
        match self {
            ControlId::AxisNegative(_) => -1.0,
            ControlId::Hat(_, HatDirection::Up | HatDirection::Left) => -1.0,
            _ => 1.0,
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlId::Button(button) => {
                let name = BUTTON_NAMES
                    .iter()
                    .find(|(_, b)| b == button)
                    .map(|(n, _)| *n)
                    .unwrap_or("?");
                f.write_str(name)
            }
            ControlId::AxisPositive(_) | ControlId::AxisNegative(_) => {
                match HALF_NAMES.iter().find(|(_, c)| c == self) {
                    Some((name, _)) => f.write_str(name),
                    None => {
                        let (axis, sign) = match self {
                            ControlId::AxisPositive(axis) => (axis, '+'),
                            ControlId::AxisNegative(axis) => (axis, '-'),
                            _ => unreachable!(),
                        };
                        write!(f, "{}{}", axis.name(), sign)
                    }
                }
            }
            ControlId::Hat(0, dir) => {
                let name = HAT_NAMES
                    .iter()
                    .find(|(_, d)| d == dir)
                    .map(|(n, _)| *n)
                    .unwrap_or("?");
                f.write_str(name)
            }
            ControlId::Hat(id, dir) => write!(f, "hat{}_{:?}", id, dir),
        }
    }
}
