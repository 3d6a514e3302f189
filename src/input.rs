//! Controller input sources
//!
//! [`GilrsSource`] adapts gilrs events to [`ControllerEvent`]s using the
//! conventions of the mapping engine: Y axes grow downwards, triggers are
//! axes in `0..1`, and the d-pad is hat 0.

use crate::mapping::control::{Axis, Button, HatDirection};
use gilrs::{EventType, GamepadId, Gilrs};
use log::{debug, info, trace, warn};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to initialize controller input: {0}")]
    Init(String),
}

/// A normalized controller event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    ButtonPressed(Button),
    ButtonReleased(Button),
    HatPressed(u8, HatDirection),
    HatReleased(u8, HatDirection),
    /// Signed deflection; sticks in `-1..1`, triggers in `0..1`
    AxisMoved { axis: Axis, value: f32 },
    Connected,
    Disconnected,
}

/// Non-blocking source of controller events
pub trait InputSource {
    /// Next pending event, or `None` when nothing is queued right now
    fn poll(&mut self) -> Option<ControllerEvent>;
}

/// Scripted source, mainly for tests
impl InputSource for VecDeque<ControllerEvent> {
    fn poll(&mut self) -> Option<ControllerEvent> {
        self.pop_front()
    }
}

/// Reads the first connected controller through gilrs
pub struct GilrsSource {
    gilrs: Gilrs,
    active: Option<GamepadId>,
}

impl GilrsSource {
    pub fn new() -> Result<Self, InputError> {
        let gilrs = Gilrs::new().map_err(|e| InputError::Init(e.to_string()))?;

        let active = gilrs.gamepads().next().map(|(id, gamepad)| {
            info!("Using controller: {} ({})", gamepad.name(), id);
            id
        });
        if active.is_none() {
            warn!("No controller connected yet, waiting for one");
        }

        Ok(Self { gilrs, active })
    }
}

impl InputSource for GilrsSource {
    fn poll(&mut self) -> Option<ControllerEvent> {
        while let Some(event) = self.gilrs.next_event() {
            match self.active {
                Some(active) if active != event.id => {
                    trace!("Skipping event from controller {}", event.id);
                    continue;
                }
                None if matches!(event.event, EventType::Connected) => {
                    info!("Controller connected: {}", self.gilrs.gamepad(event.id).name());
                    self.active = Some(event.id);
                    return Some(ControllerEvent::Connected);
                }
                None => self.active = Some(event.id),
                _ => {}
            }

            if matches!(event.event, EventType::Disconnected) {
                warn!("Controller {} disconnected", event.id);
                self.active = None;
                return Some(ControllerEvent::Disconnected);
            }

            if let Some(converted) = convert(event.event) {
                trace!("{:?} -> {:?}", event.event, converted);
                return Some(converted);
            }
        }
        None
    }
}

fn convert(event: EventType) -> Option<ControllerEvent> {
    match event {
        EventType::ButtonPressed(button, _) => match dpad(button) {
            Some(dir) => Some(ControllerEvent::HatPressed(0, dir)),
            None => map_button(button).map(ControllerEvent::ButtonPressed),
        },
        EventType::ButtonReleased(button, _) => match dpad(button) {
            Some(dir) => Some(ControllerEvent::HatReleased(0, dir)),
            None => map_button(button).map(ControllerEvent::ButtonReleased),
        },
        // Analog triggers report their travel here
        EventType::ButtonChanged(gilrs::Button::LeftTrigger2, value, _) => {
            Some(ControllerEvent::AxisMoved { axis: Axis::L2, value })
        }
        EventType::ButtonChanged(gilrs::Button::RightTrigger2, value, _) => {
            Some(ControllerEvent::AxisMoved { axis: Axis::R2, value })
        }
        EventType::AxisChanged(axis, value, _) => map_axis(axis, value),
        EventType::Connected => Some(ControllerEvent::Connected),
        _ => None,
    }
}

fn map_axis(axis: gilrs::Axis, value: f32) -> Option<ControllerEvent> {
    let (axis, value) = match axis {
        gilrs::Axis::LeftStickX => (Axis::LeftX, value),
        gilrs::Axis::LeftStickY => (Axis::LeftY, -value),
        gilrs::Axis::RightStickX => (Axis::RightX, value),
        gilrs::Axis::RightStickY => (Axis::RightY, -value),
        gilrs::Axis::LeftZ => (Axis::L2, value),
        gilrs::Axis::RightZ => (Axis::R2, value),
        other => {
            debug!("Ignoring unsupported axis: {:?}", other);
            return None;
        }
    };
    Some(ControllerEvent::AxisMoved { axis, value })
}

fn map_button(button: gilrs::Button) -> Option<Button> {
    match button {
        gilrs::Button::South => Some(Button::A),
        gilrs::Button::East => Some(Button::B),
        gilrs::Button::West => Some(Button::X),
        gilrs::Button::North => Some(Button::Y),
        gilrs::Button::LeftTrigger => Some(Button::L1),
        gilrs::Button::RightTrigger => Some(Button::R1),
        gilrs::Button::LeftThumb => Some(Button::L3),
        gilrs::Button::RightThumb => Some(Button::R3),
        gilrs::Button::Start => Some(Button::Start),
        gilrs::Button::Select => Some(Button::Back),
        gilrs::Button::Mode => Some(Button::Guide),
        _ => None,
    }
}

fn dpad(button: gilrs::Button) -> Option<HatDirection> {
    match button {
        gilrs::Button::DPadUp => Some(HatDirection::Up),
        gilrs::Button::DPadDown => Some(HatDirection::Down),
        gilrs::Button::DPadLeft => Some(HatDirection::Left),
        gilrs::Button::DPadRight => Some(HatDirection::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_drains_in_order() {
        let mut source: VecDeque<ControllerEvent> = VecDeque::from(vec![
            ControllerEvent::ButtonPressed(Button::A),
            ControllerEvent::ButtonReleased(Button::A),
        ]);
        assert_eq!(source.poll(), Some(ControllerEvent::ButtonPressed(Button::A)));
        assert_eq!(source.poll(), Some(ControllerEvent::ButtonReleased(Button::A)));
        assert_eq!(source.poll(), None);
    }

    #[test]
    fn test_button_and_dpad_mapping() {
        assert_eq!(map_button(gilrs::Button::South), Some(Button::A));
        assert_eq!(map_button(gilrs::Button::Select), Some(Button::Back));
        assert_eq!(map_button(gilrs::Button::LeftTrigger2), None);
        assert_eq!(dpad(gilrs::Button::DPadLeft), Some(HatDirection::Left));
        assert_eq!(dpad(gilrs::Button::South), None);
    }

    #[test]
    fn test_axis_mapping_flips_y() {
        assert_eq!(
            map_axis(gilrs::Axis::LeftStickY, 0.5),
            Some(ControllerEvent::AxisMoved { axis: Axis::LeftY, value: -0.5 })
        );
        assert_eq!(
            map_axis(gilrs::Axis::RightStickX, 0.25),
            Some(ControllerEvent::AxisMoved { axis: Axis::RightX, value: 0.25 })
        );
        assert_eq!(map_axis(gilrs::Axis::DPadX, 1.0), None);
    }
}
