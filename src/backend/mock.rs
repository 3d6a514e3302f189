//! Mock virtual device for testing.
//!
//! This backend logs device writes instead of sending them to the OS and
//! keeps a shared record of them, so the mapping logic can be tested
//! without uinput access. Clones share the same record.

use super::{BackendError, DeviceKind, GamepadAxis, OutputCode, VirtualDevice};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One write observed by the mock device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Press(OutputCode),
    Release(OutputCode),
    Move { dx: i32, dy: i32 },
    Axis { axis: GamepadAxis, value: i32 },
    Destroyed,
}

/// Mock device that logs events and records them.
#[derive(Clone, Debug, Default)]
pub struct MockDevice {
    events: Arc<Mutex<Vec<DeviceEvent>>>,
    failing: Arc<AtomicBool>,
    destroyed: Arc<AtomicBool>,
    /// When set, outputs outside this capability set are rejected
    kind: Option<DeviceKind>,
}

impl MockDevice {
    /// Create a new mock device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that only accepts the outputs a real `kind` device has.
    pub fn with_kind(kind: DeviceKind) -> Self {
        Self { kind: Some(kind), ..Self::default() }
    }

    /// Snapshot of everything written so far.
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Drain the record.
    pub fn take_events(&self) -> Vec<DeviceEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    /// Make every following write fail (simulates an unplugged device).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn require(&self, kind: DeviceKind, output: impl ToString) -> Result<(), BackendError> {
        match self.kind {
            Some(own) if own != kind => Err(BackendError::Unsupported(output.to_string(), own)),
            _ => Ok(()),
        }
    }

    fn code_kind(code: OutputCode) -> DeviceKind {
        match code {
            OutputCode::Gamepad(_) => DeviceKind::Gamepad,
            OutputCode::Key(_) | OutputCode::Mouse(_) => DeviceKind::KeyboardMouse,
        }
    }

    fn record(&self, event: DeviceEvent) -> Result<(), BackendError> {
        if self.is_destroyed() {
            return Err(BackendError::Destroyed);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock device failing",
            )));
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

impl VirtualDevice for MockDevice {
    fn press(&mut self, code: OutputCode) -> Result<(), BackendError> {
        info!("[MOCK DEVICE] DOWN: {}", code);
        self.require(Self::code_kind(code), code)?;
        self.record(DeviceEvent::Press(code))
    }

    fn release(&mut self, code: OutputCode) -> Result<(), BackendError> {
        info!("[MOCK DEVICE] UP: {}", code);
        self.require(Self::code_kind(code), code)?;
        self.record(DeviceEvent::Release(code))
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), BackendError> {
        info!("[MOCK DEVICE] Move relative: dx={}, dy={}", dx, dy);
        self.require(DeviceKind::KeyboardMouse, "mouse motion")?;
        self.record(DeviceEvent::Move { dx, dy })
    }

    fn set_axis(&mut self, axis: GamepadAxis, value: i32) -> Result<(), BackendError> {
        info!("[MOCK DEVICE] Axis {} = {}", axis.name(), value);
        self.require(DeviceKind::Gamepad, axis.name())?;
        self.record(DeviceEvent::Axis { axis, value })
    }

    fn destroy(&mut self) -> Result<(), BackendError> {
        info!("[MOCK DEVICE] Destroyed");
        self.record(DeviceEvent::Destroyed)?;
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyCode;

    #[test]
    fn mock_device_records_writes() {
        let mut device = MockDevice::new();
        let observer = device.clone();

        assert!(device.press(OutputCode::Key(KeyCode::ENTER)).is_ok());
        assert!(device.move_relative(10, -5).is_ok());

        assert_eq!(
            observer.events(),
            vec![
                DeviceEvent::Press(OutputCode::Key(KeyCode::ENTER)),
                DeviceEvent::Move { dx: 10, dy: -5 },
            ]
        );
    }

    #[test]
    fn mock_device_rejects_writes_after_destroy() {
        let mut device = MockDevice::new();
        assert!(device.destroy().is_ok());
        assert!(matches!(
            device.press(OutputCode::Key(KeyCode::ESC)),
            Err(BackendError::Destroyed)
        ));
    }
}
