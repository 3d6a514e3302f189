//! Output emitter - the stateful front of the virtual device
//!
//! Tracks which outputs are currently down so repeated presses collapse into
//! a single down event and every down gets exactly one matching up.

use super::{BackendError, GamepadAxis, OutputCode, VirtualDevice};
use log::{debug, trace, warn};
use std::collections::{HashMap, HashSet};

/// Outputs that survive a forced release because a held control still
/// asserts them under the new profile stack.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Retained {
    pub codes: HashSet<OutputCode>,
    pub axes: HashSet<GamepadAxis>,
}

impl Retained {
    /// Nothing retained: release everything (shutdown, disconnect).
    pub fn none() -> Self {
        Self::default()
    }
}

pub struct OutputEmitter<D: VirtualDevice> {
    device: D,
    /// Outputs we have actually sent a down for
    down: HashSet<OutputCode>,
    /// Last value written per gamepad axis
    axes: HashMap<GamepadAxis, i32>,
    consecutive_failures: u32,
    force_releases: u32,
}

impl<D: VirtualDevice> OutputEmitter<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            down: HashSet::new(),
            axes: HashMap::new(),
            consecutive_failures: 0,
            force_releases: 0,
        }
    }

    /// Press an output; no-op if it is already down.
    pub fn press(&mut self, code: OutputCode) -> Result<(), BackendError> {
        if self.down.contains(&code) {
            trace!("{} already down", code);
            return Ok(());
        }
        let result = self.device.press(code);
        self.track(&result);
        result?;
        self.down.insert(code);
        Ok(())
    }

    /// Release an output; no-op if it is already up.
    ///
    /// A failed write leaves the output marked down so a later release retries.
    pub fn release(&mut self, code: OutputCode) -> Result<(), BackendError> {
        if !self.down.contains(&code) {
            return Ok(());
        }
        let result = self.device.release(code);
        self.track(&result);
        result?;
        self.down.remove(&code);
        Ok(())
    }

    pub fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), BackendError> {
        if dx == 0 && dy == 0 {
            return Ok(());
        }
        let result = self.device.move_relative(dx, dy);
        self.track(&result);
        result
    }

    /// Write an axis value; skipped when unchanged.
    pub fn set_axis(&mut self, axis: GamepadAxis, value: i32) -> Result<(), BackendError> {
        let current = self.axes.get(&axis).copied().unwrap_or(axis.center());
        if current == value {
            return Ok(());
        }
        let result = self.device.set_axis(axis, value);
        self.track(&result);
        if let Err(BackendError::Unsupported(..)) = result {
            // Retrying every frame cannot succeed
            self.axes.insert(axis, value);
        }
        result?;
        self.axes.insert(axis, value);
        Ok(())
    }

    /// Release every down output and center every deflected axis that is not
    /// in `retained`.
    ///
    /// Tracked state is cleared even when a write fails, so nothing stays
    /// logically stuck; the last failure is returned after all outputs have
    /// been attempted.
    pub fn force_release_all(&mut self, retained: &Retained) -> Result<(), BackendError> {
        self.force_releases += 1;
        let mut last_error = None;

        let mut stale: Vec<OutputCode> = self
            .down
            .iter()
            .filter(|code| !retained.codes.contains(code))
            .copied()
            .collect();
        stale.sort();
        for code in stale {
            self.down.remove(&code);
            let result = self.device.release(code);
            self.track(&result);
            match result {
                Ok(()) => debug!("Force released {}", code),
                Err(e) => {
                    warn!("Failed to force release {}: {}", code, e);
                    last_error = Some(e);
                }
            }
        }

        let mut deflected: Vec<GamepadAxis> = self
            .axes
            .iter()
            .filter(|(axis, value)| **value != axis.center() && !retained.axes.contains(axis))
            .map(|(axis, _)| *axis)
            .collect();
        deflected.sort();
        for axis in deflected {
            self.axes.insert(axis, axis.center());
            let result = self.device.set_axis(axis, axis.center());
            self.track(&result);
            if let Err(e) = result {
                warn!("Failed to center axis {}: {}", axis.name(), e);
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn is_down(&self, code: OutputCode) -> bool {
        self.down.contains(&code)
    }

    /// Outputs currently held down
    pub fn held(&self) -> impl Iterator<Item = &OutputCode> {
        self.down.iter()
    }

    pub fn axis_value(&self, axis: GamepadAxis) -> i32 {
        self.axes.get(&axis).copied().unwrap_or(axis.center())
    }

    /// Axes currently away from their resting value
    pub fn deflected_axes(&self) -> impl Iterator<Item = GamepadAxis> + '_ {
        self.axes
            .iter()
            .filter(|(axis, value)| **value != axis.center())
            .map(|(axis, _)| *axis)
    }

    /// Number of writes that failed in a row
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// How many times [`force_release_all`](Self::force_release_all) ran
    pub fn force_release_count(&self) -> u32 {
        self.force_releases
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Tear the virtual device down.
    pub fn destroy(&mut self) -> Result<(), BackendError> {
        self.device.destroy()
    }

    /// Only transport failures count; an output the device lacks is a
    /// configuration mismatch and leaves the counter alone.
    fn track(&mut self, result: &Result<(), BackendError>) {
        match result {
            Ok(()) => self.consecutive_failures = 0,
            Err(BackendError::Write(_) | BackendError::Destroyed) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1)
            }
            Err(_) => {}
        }
    }
}
