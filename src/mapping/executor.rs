//! Event translator - turns controller events into output actions
//!
//! This is the core of the event-driven architecture. It owns the held
//! control set, the profile stack and the output emitter. Discrete work
//! (presses, releases, profile changes, hotkeys) happens as events arrive;
//! continuous work (pointer motion, gamepad axes, auto-repeat, the quit grace
//! delay) happens once per [`tick`](EventTranslator::tick).

use crate::backend::{BackendError, GamepadAxis, OutputCode, OutputEmitter, Retained, VirtualDevice};
use crate::input::ControllerEvent;
use crate::keys::KeyCode;
use crate::mapping::action::Action;
use crate::mapping::config::Settings;
use crate::mapping::control::{Axis, ControlId};
use crate::mapping::hotkey::HotkeyDetector;
use crate::mapping::registry::{LayerId, ProfileStack};
use crate::process::ProcessTerminator;
use log::{debug, error, info, trace, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Consecutive failed device writes tolerated before the device counts as lost
pub const MAX_WRITE_FAILURES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorState {
    Running,
    /// Quit requested; waiting out the grace delay
    Suspended { since: Instant },
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    QuitRequested,
    DeviceLost,
}

/// Runtime knobs, fixed for the session
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    /// Process to terminate on quit
    pub quit_target: Option<String>,
    /// Send alt+f4 on quit
    pub pc_quit: bool,
    pub repeat_delay: Duration,
    pub repeat_rate: Duration,
    pub quit_grace: Duration,
}

impl TranslatorOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            quit_target: None,
            pc_quit: false,
            repeat_delay: Duration::from_millis(settings.repeat_delay_ms),
            repeat_rate: Duration::from_millis(settings.repeat_rate_ms),
            quit_grace: Duration::from_millis(settings.quit_grace_ms),
        }
    }
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// One entry of the held control set
#[derive(Debug, Clone)]
struct HeldControl {
    /// Post-deadzone magnitude in [0, 1]; 1.0 for buttons and hats
    magnitude: f32,
    /// Actions resolved at press time, undone in reverse on release
    actions: Vec<Action>,
    /// Stack entries pushed by this control's `hold` actions
    layers: Vec<LayerId>,
    next_repeat: Option<Instant>,
}

pub struct EventTranslator<D: VirtualDevice> {
    stack: ProfileStack,
    emitter: OutputEmitter<D>,
    hotkeys: HotkeyDetector,
    held: HashMap<ControlId, HeldControl>,
    terminator: Box<dyn ProcessTerminator>,
    options: TranslatorOptions,
    state: TranslatorState,
    reason: Option<TerminationReason>,
    /// Sub-pixel pointer motion carried to the next tick
    residual: (f32, f32),
}

impl<D: VirtualDevice> EventTranslator<D> {
    pub fn new(
        stack: ProfileStack,
        emitter: OutputEmitter<D>,
        terminator: Box<dyn ProcessTerminator>,
        options: TranslatorOptions,
    ) -> Self {
        info!("Starting with profile: '{}'", stack.top_profile().name);
        Self {
            stack,
            emitter,
            hotkeys: HotkeyDetector::new(),
            held: HashMap::new(),
            terminator,
            options,
            state: TranslatorState::Running,
            reason: None,
            residual: (0.0, 0.0),
        }
    }

    /// Apply one controller event. Ignored unless running.
    pub fn process_event(&mut self, event: &ControllerEvent, now: Instant) {
        if self.state != TranslatorState::Running {
            trace!("Ignoring {:?} while {:?}", event, self.state);
            return;
        }

        match *event {
            ControllerEvent::ButtonPressed(button) => self.activate(ControlId::Button(button), 1.0, now),
            ControllerEvent::ButtonReleased(button) => self.deactivate(ControlId::Button(button)),
            ControllerEvent::HatPressed(hat, dir) => self.activate(ControlId::Hat(hat, dir), 1.0, now),
            ControllerEvent::HatReleased(hat, dir) => self.deactivate(ControlId::Hat(hat, dir)),
            ControllerEvent::AxisMoved { axis, value } => self.on_axis(axis, value, now),
            ControllerEvent::Connected => info!("Controller connected"),
            ControllerEvent::Disconnected => self.on_disconnect(),
        }

        if self.state == TranslatorState::Running {
            self.sync_axes();
        }
    }

    /// Per-frame work: auto-repeat, pointer motion, gamepad axes, failure
    /// escalation and the quit grace delay.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            TranslatorState::Terminated => return,
            TranslatorState::Suspended { since } => {
                if now.saturating_duration_since(since) >= self.options.quit_grace {
                    info!("Grace delay elapsed, terminating");
                    self.state = TranslatorState::Terminated;
                }
                return;
            }
            TranslatorState::Running => {}
        }

        self.run_repeats(now);
        self.move_pointer();
        self.sync_axes();

        if self.emitter.consecutive_failures() > MAX_WRITE_FAILURES {
            error!(
                "Virtual device failed {} writes in a row, giving up",
                self.emitter.consecutive_failures()
            );
            self.request_quit(TerminationReason::DeviceLost, now);
        }
    }

    pub fn state(&self) -> TranslatorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TranslatorState::Running
    }

    pub fn is_terminated(&self) -> bool {
        self.state == TranslatorState::Terminated
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.reason
    }

    pub fn stack(&self) -> &ProfileStack {
        &self.stack
    }

    pub fn emitter(&self) -> &OutputEmitter<D> {
        &self.emitter
    }

    pub fn is_held(&self, control: &ControlId) -> bool {
        self.held.contains_key(control)
    }

    /// Release anything still down and destroy the virtual device.
    pub fn shutdown(&mut self) -> Result<(), BackendError> {
        self.held.clear();
        if self.emitter.held().next().is_some() || self.emitter.deflected_axes().next().is_some() {
            if let Err(e) = self.emitter.force_release_all(&Retained::none()) {
                warn!("Failed to release outputs at shutdown: {}", e);
            }
        }
        self.emitter.destroy()
    }

    fn on_axis(&mut self, axis: Axis, value: f32, now: Instant) {
        let value = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
        let deadzone = self.stack.deadzone();
        let positive = ControlId::AxisPositive(axis);
        let negative = ControlId::AxisNegative(axis);

        if value == 0.0 || value.abs() < deadzone {
            self.deactivate(positive);
            self.deactivate(negative);
            return;
        }

        let magnitude = ((value.abs() - deadzone) / (1.0 - deadzone)).clamp(0.0, 1.0);
        let (active, opposite) = if value > 0.0 { (positive, negative) } else { (negative, positive) };
        self.deactivate(opposite);
        self.activate(active, magnitude, now);
    }

    fn on_disconnect(&mut self) {
        warn!("Controller disconnected, releasing all outputs");
        self.drop_held();
        if let Err(e) = self.emitter.force_release_all(&Retained::none()) {
            warn!("Failed to release outputs: {}", e);
        }
    }

    fn activate(&mut self, control: ControlId, magnitude: f32, now: Instant) {
        if let Some(held) = self.held.get_mut(&control) {
            held.magnitude = magnitude;
            return;
        }

        self.held.insert(
            control,
            HeldControl { magnitude, actions: Vec::new(), layers: Vec::new(), next_repeat: None },
        );

        if let Some(action) = self.hotkeys.update(&self.held, &self.stack) {
            info!("Hotkey on {}: {}", control, action);
            // A `hold` fired by a combo lasts until the completing control is released
            if let Some(layer) = self.apply_press(&action, now) {
                if let Some(held) = self.held.get_mut(&control) {
                    held.layers.push(layer);
                }
            }
            return;
        }

        let actions = self.stack.effective_action(&control).to_vec();
        if actions.is_empty() {
            trace!("{} is unmapped", control);
            return;
        }
        debug!("{} pressed -> {:?}", control, actions);

        let repeats = self.stack.repeats(&control) && actions.iter().any(|a| a.output_code().is_some());
        if let Some(held) = self.held.get_mut(&control) {
            held.actions = actions.clone();
            held.next_repeat = repeats.then(|| now + self.options.repeat_delay);
        }

        for action in &actions {
            if self.state != TranslatorState::Running {
                break;
            }
            if let Some(layer) = self.apply_press(action, now) {
                if let Some(held) = self.held.get_mut(&control) {
                    held.layers.push(layer);
                }
            }
        }
    }

    fn deactivate(&mut self, control: ControlId) {
        let Some(held) = self.held.remove(&control) else {
            return;
        };
        self.hotkeys.release(&self.held);

        if !held.actions.is_empty() {
            debug!("{} released", control);
        }
        for action in held.actions.iter().rev() {
            self.apply_release(action);
        }
        if self.remove_layers(held.layers) {
            self.stack_changed();
        }
    }

    /// Remove hold layers, newest first. True if the stack changed.
    fn remove_layers(&mut self, mut layers: Vec<LayerId>) -> bool {
        layers.sort();
        let mut changed = false;
        for layer in layers.into_iter().rev() {
            changed |= self.stack.remove_layer(layer);
        }
        changed
    }

    /// Forget every held control, dropping the layers they hold.
    fn drop_held(&mut self) {
        let layers: Vec<LayerId> = self.held.drain().flat_map(|(_, held)| held.layers).collect();
        if self.remove_layers(layers) {
            debug!("Hold layers dropped, stack depth {}", self.stack.depth());
        }
        self.hotkeys.clear();
        self.residual = (0.0, 0.0);
    }

    /// Apply one action on press. Returns the stack entry a `hold` pushed.
    fn apply_press(&mut self, action: &Action, now: Instant) -> Option<LayerId> {
        match action {
            Action::Key(_) | Action::MouseButton(_) | Action::GamepadButton(_) => {
                if let Some(code) = action.output_code() {
                    self.press(code);
                }
            }
            // Driven from the tick
            Action::MouseMove { .. } | Action::GamepadAxis(_) => {}
            Action::SwitchProfile(name) | Action::HoldProfile(name) => {
                let pushed = match self.stack.push_named(name) {
                    Ok(layer) => Some(layer),
                    Err(e) => {
                        warn!("{}; falling back to root profile", e);
                        self.stack.reset();
                        None
                    }
                };
                self.stack_changed();
                if matches!(action, Action::HoldProfile(_)) {
                    return pushed;
                }
            }
            Action::PopProfile => {
                if self.stack.pop().is_some() {
                    self.stack_changed();
                }
            }
            Action::Quit => self.request_quit(TerminationReason::QuitRequested, now),
        }
        None
    }

    fn apply_release(&mut self, action: &Action) {
        match action {
            Action::Key(_) | Action::MouseButton(_) | Action::GamepadButton(_) => {
                if let Some(code) = action.output_code() {
                    self.release(code);
                }
            }
            // Hold layers are removed by handle once all actions are undone
            _ => {}
        }
    }

    /// Keep only what held controls still assert under the new stack, and
    /// force-release the rest.
    fn stack_changed(&mut self) {
        let mut retained = Retained::none();
        for (control, held) in self.held.iter_mut() {
            let current = self.stack.effective_action(control);
            held.actions.retain(|action| {
                matches!(action, Action::HoldProfile(_)) || current.contains(action)
            });
            for action in &held.actions {
                if let Some(code) = action.output_code() {
                    retained.codes.insert(code);
                }
                if let Action::GamepadAxis(axis) = action {
                    retained.axes.insert(*axis);
                }
            }
        }

        debug!(
            "Profile stack now {:?}, retaining {} output(s)",
            self.stack
                .entries()
                .iter()
                .map(|id| self.stack.registry().get(*id).name.as_str())
                .collect::<Vec<_>>(),
            retained.codes.len()
        );
        if let Err(e) = self.emitter.force_release_all(&retained) {
            warn!("Failed to release outputs after profile change: {}", e);
        }
        self.hotkeys.rearm(&self.held, &self.stack);
    }

    fn request_quit(&mut self, reason: TerminationReason, now: Instant) {
        if self.state != TranslatorState::Running {
            return;
        }
        info!("Quit requested ({:?})", reason);

        if reason == TerminationReason::QuitRequested {
            if self.options.pc_quit {
                let alt = OutputCode::Key(KeyCode::LEFTALT);
                let f4 = OutputCode::Key(KeyCode::F4);
                self.press(alt);
                self.press(f4);
                self.release(f4);
                self.release(alt);
            }

            if let Some(target) = self.options.quit_target.as_deref() {
                match self.terminator.terminate(target) {
                    Ok(true) => info!("✓ Terminated '{}'", target),
                    Ok(false) => info!("'{}' was not running", target),
                    Err(e) => warn!("Failed to terminate '{}': {}", target, e),
                }
            }
        }

        self.drop_held();
        if let Err(e) = self.emitter.force_release_all(&Retained::none()) {
            warn!("Failed to release outputs on quit: {}", e);
        }

        self.reason = Some(reason);
        self.state = TranslatorState::Suspended { since: now };
    }

    fn run_repeats(&mut self, now: Instant) {
        let rate = self.options.repeat_rate;
        let mut due = Vec::new();
        for held in self.held.values_mut() {
            if let Some(at) = held.next_repeat {
                if now >= at {
                    held.next_repeat = Some(now + rate);
                    due.extend(held.actions.iter().filter_map(Action::output_code));
                }
            }
        }

        for code in due {
            trace!("Repeat {}", code);
            self.release(code);
            self.press(code);
        }
    }

    fn move_pointer(&mut self) {
        let sensitivity = self.stack.sensitivity();
        let (mut dx, mut dy) = self.residual;
        let mut moving = false;

        for held in self.held.values() {
            for action in &held.actions {
                if let Action::MouseMove { direction, scale } = action {
                    let (ux, uy) = direction.unit();
                    let step = held.magnitude * scale * sensitivity;
                    dx += ux * step;
                    dy += uy * step;
                    moving = true;
                }
            }
        }

        if !moving {
            self.residual = (0.0, 0.0);
            return;
        }

        let (ix, iy) = (dx.trunc(), dy.trunc());
        self.residual = (dx - ix, dy - iy);
        if let Err(e) = self.emitter.move_relative(ix as i32, iy as i32) {
            write_failed("move pointer", &e);
        }
    }

    /// Write the deflection held controls assert on each gamepad axis and
    /// center the rest.
    fn sync_axes(&mut self) {
        let sensitivity = self.stack.sensitivity();
        let mut targets: HashMap<GamepadAxis, f32> = HashMap::new();
        for (control, held) in &self.held {
            for action in &held.actions {
                if let Action::GamepadAxis(axis) = action {
                    *targets.entry(*axis).or_insert(0.0) += control.sign() * held.magnitude * sensitivity;
                }
            }
        }

        for axis in GamepadAxis::ALL {
            let value = targets
                .get(&axis)
                .map(|deflection| axis.scale(*deflection))
                .unwrap_or_else(|| axis.center());
            if let Err(e) = self.emitter.set_axis(axis, value) {
                write_failed(&format!("set axis {}", axis.name()), &e);
            }
        }
    }

    fn press(&mut self, code: OutputCode) {
        if let Err(e) = self.emitter.press(code) {
            write_failed(&format!("press '{}'", code), &e);
        }
    }

    fn release(&mut self, code: OutputCode) {
        if let Err(e) = self.emitter.release(code) {
            write_failed(&format!("release '{}'", code), &e);
        }
    }
}

/// Outputs the device lacks are reported once at startup, so they stay quiet here
fn write_failed(what: &str, e: &BackendError) {
    match e {
        BackendError::Unsupported(..) => debug!("Skipped {}: {}", what, e),
        _ => warn!("Failed to {}: {}", what, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceEvent, DeviceKind, MockDevice};
    use crate::mapping::control::{Button, HatDirection};
    use crate::mapping::registry::ProfileRegistry;
    use std::io;

    struct NeverFound;

    impl ProcessTerminator for NeverFound {
        fn terminate(&mut self, _name: &str) -> io::Result<bool> {
            Ok(false)
        }
    }

    const CONFIG: &str = r#"
[settings]
repeat_delay_ms = 100
repeat_rate_ms = 20

[[profiles]]
name = "root"
deadzone = 0.25
repeat = ["down"]

[profiles.controls]
a = "enter"
b = ["ctrl", "c"]
x = "push menu"
l1 = "hold fn"
r1 = "push nowhere"
down = "down"
left_analog = "mouse_movement:10"
r2 = "pad_rt"
right_analog_left = "pad_rx"
right_analog_right = "pad_rx"

[[profiles]]
name = "menu"

[profiles.controls]
a = "space"
y = "pop"

[[profiles]]
name = "fn"
parent = "root"

[profiles.controls]
b = "ctrl"
"#;

    fn translator() -> (EventTranslator<MockDevice>, MockDevice) {
        let registry = ProfileRegistry::load(CONFIG).unwrap();
        let options = TranslatorOptions::from_settings(registry.settings());
        let device = MockDevice::new();
        let translator = EventTranslator::new(
            ProfileStack::with_default(registry),
            OutputEmitter::new(device.clone()),
            Box::new(NeverFound),
            options,
        );
        (translator, device)
    }

    fn key(code: KeyCode) -> OutputCode {
        OutputCode::Key(code)
    }

    #[test]
    fn test_combo_released_in_reverse() {
        let (mut t, device) = translator();
        let now = Instant::now();
        let ctrl = key(KeyCode::LEFTCTRL);
        let c = key(KeyCode(46));

        t.process_event(&ControllerEvent::ButtonPressed(Button::B), now);
        t.process_event(&ControllerEvent::ButtonReleased(Button::B), now);

        assert_eq!(
            device.events(),
            vec![
                DeviceEvent::Press(ctrl),
                DeviceEvent::Press(c),
                DeviceEvent::Release(c),
                DeviceEvent::Release(ctrl),
            ]
        );
    }

    #[test]
    fn test_switch_releases_stale_outputs() {
        let (mut t, device) = translator();
        let now = Instant::now();

        t.process_event(&ControllerEvent::ButtonPressed(Button::A), now);
        t.process_event(&ControllerEvent::ButtonPressed(Button::X), now);
        assert_eq!(t.stack().top_profile().name, "menu");
        // menu maps A to space, so the held enter is no longer asserted
        assert!(!t.emitter().is_down(key(KeyCode::ENTER)));

        device.take_events();
        t.process_event(&ControllerEvent::ButtonReleased(Button::A), now);
        assert!(device.events().is_empty());
    }

    #[test]
    fn test_hold_profile_pops_on_release() {
        let (mut t, device) = translator();
        let now = Instant::now();
        let ctrl = key(KeyCode::LEFTCTRL);

        t.process_event(&ControllerEvent::ButtonPressed(Button::B), now);
        t.process_event(&ControllerEvent::ButtonPressed(Button::L1), now);
        assert_eq!(t.stack().top_profile().name, "fn");
        // ctrl is still asserted by B under fn; c is not
        assert!(t.emitter().is_down(ctrl));
        assert!(!t.emitter().is_down(key(KeyCode(46))));

        t.process_event(&ControllerEvent::ButtonReleased(Button::L1), now);
        assert_eq!(t.stack().depth(), 1);

        device.take_events();
        t.process_event(&ControllerEvent::ButtonReleased(Button::B), now);
        assert_eq!(device.events(), vec![DeviceEvent::Release(ctrl)]);
    }

    #[test]
    fn test_unknown_switch_target_resets_to_root() {
        let (mut t, _device) = translator();
        let now = Instant::now();

        t.process_event(&ControllerEvent::ButtonPressed(Button::X), now);
        t.process_event(&ControllerEvent::ButtonReleased(Button::X), now);
        assert_eq!(t.stack().depth(), 2);

        // menu does not map r1; root's "push nowhere" resolves and fails
        t.process_event(&ControllerEvent::ButtonPressed(Button::R1), now);
        assert_eq!(t.stack().depth(), 1);
        assert!(t.is_running());
    }

    #[test]
    fn test_deadzone_and_pointer_motion() {
        let (mut t, device) = translator();
        let now = Instant::now();

        // Below the 0.25 deadzone: nothing
        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftX, value: 0.125 }, now);
        t.tick(now);
        assert!(device.events().is_empty());

        // (0.625 - 0.25) / 0.75 = 0.5 -> 5 px per tick
        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftX, value: 0.625 }, now);
        t.tick(now);
        t.tick(now);
        assert_eq!(
            device.take_events(),
            vec![DeviceEvent::Move { dx: 5, dy: 0 }, DeviceEvent::Move { dx: 5, dy: 0 }]
        );

        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftX, value: -0.125 }, now);
        t.tick(now);
        assert!(device.events().is_empty());
        assert!(!t.is_held(&ControlId::AxisPositive(Axis::LeftX)));
    }

    #[test]
    fn test_subpixel_motion_accumulates() {
        let (mut t, device) = translator();
        let now = Instant::now();

        // (0.296875 - 0.25) / 0.75 = 0.0625 -> 0.625 px per tick
        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftY, value: 0.296875 }, now);
        t.tick(now);
        assert!(device.events().is_empty());
        t.tick(now);
        assert_eq!(device.events(), vec![DeviceEvent::Move { dx: 0, dy: 1 }]);
    }

    #[test]
    fn test_gamepad_axes_follow_deflection() {
        let (mut t, device) = translator();
        let now = Instant::now();

        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::R2, value: 1.0 }, now);
        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::RightX, value: -1.0 }, now);
        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::R2, value: 0.0 }, now);

        assert_eq!(
            device.events(),
            vec![
                DeviceEvent::Axis { axis: GamepadAxis::RightTrigger, value: 255 },
                DeviceEvent::Axis { axis: GamepadAxis::RightX, value: -32768 },
                DeviceEvent::Axis { axis: GamepadAxis::RightTrigger, value: 0 },
            ]
        );
    }

    #[test]
    fn test_auto_repeat_pulses_after_delay() {
        let (mut t, device) = translator();
        let start = Instant::now();
        let down = key(KeyCode::DOWN);

        t.process_event(&ControllerEvent::HatPressed(0, HatDirection::Down), start);
        t.tick(start + Duration::from_millis(50));
        assert_eq!(device.take_events(), vec![DeviceEvent::Press(down)]);

        t.tick(start + Duration::from_millis(100));
        t.tick(start + Duration::from_millis(110));
        t.tick(start + Duration::from_millis(120));
        assert_eq!(
            device.take_events(),
            vec![
                DeviceEvent::Release(down),
                DeviceEvent::Press(down),
                DeviceEvent::Release(down),
                DeviceEvent::Press(down),
            ]
        );

        t.process_event(&ControllerEvent::HatReleased(0, HatDirection::Down), start);
        assert_eq!(device.events(), vec![DeviceEvent::Release(down)]);
    }

    #[test]
    fn test_disconnect_releases_everything() {
        let (mut t, device) = translator();
        let now = Instant::now();

        t.process_event(&ControllerEvent::ButtonPressed(Button::A), now);
        t.process_event(&ControllerEvent::Disconnected, now);

        assert!(!t.is_held(&ControlId::Button(Button::A)));
        assert_eq!(t.emitter().held().count(), 0);
        assert_eq!(device.events().last(), Some(&DeviceEvent::Release(key(KeyCode::ENTER))));
    }

    #[test]
    fn test_device_failures_escalate() {
        let (mut t, device) = translator();
        let now = Instant::now();

        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftX, value: 1.0 }, now);
        device.set_failing(true);
        for _ in 0..MAX_WRITE_FAILURES {
            t.tick(now);
        }
        assert!(t.is_running());
        t.tick(now);

        assert!(matches!(t.state(), TranslatorState::Suspended { .. }));
        assert_eq!(t.termination_reason(), Some(TerminationReason::DeviceLost));
    }

    #[test]
    fn test_unsupported_output_does_not_end_session() {
        let registry = ProfileRegistry::load(CONFIG).unwrap();
        let options = TranslatorOptions::from_settings(registry.settings());
        let device = MockDevice::with_kind(DeviceKind::KeyboardMouse);
        let mut t = EventTranslator::new(
            ProfileStack::with_default(registry),
            OutputEmitter::new(device.clone()),
            Box::new(NeverFound),
            options,
        );
        let now = Instant::now();

        // right_analog_left drives pad_rx, which a keyboard/mouse device lacks
        t.process_event(&ControllerEvent::AxisMoved { axis: Axis::RightX, value: -1.0 }, now);
        for _ in 0..(MAX_WRITE_FAILURES * 3) {
            t.tick(now);
        }

        assert!(t.is_running());
        assert_eq!(t.emitter().consecutive_failures(), 0);
        t.process_event(&ControllerEvent::ButtonPressed(Button::A), now);
        assert_eq!(device.events(), vec![DeviceEvent::Press(key(KeyCode::ENTER))]);
    }

    #[test]
    fn test_shutdown_destroys_device() {
        let (mut t, device) = translator();
        t.process_event(&ControllerEvent::ButtonPressed(Button::A), Instant::now());
        t.shutdown().unwrap();

        assert!(device.is_destroyed());
        assert!(device.events().contains(&DeviceEvent::Release(key(KeyCode::ENTER))));
    }
}
