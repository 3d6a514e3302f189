//! End-to-end behaviour of the profile stack, hotkeys and translator

use pad2key::backend::{DeviceEvent, GamepadAxis, MockDevice, OutputCode, OutputEmitter};
use pad2key::input::ControllerEvent;
use pad2key::keys::KeyCode;
use pad2key::mapping::action::Action;
use pad2key::mapping::control::{Axis, Button, ControlId, HatDirection};
use pad2key::mapping::executor::{TerminationReason, TranslatorOptions, TranslatorState};
use pad2key::mapping::{Config, EventTranslator, ProfileRegistry, ProfileStack};
use pad2key::process::ProcessTerminator;
use pad2key::startup::StartupConfig;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const CONFIG: &str = r#"
[settings]
default_profile = "root"
quit_grace_ms = 500

[[profiles]]
name = "root"

[profiles.controls]
a = "enter"
b = "esc"
x = "push menu"
y = "pop"
l1 = ["leftshift", "tab"]
r3 = "f"
r2 = "pad_rt"
left_analog = "mouse_movement:8"

[[profiles]]
name = "menu"
parent = "nav"
deadzone = 0.5

[profiles.controls]
b = "backspace"
l1 = "leftshift"

[[profiles.hotkeys]]
combo = ["start", "select"]
action = "quit"

[[profiles.hotkeys]]
combo = ["l3", "r3"]
action = "push nav"

[[profiles]]
name = "nav"

[profiles.controls]
up = "up"
down = "down"
"#;

#[derive(Clone, Default)]
struct RecordingTerminator {
    calls: Arc<Mutex<Vec<String>>>,
}

impl ProcessTerminator for RecordingTerminator {
    fn terminate(&mut self, name: &str) -> io::Result<bool> {
        self.calls.lock().unwrap().push(name.to_string());
        Ok(true)
    }
}

struct Fixture {
    translator: EventTranslator<MockDevice>,
    device: MockDevice,
    terminator: RecordingTerminator,
}

/// Translator over `[root]`, or `[root, menu]` with `in_menu`
fn fixture(in_menu: bool) -> Fixture {
    let registry = ProfileRegistry::load(CONFIG).unwrap();
    let menu = registry.resolve("menu").unwrap();
    let mut options = TranslatorOptions::from_settings(registry.settings());
    options.quit_target = Some("emulator".into());

    let mut stack = ProfileStack::with_default(registry);
    if in_menu {
        stack.push(menu);
    }

    let device = MockDevice::new();
    let terminator = RecordingTerminator::default();
    let translator = EventTranslator::new(
        stack,
        OutputEmitter::new(device.clone()),
        Box::new(terminator.clone()),
        options,
    );
    Fixture { translator, device, terminator }
}

fn translator_for(stack: ProfileStack) -> (EventTranslator<MockDevice>, MockDevice) {
    let options = TranslatorOptions::from_settings(stack.registry().settings());
    let device = MockDevice::new();
    let translator = EventTranslator::new(
        stack,
        OutputEmitter::new(device.clone()),
        Box::new(RecordingTerminator::default()),
        options,
    );
    (translator, device)
}

/// The shipped profiles, with the back+start quit combo installed
fn builtin() -> (EventTranslator<MockDevice>, MockDevice) {
    let stack = StartupConfig::default()
        .build_stack(Config::builtin_default().unwrap())
        .unwrap();
    translator_for(stack)
}

fn layered(config: &str) -> (EventTranslator<MockDevice>, MockDevice) {
    translator_for(ProfileStack::with_default(ProfileRegistry::load(config).unwrap()))
}

fn stack_names(translator: &EventTranslator<MockDevice>) -> Vec<String> {
    let stack = translator.stack();
    stack
        .entries()
        .iter()
        .map(|id| stack.registry().get(*id).name.clone())
        .collect()
}

fn press(button: Button) -> ControllerEvent {
    ControllerEvent::ButtonPressed(button)
}

fn release(button: Button) -> ControllerEvent {
    ControllerEvent::ButtonReleased(button)
}

fn key(code: KeyCode) -> OutputCode {
    OutputCode::Key(code)
}

#[test]
fn test_root_mapping_reached_through_menu() {
    let Fixture { mut translator, device, .. } = fixture(true);
    let now = Instant::now();

    translator.process_event(&press(Button::A), now);
    assert_eq!(device.take_events(), vec![DeviceEvent::Press(key(KeyCode::ENTER))]);

    translator.process_event(&release(Button::A), now);
    assert_eq!(device.take_events(), vec![DeviceEvent::Release(key(KeyCode::ENTER))]);
}

#[test]
fn test_quit_combo_runs_shutdown_sequence() {
    let Fixture { mut translator, device, terminator } = fixture(true);
    let start = Instant::now();

    translator.process_event(&press(Button::A), start);
    translator.process_event(&press(Button::Start), start);
    assert!(translator.is_running());
    translator.process_event(&press(Button::Back), start);

    assert!(matches!(translator.state(), TranslatorState::Suspended { .. }));
    assert_eq!(translator.termination_reason(), Some(TerminationReason::QuitRequested));
    assert_eq!(*terminator.calls.lock().unwrap(), vec!["emulator".to_string()]);
    assert!(!translator.emitter().is_down(key(KeyCode::ENTER)));

    // Suspended: input is ignored
    device.take_events();
    translator.process_event(&press(Button::B), start);
    translator.tick(start + Duration::from_millis(100));
    assert!(device.events().is_empty());
    assert!(!translator.is_terminated());

    translator.tick(start + Duration::from_millis(500));
    assert!(translator.is_terminated());
    assert_eq!(translator.emitter().force_release_count(), 1);
}

#[test]
fn test_hotkey_fires_once_across_events() {
    let Fixture { mut translator, .. } = fixture(true);
    let now = Instant::now();

    translator.process_event(&press(Button::L3), now);
    translator.process_event(&press(Button::R3), now);
    assert_eq!(translator.stack().depth(), 3);

    // Other input while the combo stays held does not re-fire it
    for _ in 0..5 {
        translator.process_event(&press(Button::A), now);
        translator.process_event(&release(Button::A), now);
        translator.process_event(&ControllerEvent::AxisMoved { axis: Axis::RightX, value: 0.9 }, now);
    }
    assert_eq!(translator.stack().depth(), 3);

    translator.process_event(&release(Button::R3), now);
    translator.process_event(&press(Button::R3), now);
    assert_eq!(translator.stack().depth(), 4);
}

#[test]
fn test_hotkey_consumes_completing_press() {
    let Fixture { mut translator, device, .. } = fixture(true);
    let now = Instant::now();

    // r3 maps to f, but completing l3+r3 consumes the press
    translator.process_event(&press(Button::L3), now);
    translator.process_event(&press(Button::R3), now);
    translator.process_event(&release(Button::R3), now);
    translator.process_event(&release(Button::L3), now);
    assert!(device.events().is_empty());

    translator.process_event(&press(Button::R3), now);
    assert_eq!(device.events(), vec![DeviceEvent::Press(key(KeyCode(33)))]);
}

#[test]
fn test_parent_chain_before_lower_stack_entries() {
    let Fixture { translator, .. } = fixture(true);
    let stack = translator.stack();

    // menu -> nav maps the d-pad
    assert_eq!(
        stack.effective_action(&ControlId::Hat(0, HatDirection::Up)),
        &[Action::Key(KeyCode::UP)]
    );
    // menu overrides root
    assert_eq!(
        stack.effective_action(&ControlId::Button(Button::L1)),
        &[Action::Key(KeyCode::LEFTSHIFT)]
    );
    // nothing maps guide
    assert!(stack.effective_action(&ControlId::Button(Button::Guide)).is_empty());
}

#[test]
fn test_stack_never_drops_below_root() {
    let Fixture { mut translator, .. } = fixture(false);
    let now = Instant::now();

    translator.process_event(&press(Button::X), now);
    translator.process_event(&release(Button::X), now);
    assert_eq!(translator.stack().depth(), 2);

    // menu does not map y; root's "pop" applies
    for _ in 0..10 {
        translator.process_event(&press(Button::Y), now);
        translator.process_event(&release(Button::Y), now);
    }
    assert_eq!(translator.stack().depth(), 1);
    assert_eq!(translator.stack().top_profile().name, "root");
}

#[test]
fn test_no_stuck_outputs_across_profile_changes() {
    let Fixture { mut translator, device, .. } = fixture(false);
    let now = Instant::now();

    translator.process_event(&press(Button::L1), now);
    translator.process_event(&press(Button::B), now);
    translator.process_event(&ControllerEvent::AxisMoved { axis: Axis::R2, value: 1.0 }, now);
    translator.process_event(&press(Button::X), now);

    // Under menu, l1 still asserts shift but not tab; b now means backspace;
    // r2 falls through to root and keeps the trigger deflected
    let emitter = translator.emitter();
    assert!(emitter.is_down(key(KeyCode::LEFTSHIFT)));
    assert!(!emitter.is_down(key(KeyCode(15))));
    assert!(!emitter.is_down(key(KeyCode::ESC)));
    assert!(!emitter.is_down(key(KeyCode(14))));
    assert_eq!(emitter.axis_value(GamepadAxis::RightTrigger), 255);

    for button in [Button::X, Button::B, Button::L1] {
        translator.process_event(&release(button), now);
    }
    translator.process_event(&press(Button::Y), now);
    translator.process_event(&release(Button::Y), now);

    assert_eq!(translator.emitter().held().count(), 0);
    let downs = device.events().iter().filter(|e| matches!(e, DeviceEvent::Press(_))).count();
    let ups = device.events().iter().filter(|e| matches!(e, DeviceEvent::Release(_))).count();
    assert_eq!(downs, ups);
}

#[test]
fn test_deadzone_clamp_releases_axis_hold() {
    let Fixture { mut translator, device, .. } = fixture(false);
    let now = Instant::now();

    translator.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftX, value: -1.0 }, now);
    translator.tick(now);
    assert_eq!(device.take_events(), vec![DeviceEvent::Move { dx: -8, dy: 0 }]);

    // root deadzone is the 0.15 default
    translator.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftX, value: -0.125 }, now);
    for _ in 0..3 {
        translator.tick(now);
    }
    assert!(device.events().is_empty());
    assert!(!translator.is_held(&ControlId::AxisNegative(Axis::LeftX)));
}

#[test]
fn test_top_profile_deadzone_applies() {
    let Fixture { mut translator, device, .. } = fixture(true);
    let now = Instant::now();

    // menu raises the deadzone to 0.5
    translator.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftY, value: 0.375 }, now);
    translator.tick(now);
    assert!(device.events().is_empty());

    translator.process_event(&ControllerEvent::AxisMoved { axis: Axis::LeftY, value: 0.75 }, now);
    translator.tick(now);
    assert_eq!(device.events(), vec![DeviceEvent::Move { dx: 0, dy: 4 }]);
}

#[test]
fn test_hold_release_removes_its_own_layer() {
    let (mut translator, _device) = builtin();
    let now = Instant::now();

    translator.process_event(&press(Button::Guide), now);
    translator.process_event(&press(Button::Back), now);
    translator.process_event(&press(Button::L1), now);
    assert_eq!(stack_names(&translator), ["default", "edit", "keyboard"]);

    // keyboard was pushed above the held layer and stays
    translator.process_event(&release(Button::Guide), now);
    assert_eq!(stack_names(&translator), ["default", "keyboard"]);

    for button in [Button::L1, Button::Back] {
        translator.process_event(&release(button), now);
    }
    assert_eq!(stack_names(&translator), ["default", "keyboard"]);
}

#[test]
fn test_disconnect_drops_held_layers() {
    let (mut translator, device) = builtin();
    let now = Instant::now();

    translator.process_event(&press(Button::Guide), now);
    translator.process_event(&press(Button::A), now);
    assert_eq!(stack_names(&translator), ["default", "edit"]);
    assert!(translator.emitter().is_down(key(KeyCode::LEFTCTRL)));

    translator.process_event(&ControllerEvent::Disconnected, now);
    translator.process_event(&ControllerEvent::Connected, now);

    assert_eq!(translator.stack().depth(), 1);
    assert_eq!(translator.emitter().held().count(), 0);
    let downs = device.events().iter().filter(|e| matches!(e, DeviceEvent::Press(_))).count();
    let ups = device.events().iter().filter(|e| matches!(e, DeviceEvent::Release(_))).count();
    assert_eq!(downs, ups);

    // The layer is gone for good: a fresh guide press pushes it once
    translator.process_event(&press(Button::Guide), now);
    translator.process_event(&release(Button::Guide), now);
    assert_eq!(translator.stack().depth(), 1);
}

#[test]
fn test_quit_drops_held_layers() {
    let (mut translator, _device) = builtin();
    let now = Instant::now();

    translator.process_event(&press(Button::Guide), now);
    translator.process_event(&press(Button::Back), now);
    translator.process_event(&press(Button::Start), now);

    assert_eq!(translator.termination_reason(), Some(TerminationReason::QuitRequested));
    assert_eq!(translator.stack().depth(), 1);
}

const COMBO_LAYERS: &str = r#"
[[profiles]]
name = "root"

[profiles.controls]
a = "enter"

[[profiles.hotkeys]]
combo = ["l1", "r1"]
action = "push menu"

[[profiles]]
name = "menu"

[[profiles.hotkeys]]
combo = ["r1"]
action = "pop"
"#;

#[test]
fn test_combo_of_new_layer_needs_fresh_press() {
    let (mut translator, device) = layered(COMBO_LAYERS);
    let now = Instant::now();

    translator.process_event(&press(Button::L1), now);
    translator.process_event(&press(Button::R1), now);
    assert_eq!(stack_names(&translator), ["root", "menu"]);

    // r1 was held before menu arrived, so menu's r1 combo stays quiet
    translator.process_event(&press(Button::A), now);
    translator.process_event(&release(Button::A), now);
    assert_eq!(stack_names(&translator), ["root", "menu"]);
    assert_eq!(
        device.events(),
        vec![DeviceEvent::Press(key(KeyCode::ENTER)), DeviceEvent::Release(key(KeyCode::ENTER))]
    );

    for button in [Button::R1, Button::L1] {
        translator.process_event(&release(button), now);
    }
    assert_eq!(stack_names(&translator), ["root", "menu"]);
    translator.process_event(&press(Button::R1), now);
    assert_eq!(stack_names(&translator), ["root"]);
}

#[test]
fn test_hold_fired_by_combo_pops_with_completing_control() {
    let config = r#"
[[profiles]]
name = "root"

[[profiles.hotkeys]]
combo = ["l1", "r1"]
action = "hold menu"

[[profiles]]
name = "menu"
"#;
    let (mut translator, _device) = layered(config);
    let now = Instant::now();

    translator.process_event(&press(Button::L1), now);
    translator.process_event(&press(Button::R1), now);
    assert_eq!(stack_names(&translator), ["root", "menu"]);

    translator.process_event(&release(Button::L1), now);
    assert_eq!(stack_names(&translator), ["root", "menu"]);
    translator.process_event(&release(Button::R1), now);
    assert_eq!(stack_names(&translator), ["root"]);
}
