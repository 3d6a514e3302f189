//! Command line and startup configuration
//!
//! Everything here is resolved once before the control loop starts.

use crate::backend::DeviceKind;
use crate::mapping::config::{default_config_path, Config, ConfigError};
use crate::mapping::control::ControlId;
use crate::mapping::executor::TranslatorOptions;
use crate::mapping::registry::{ProfileRegistry, ProfileStack};
use crate::process::KillMethod;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the quit modifier button
pub const HOTKEY_ENV: &str = "HOTKEY";

/// `PCKILLMODE=Y` sends alt+f4 on quit
pub const PC_QUIT_ENV: &str = "PCKILLMODE";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown hotkey '{0}'")]
pub struct UnknownHotkeyError(pub String);

#[derive(Debug, Parser)]
#[command(name = "pad2key", version)]
#[command(about = "Map game controller input to keyboard, mouse or a virtual Xbox 360 pad")]
pub struct Args {
    /// Profile file (default: $PAD2KEY_CONFIG or ~/.config/pad2key/default.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Emulate an Xbox 360 controller instead of keyboard and mouse
    #[arg(short = 'x', long = "xbox")]
    pub xbox: bool,

    /// Initial profile
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Modifier button of the quit combo (overrides $HOTKEY)
    #[arg(short = 'H', long)]
    pub hotkey: Option<String>,

    /// Send alt+f4 on quit
    #[arg(short = 'P', long = "pc-quit")]
    pub pc_quit: bool,

    /// Terminate the target with `killall -9` instead of `pkill`
    #[arg(short = 'X', long = "kill")]
    pub kill: bool,

    /// Print the resolved profiles as JSON and exit
    #[arg(short, long)]
    pub dump: bool,

    /// Process to terminate on quit
    pub target: Option<String>,
}

/// Resolved startup configuration
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub device: DeviceKind,
    pub config_path: Option<PathBuf>,
    pub profile: Option<String>,
    /// Quit modifier override, as given
    pub hotkey: Option<String>,
    pub pc_quit: bool,
    pub kill_method: KillMethod,
    pub dump: bool,
    pub target: Option<String>,
}

impl StartupConfig {
    pub fn from_args(args: Args) -> Self {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    /// Like [`from_args`](Self::from_args) with an explicit environment lookup
    pub fn from_args_with_env(args: Args, env: impl Fn(&str) -> Option<String>) -> Self {
        let hotkey = args.hotkey.or_else(|| env(HOTKEY_ENV)).filter(|h| !h.trim().is_empty());
        let pc_quit = args.pc_quit
            || env(PC_QUIT_ENV).is_some_and(|v| v.trim().eq_ignore_ascii_case("y"));

        Self {
            device: if args.xbox { DeviceKind::Gamepad } else { DeviceKind::KeyboardMouse },
            config_path: args.config,
            profile: args.profile,
            hotkey,
            pc_quit,
            kill_method: if args.kill { KillMethod::Killall } else { KillMethod::Pkill },
            dump: args.dump,
            target: args.target,
        }
    }

    /// Load the profile file.
    ///
    /// `--config` wins. Otherwise gamepad mode uses the built-in passthrough,
    /// and keyboard mode tries `$PAD2KEY_CONFIG`, the per-user file and
    /// finally the built-in profiles.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        if let Some(ref path) = self.config_path {
            return Config::load(path);
        }
        if self.device == DeviceKind::Gamepad {
            info!("Using built-in Xbox 360 passthrough profile");
            return Config::builtin_xbox360();
        }
        match default_config_path() {
            Some(path) => Config::load(path),
            None => {
                info!("Using built-in default profiles");
                Config::builtin_default()
            }
        }
    }

    /// Resolve the config into a profile stack rooted at the initial profile,
    /// with the built-in quit combo installed when enabled.
    pub fn build_stack(&self, config: Config) -> Result<ProfileStack, ConfigError> {
        let mut registry = ProfileRegistry::from_config(config)?;

        let root = match self.profile.as_deref() {
            Some(name) => registry.resolve(name).unwrap_or_else(|| {
                warn!("Profile '{}' not found, using '{}'", name, registry.get(registry.default_profile()).name);
                registry.default_profile()
            }),
            None => registry.default_profile(),
        };

        for (profile, control, action) in registry.unsupported_by(self.device) {
            warn!(
                "Profile '{}': {} -> {} cannot be emitted by a {} device",
                profile, control, action, self.device
            );
        }

        if registry.settings().builtin_quit {
            let modifier = match self.hotkey.as_deref().map(resolve_hotkey) {
                Some(Ok(control)) => Some(control),
                Some(Err(e)) => {
                    warn!("{}; using '{}'", e, registry.settings().hotkey);
                    None
                }
                None => None,
            };
            let modifier = match modifier {
                Some(control) => control,
                None => resolve_hotkey(&registry.settings().hotkey)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            };
            registry.install_quit_hotkey(root, modifier);
        }

        Ok(ProfileStack::new(registry, root))
    }

    pub fn translator_options(&self, stack: &ProfileStack) -> TranslatorOptions {
        TranslatorOptions {
            quit_target: self.target.clone(),
            pc_quit: self.pc_quit,
            ..TranslatorOptions::from_settings(stack.registry().settings())
        }
    }
}

/// Map a hotkey name to its control
pub fn resolve_hotkey(name: &str) -> Result<ControlId, UnknownHotkeyError> {
    ControlId::from_name(name).ok_or_else(|| UnknownHotkeyError(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::action::Action;
    use crate::mapping::control::Button;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("pad2key").chain(argv.iter().copied()))
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const CONFIG: &str = r#"
[settings]
hotkey = "guide"

[[profiles]]
name = "base"

[[profiles]]
name = "game"
"#;

    #[test]
    fn test_flags() {
        let startup = StartupConfig::from_args_with_env(
            args(&["-x", "-p", "game", "-H", "l1", "-P", "-X", "retroarch"]),
            no_env,
        );
        assert_eq!(startup.device, DeviceKind::Gamepad);
        assert_eq!(startup.profile.as_deref(), Some("game"));
        assert_eq!(startup.hotkey.as_deref(), Some("l1"));
        assert!(startup.pc_quit);
        assert_eq!(startup.kill_method, KillMethod::Killall);
        assert_eq!(startup.target.as_deref(), Some("retroarch"));
    }

    #[test]
    fn test_environment_fallbacks() {
        let env = |key: &str| match key {
            HOTKEY_ENV => Some("select".to_string()),
            PC_QUIT_ENV => Some("Y".to_string()),
            _ => None,
        };
        let startup = StartupConfig::from_args_with_env(args(&[]), env);
        assert_eq!(startup.hotkey.as_deref(), Some("select"));
        assert!(startup.pc_quit);
        assert_eq!(startup.device, DeviceKind::KeyboardMouse);

        let startup = StartupConfig::from_args_with_env(args(&["--hotkey", "l3"]), env);
        assert_eq!(startup.hotkey.as_deref(), Some("l3"));
    }

    #[test]
    fn test_stack_root_and_quit_combo() {
        let startup = StartupConfig {
            profile: Some("game".into()),
            hotkey: Some("r3".into()),
            ..StartupConfig::default()
        };
        let stack = startup.build_stack(Config::parse(CONFIG).unwrap()).unwrap();

        assert_eq!(stack.top_profile().name, "game");
        let hotkeys = stack.hotkeys();
        assert_eq!(hotkeys.len(), 1);
        assert_eq!(hotkeys[0].action(), &Action::Quit);
        assert!(hotkeys[0].combo().contains(&ControlId::Button(Button::R3)));
    }

    #[test]
    fn test_unknown_override_falls_back_to_setting() {
        let startup = StartupConfig {
            profile: Some("missing".into()),
            hotkey: Some("turbo".into()),
            ..StartupConfig::default()
        };
        let stack = startup.build_stack(Config::parse(CONFIG).unwrap()).unwrap();

        assert_eq!(stack.top_profile().name, "base");
        assert!(stack.hotkeys()[0].combo().contains(&ControlId::Button(Button::Guide)));
        assert_eq!(resolve_hotkey("turbo"), Err(UnknownHotkeyError("turbo".into())));
    }
}
