//! Configuration loader and validator
//!
//! Loads profile definitions from TOML. This module only deals with the file
//! shape and value ranges; name resolution (controls, actions, parents) is
//! done when the registry is built from a [`Config`].

use crate::mapping::control::ControlId;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "PAD2KEY_CONFIG";

/// Built-in keyboard/mouse profiles
pub const DEFAULT_CONFIG: &str = include_str!("../../configs/default.toml");

/// Built-in controller passthrough for gamepad mode
pub const XBOX360_CONFIG: &str = include_str!("../../configs/xbox360.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Duplicate profile name '{0}'")]
    DuplicateProfile(String),

    #[error("Profile '{profile}' inherits from unknown profile '{parent}'")]
    UnknownParent { profile: String, parent: String },

    #[error("Cyclic inheritance: {0}")]
    CyclicInheritance(String),

    #[error("Unknown control '{control}' in profile '{profile}'")]
    UnknownControl { profile: String, control: String },

    #[error("Unknown action '{token}' for '{control}' in profile '{profile}'")]
    UnknownAction { profile: String, control: String, token: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Profile definitions, in declaration order
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Profile at the bottom of the stack; the first profile when unset
    #[serde(default)]
    pub default_profile: Option<String>,

    /// Modifier button of the built-in quit combo (`<hotkey>+start`)
    #[serde(default = "default_hotkey")]
    pub hotkey: String,

    /// Install the built-in quit combo on the root profile
    #[serde(default = "default_true")]
    pub builtin_quit: bool,

    /// Delay before a held `repeat` control starts repeating
    #[serde(default = "default_repeat_delay")]
    pub repeat_delay_ms: u64,

    /// Interval between repeats
    #[serde(default = "default_repeat_rate")]
    pub repeat_rate_ms: u64,

    /// Frame interval of the control loop
    #[serde(default = "default_tick")]
    pub tick_ms: u64,

    /// Grace delay between a quit request and termination
    #[serde(default = "default_quit_grace")]
    pub quit_grace_ms: u64,

    /// Pixels per tick at full deflection for `mouse_movement_*` without a scale
    #[serde(default = "default_mouse_scale")]
    pub mouse_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            hotkey: default_hotkey(),
            builtin_quit: true,
            repeat_delay_ms: default_repeat_delay(),
            repeat_rate_ms: default_repeat_rate(),
            tick_ms: default_tick(),
            quit_grace_ms: default_quit_grace(),
            mouse_scale: default_mouse_scale(),
        }
    }
}

fn default_hotkey() -> String { "back".to_string() }
fn default_true() -> bool { true }
fn default_repeat_delay() -> u64 { 500 }
fn default_repeat_rate() -> u64 { 50 }
fn default_tick() -> u64 { 16 }
fn default_quit_grace() -> u64 { 500 }
fn default_mouse_scale() -> f32 { 10.0 }

/// One profile as written in the file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Profile consulted for controls this one leaves unmapped
    #[serde(default)]
    pub parent: Option<String>,

    /// Axis deadzone in [0, 1); inherited when unset
    #[serde(default)]
    pub deadzone: Option<f32>,

    /// Axis sensitivity multiplier (> 0); inherited when unset
    #[serde(default)]
    pub sensitivity: Option<f32>,

    /// Control name -> action token(s)
    #[serde(default)]
    pub controls: BTreeMap<String, ActionValue>,

    #[serde(default)]
    pub hotkeys: Vec<HotkeyConfig>,

    /// Controls whose outputs auto-repeat while held
    #[serde(default)]
    pub repeat: Vec<String>,
}

/// A control's value: a single token or an ordered list of tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionValue {
    One(String),
    Many(Vec<String>),
}

impl ActionValue {
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            ActionValue::One(token) => vec![token.as_str()],
            ActionValue::Many(tokens) => tokens.iter().map(|t| t.as_str()).collect(),
        }
    }
}

/// A hotkey combination and the directive it fires
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub combo: Vec<String>,
    pub action: String,
}

impl Config {
    /// Parse configuration text and validate it
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;

        debug!("  - Profiles: {}", config.profiles.len());
        debug!("  - Default profile: {:?}", config.settings.default_profile);

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        info!("Loading configuration from: {}", path_ref.display());

        let content = std::fs::read_to_string(path_ref)?;
        let config = Self::parse(&content)?;

        info!("✓ Config parsed successfully");
        Ok(config)
    }

    /// Built-in keyboard/mouse configuration
    pub fn builtin_default() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_CONFIG)
    }

    /// Built-in gamepad passthrough configuration
    pub fn builtin_xbox360() -> Result<Self, ConfigError> {
        Self::parse(XBOX360_CONFIG)
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profiles.is_empty() {
            return Err(ConfigError::Invalid("At least one profile is required".into()));
        }

        if self.settings.repeat_rate_ms == 0 {
            return Err(ConfigError::Invalid("repeat_rate_ms must be positive".into()));
        }

        if self.settings.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be positive".into()));
        }

        if self.settings.mouse_scale <= 0.0 {
            return Err(ConfigError::Invalid("mouse_scale must be positive".into()));
        }

        if ControlId::from_name(&self.settings.hotkey).is_none() {
            return Err(ConfigError::Invalid(format!(
                "hotkey '{}' is not a known control",
                self.settings.hotkey
            )));
        }

        if let Some(ref default) = self.settings.default_profile {
            if !self.profiles.iter().any(|p| &p.name == default) {
                return Err(ConfigError::Invalid(format!(
                    "Default profile '{}' not found",
                    default
                )));
            }
        }

        for profile in &self.profiles {
            self.validate_profile(profile)?;
        }

        Ok(())
    }

    fn validate_profile(&self, profile: &ProfileConfig) -> Result<(), ConfigError> {
        if profile.name.trim().is_empty() {
            return Err(ConfigError::Invalid("Profile names must not be empty".into()));
        }

        if let Some(deadzone) = profile.deadzone {
            if !(0.0..1.0).contains(&deadzone) {
                return Err(ConfigError::Invalid(format!(
                    "profile '{}': deadzone must be in [0.0, 1.0)",
                    profile.name
                )));
            }
        }

        if let Some(sensitivity) = profile.sensitivity {
            if sensitivity <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "profile '{}': sensitivity must be positive",
                    profile.name
                )));
            }
        }

        for hotkey in &profile.hotkeys {
            if hotkey.combo.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "profile '{}': hotkey combo for '{}' is empty",
                    profile.name, hotkey.action
                )));
            }
        }

        Ok(())
    }
}

/// Where to look for a config file when none is given on the command line:
/// `$PAD2KEY_CONFIG`, then `<config dir>/pad2key/default.toml` if it exists.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let path = dirs::config_dir()?.join("pad2key").join("default.toml");
    path.exists().then_some(path)
}
