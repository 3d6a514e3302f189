//! Profile registry and the active profile stack
//!
//! The registry owns every [`ControlProfile`] parsed from the configuration
//! and resolves names to [`ProfileId`]s. The stack holds the active layers:
//! the root at index 0, pushed layers above it. Resolution walks the stack
//! from the top and consults each entry's parent chain before moving down.

use crate::backend::DeviceKind;
use crate::mapping::action::{Action, MouseDirection};
use crate::mapping::config::{ActionValue, Config, ConfigError, ProfileConfig, Settings};
use crate::mapping::control::{Axis, Button, ControlId};
use crate::mapping::profile::{
    ControlProfile, Hotkey, ProfileId, DEFAULT_DEADZONE, DEFAULT_SENSITIVITY,
};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Config value that expands a whole stick into pointer motion
const STICK_MOUSE: &str = "mouse_movement";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Profile '{0}' not found")]
pub struct ProfileNotFoundError(pub String);

/// All profiles known to the session
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<ControlProfile>,
    index: HashMap<String, ProfileId>,
    default: ProfileId,
    settings: Settings,
}

impl ProfileRegistry {
    /// Parse configuration text and build the registry
    pub fn load(source: &str) -> Result<Self, ConfigError> {
        Self::from_config(Config::parse(source)?)
    }

    /// Resolve names, tokens and inheritance of an already parsed config
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let Config { settings, profiles: raw } = config;

        let mut index = HashMap::new();
        for (i, profile) in raw.iter().enumerate() {
            if index.insert(profile.name.clone(), ProfileId(i)).is_some() {
                return Err(ConfigError::DuplicateProfile(profile.name.clone()));
            }
        }

        let mut parents = Vec::with_capacity(raw.len());
        for profile in &raw {
            let parent = match profile.parent {
                Some(ref name) => Some(*index.get(name).ok_or_else(|| {
                    ConfigError::UnknownParent {
                        profile: profile.name.clone(),
                        parent: name.clone(),
                    }
                })?),
                None => None,
            };
            parents.push(parent);
        }
        check_acyclic(&raw, &parents)?;

        let mut profiles = Vec::with_capacity(raw.len());
        for (i, config) in raw.iter().enumerate() {
            let mut profile = build_profile(config, settings.mouse_scale)?;
            profile.parent = parents[i];
            profile.axis_deadzone =
                inherited(&raw, &parents, i, |p| p.deadzone).unwrap_or(DEFAULT_DEADZONE);
            profile.axis_sensitivity =
                inherited(&raw, &parents, i, |p| p.sensitivity).unwrap_or(DEFAULT_SENSITIVITY);
            profiles.push(profile);
        }

        for profile in &profiles {
            let referenced = profile
                .mappings
                .iter()
                .flat_map(|(_, actions)| actions.iter())
                .chain(profile.hotkeys.iter().map(|h| h.action()))
                .filter_map(|a| a.profile_name());
            for name in referenced {
                if !index.contains_key(name) {
                    warn!("Profile '{}' refers to unknown profile '{}'", profile.name, name);
                }
            }
        }

        let default = match settings.default_profile {
            Some(ref name) => *index
                .get(name)
                .ok_or_else(|| ConfigError::Invalid(format!("Default profile '{}' not found", name)))?,
            None => ProfileId(0),
        };

        info!("✓ Loaded {} profile(s), default '{}'", profiles.len(), profiles[default.0].name);

        Ok(Self { profiles, index, default, settings })
    }

    pub fn resolve(&self, name: &str) -> Option<ProfileId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: ProfileId) -> &ControlProfile {
        &self.profiles[id.0]
    }

    pub fn default_profile(&self) -> ProfileId {
        self.default
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// `id` followed by its ancestors
    pub fn lineage(&self, id: ProfileId) -> impl Iterator<Item = ProfileId> + '_ {
        std::iter::successors(Some(id), move |id| self.profiles[id.0].parent)
    }

    /// Give `profile` the `{modifier, start} -> quit` combo.
    ///
    /// Returns false when the combo would collapse to a single button.
    pub fn install_quit_hotkey(&mut self, profile: ProfileId, modifier: ControlId) -> bool {
        let start = ControlId::Button(Button::Start);
        if modifier == start {
            warn!("Quit hotkey modifier cannot be 'start'; built-in quit disabled");
            return false;
        }
        match Hotkey::new([modifier, start], Action::Quit) {
            Some(hotkey) => {
                info!("Quit hotkey: {}+start on '{}'", modifier, self.profiles[profile.0].name);
                self.profiles[profile.0].hotkeys.push(hotkey);
                true
            }
            None => false,
        }
    }

    /// `(profile, control, action)` for every mapping `kind` cannot emit
    pub fn unsupported_by(&self, kind: DeviceKind) -> Vec<(&str, ControlId, &Action)> {
        let mut found = Vec::new();
        for profile in &self.profiles {
            for (control, actions) in profile.mappings.iter() {
                for action in actions {
                    if action.device_kind().is_some_and(|k| k != kind) {
                        found.push((profile.name.as_str(), *control, action));
                    }
                }
            }
        }
        found.sort_by_key(|(name, control, _)| (*name, *control));
        found
    }

    /// Pretty JSON rendering of every resolved profile
    pub fn dump(&self) -> Result<String, serde_json::Error> {
        let summaries: Vec<_> = self
            .profiles
            .iter()
            .map(|p| p.summary(p.parent.map(|id| self.profiles[id.0].name.as_str())))
            .collect();
        serde_json::to_string_pretty(&summaries)
    }
}

fn check_acyclic(raw: &[ProfileConfig], parents: &[Option<ProfileId>]) -> Result<(), ConfigError> {
    for start in 0..parents.len() {
        let mut chain = vec![start];
        let mut current = parents[start];
        while let Some(ProfileId(p)) = current {
            if p == start {
                let mut names: Vec<&str> = chain.iter().map(|i| raw[*i].name.as_str()).collect();
                names.push(raw[start].name.as_str());
                return Err(ConfigError::CyclicInheritance(names.join(" -> ")));
            }
            if chain.contains(&p) {
                // Cycle not through `start`; reported when walking from a member
                break;
            }
            chain.push(p);
            current = parents[p];
        }
    }
    Ok(())
}

/// First value set along the parent chain of profile `i`
fn inherited<T>(
    raw: &[ProfileConfig],
    parents: &[Option<ProfileId>],
    i: usize,
    field: impl Fn(&ProfileConfig) -> Option<T>,
) -> Option<T> {
    std::iter::successors(Some(i), |i| parents[*i].map(|p| p.0)).find_map(|i| field(&raw[i]))
}

fn build_profile(config: &ProfileConfig, mouse_scale: f32) -> Result<ControlProfile, ConfigError> {
    let mut profile = ControlProfile::new(config.name.clone());
    profile.description = config.description.clone();

    // Stick shorthands first so explicit half bindings override them
    let (shorthands, controls): (Vec<_>, Vec<_>) = config
        .controls
        .iter()
        .partition(|(name, _)| stick_axes(name).is_some());

    for (name, value) in shorthands {
        let (x, y) = stick_axes(name).unwrap_or((Axis::LeftX, Axis::LeftY));
        let scale = stick_mouse_scale(value, mouse_scale).ok_or_else(|| ConfigError::UnknownAction {
            profile: config.name.clone(),
            control: name.clone(),
            token: value.tokens().join(" "),
        })?;
        let halves = [
            (ControlId::AxisNegative(y), MouseDirection::Up),
            (ControlId::AxisPositive(y), MouseDirection::Down),
            (ControlId::AxisNegative(x), MouseDirection::Left),
            (ControlId::AxisPositive(x), MouseDirection::Right),
        ];
        for (control, direction) in halves {
            profile.mappings.insert(control, vec![Action::MouseMove { direction, scale }]);
        }
    }

    for (name, value) in controls {
        let control = ControlId::from_name(name).ok_or_else(|| ConfigError::UnknownControl {
            profile: config.name.clone(),
            control: name.clone(),
        })?;

        let mut actions = Vec::new();
        for token in value.tokens() {
            let parsed = Action::parse_value(token, mouse_scale).map_err(|token| {
                ConfigError::UnknownAction {
                    profile: config.name.clone(),
                    control: name.clone(),
                    token,
                }
            })?;
            actions.extend(parsed);
        }
        if actions.is_empty() {
            warn!("Profile '{}': control '{}' has no actions", config.name, name);
        }
        debug!("  {}.{} -> {:?}", config.name, control, actions);
        profile.mappings.insert(control, actions);
    }

    for hotkey in &config.hotkeys {
        let mut combo = Vec::with_capacity(hotkey.combo.len());
        for name in &hotkey.combo {
            combo.push(ControlId::from_name(name).ok_or_else(|| ConfigError::UnknownControl {
                profile: config.name.clone(),
                control: name.clone(),
            })?);
        }

        let label = hotkey.combo.join("+");
        let action = match Action::parse_value(&hotkey.action, mouse_scale) {
            Ok(mut actions) if actions.len() == 1 && actions[0].is_directive() => actions.remove(0),
            Ok(_) => {
                return Err(ConfigError::Invalid(format!(
                    "profile '{}': hotkey {} must fire push, hold, pop or quit (got '{}')",
                    config.name, label, hotkey.action
                )))
            }
            Err(token) => {
                return Err(ConfigError::UnknownAction {
                    profile: config.name.clone(),
                    control: label,
                    token,
                })
            }
        };

        let hotkey = Hotkey::new(combo, action).ok_or_else(|| {
            ConfigError::Invalid(format!("profile '{}': empty hotkey combo", config.name))
        })?;
        profile.hotkeys.push(hotkey);
    }

    for name in &config.repeat {
        let control = ControlId::from_name(name).ok_or_else(|| ConfigError::UnknownControl {
            profile: config.name.clone(),
            control: name.clone(),
        })?;
        profile.repeat.insert(control);
    }

    Ok(profile)
}

fn stick_axes(name: &str) -> Option<(Axis, Axis)> {
    match name.trim().to_ascii_lowercase().as_str() {
        "left_analog" => Some((Axis::LeftX, Axis::LeftY)),
        "right_analog" => Some((Axis::RightX, Axis::RightY)),
        _ => None,
    }
}

/// Accepts `mouse_movement` or `mouse_movement:<scale>`
fn stick_mouse_scale(value: &ActionValue, default_scale: f32) -> Option<f32> {
    let tokens = value.tokens();
    let [token] = tokens.as_slice() else {
        return None;
    };
    match token.trim().split_once(':') {
        None if token.trim() == STICK_MOUSE => Some(default_scale),
        Some((name, scale)) if name.trim() == STICK_MOUSE => {
            scale.trim().parse::<f32>().ok().filter(|s| *s > 0.0)
        }
        _ => None,
    }
}

/// Handle of one pushed stack entry, unique for the life of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

/// The active profile layers, root at the bottom
#[derive(Debug, Clone)]
pub struct ProfileStack {
    registry: ProfileRegistry,
    entries: Vec<ProfileId>,
    /// Parallel to `entries`
    layers: Vec<LayerId>,
    next_layer: u64,
}

impl ProfileStack {
    pub fn new(registry: ProfileRegistry, root: ProfileId) -> Self {
        Self { registry, entries: vec![root], layers: vec![LayerId(0)], next_layer: 1 }
    }

    /// Stack rooted at the registry's default profile
    pub fn with_default(registry: ProfileRegistry) -> Self {
        let root = registry.default_profile();
        Self::new(registry, root)
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn root(&self) -> ProfileId {
        self.entries[0]
    }

    pub fn top(&self) -> ProfileId {
        self.entries[self.entries.len() - 1]
    }

    pub fn top_profile(&self) -> &ControlProfile {
        self.registry.get(self.top())
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Entries bottom to top
    pub fn entries(&self) -> &[ProfileId] {
        &self.entries
    }

    pub fn push(&mut self, id: ProfileId) -> LayerId {
        let layer = LayerId(self.next_layer);
        self.next_layer += 1;
        self.entries.push(id);
        self.layers.push(layer);
        info!("Profile pushed: '{}' (depth {})", self.registry.get(id).name, self.depth());
        layer
    }

    pub fn push_named(&mut self, name: &str) -> Result<LayerId, ProfileNotFoundError> {
        let id = self
            .registry
            .resolve(name)
            .ok_or_else(|| ProfileNotFoundError(name.to_string()))?;
        Ok(self.push(id))
    }

    /// Remove the entry pushed as `layer`, wherever it sits. Entries above it
    /// stay. Returns false when that entry is already gone.
    pub fn remove_layer(&mut self, layer: LayerId) -> bool {
        let Some(index) = self.layers.iter().rposition(|l| *l == layer) else {
            return false;
        };
        if index == 0 {
            return false;
        }
        self.layers.remove(index);
        let id = self.entries.remove(index);
        info!(
            "Profile layer '{}' removed, now '{}' (depth {})",
            self.registry.get(id).name,
            self.top_profile().name,
            self.depth()
        );
        true
    }

    /// Remove the top entry. The root is never popped.
    pub fn pop(&mut self) -> Option<ProfileId> {
        if self.entries.len() <= 1 {
            info!("Profile stack already at root; pop ignored");
            return None;
        }
        self.layers.pop();
        let popped = self.entries.pop();
        info!("Profile popped, now '{}' (depth {})", self.top_profile().name, self.depth());
        popped
    }

    /// Truncate to the root
    pub fn reset(&mut self) {
        self.entries.truncate(1);
        self.layers.truncate(1);
        info!("Profile stack reset to '{}'", self.top_profile().name);
    }

    /// First profile, top down and through parent chains, that maps `control`
    pub fn resolve(&self, control: &ControlId) -> Option<(ProfileId, &[Action])> {
        self.entries
            .iter()
            .rev()
            .flat_map(|entry| self.registry.lineage(*entry))
            .find_map(|id| {
                let actions = self.registry.get(id).mappings.get(control);
                (!actions.is_empty()).then_some((id, actions))
            })
    }

    /// Actions bound to `control`; empty when nothing maps it
    pub fn effective_action(&self, control: &ControlId) -> &[Action] {
        self.resolve(control).map(|(_, actions)| actions).unwrap_or(&[])
    }

    /// Whether the profile that resolves `control` marks it for auto-repeat
    pub fn repeats(&self, control: &ControlId) -> bool {
        self.resolve(control)
            .map(|(id, _)| self.registry.get(id).repeat.contains(control))
            .unwrap_or(false)
    }

    /// Every reachable hotkey, top of stack first, each profile once
    pub fn hotkeys(&self) -> Vec<&Hotkey> {
        let mut visited = HashSet::new();
        let mut hotkeys = Vec::new();
        for entry in self.entries.iter().rev() {
            for id in self.registry.lineage(*entry) {
                if visited.insert(id) {
                    hotkeys.extend(self.registry.get(id).hotkeys.iter());
                }
            }
        }
        hotkeys
    }

    pub fn deadzone(&self) -> f32 {
        self.top_profile().axis_deadzone
    }

    pub fn sensitivity(&self) -> f32 {
        self.top_profile().axis_sensitivity
    }
}
