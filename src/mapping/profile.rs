//! Control profiles and their mapping tables

use crate::mapping::action::Action;
use crate::mapping::control::ControlId;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const DEFAULT_DEADZONE: f32 = 0.15;
pub const DEFAULT_SENSITIVITY: f32 = 1.0;

/// Index of a profile inside its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(pub(crate) usize);

/// Control -> ordered actions. Unmapped controls resolve to an empty slice.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<ControlId, Vec<Action>>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `control`; an empty action list leaves it unmapped.
    pub fn insert(&mut self, control: ControlId, actions: Vec<Action>) {
        if actions.is_empty() {
            self.entries.remove(&control);
        } else {
            self.entries.insert(control, actions);
        }
    }

    pub fn get(&self, control: &ControlId) -> &[Action] {
        self.entries.get(control).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, control: &ControlId) -> bool {
        self.entries.contains_key(control)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ControlId, &Vec<Action>)> {
        self.entries.iter()
    }
}

/// A set of controls that must all be held to fire `action`
#[derive(Debug, Clone, PartialEq)]
pub struct Hotkey {
    combo: Vec<ControlId>,
    action: Action,
}

impl Hotkey {
    /// Members are sorted and de-duplicated. Returns `None` for an empty combo.
    pub fn new(combo: impl IntoIterator<Item = ControlId>, action: Action) -> Option<Self> {
        let mut combo: Vec<ControlId> = combo.into_iter().collect();
        combo.sort();
        combo.dedup();
        if combo.is_empty() {
            return None;
        }
        Some(Self { combo, action })
    }

    pub fn combo(&self) -> &[ControlId] {
        &self.combo
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn len(&self) -> usize {
        self.combo.len()
    }

    /// True when every member is in `held`
    pub fn is_held<V>(&self, held: &HashMap<ControlId, V>) -> bool {
        self.combo.iter().all(|c| held.contains_key(c))
    }
}

/// A named, inheritable set of mappings. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ControlProfile {
    pub name: String,
    pub description: String,
    pub parent: Option<ProfileId>,
    pub mappings: MappingTable,
    /// Axis magnitude below which a stick half counts as neutral, in [0, 1)
    pub axis_deadzone: f32,
    /// Multiplier applied to post-deadzone magnitude, > 0
    pub axis_sensitivity: f32,
    /// In declaration order
    pub hotkeys: Vec<Hotkey>,
    /// Controls whose button outputs auto-repeat while held
    pub repeat: HashSet<ControlId>,
}

impl ControlProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parent: None,
            mappings: MappingTable::new(),
            axis_deadzone: DEFAULT_DEADZONE,
            axis_sensitivity: DEFAULT_SENSITIVITY,
            hotkeys: Vec::new(),
            repeat: HashSet::new(),
        }
    }

    /// Serializable view used by `--dump`
    pub(crate) fn summary(&self, parent: Option<&str>) -> ProfileSummary {
        let controls = self
            .mappings
            .iter()
            .map(|(control, actions)| {
                (control.to_string(), actions.iter().map(|a| a.to_string()).collect())
            })
            .collect();
        let hotkeys = self
            .hotkeys
            .iter()
            .map(|h| HotkeySummary {
                combo: h.combo.iter().map(|c| c.to_string()).collect(),
                action: h.action.to_string(),
            })
            .collect();
        let mut repeat: Vec<String> = self.repeat.iter().map(|c| c.to_string()).collect();
        repeat.sort();

        ProfileSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            parent: parent.map(str::to_string),
            deadzone: self.axis_deadzone,
            sensitivity: self.axis_sensitivity,
            controls,
            hotkeys,
            repeat,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileSummary {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    deadzone: f32,
    sensitivity: f32,
    controls: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hotkeys: Vec<HotkeySummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    repeat: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HotkeySummary {
    combo: Vec<String>,
    action: String,
}
