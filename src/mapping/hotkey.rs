//! Edge-triggered hotkey detection
//!
//! A combination fires once on the transition into "all members held" and
//! stays latched until one of its members is released.

use crate::mapping::action::Action;
use crate::mapping::control::ControlId;
use crate::mapping::registry::ProfileStack;
use log::debug;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct HotkeyDetector {
    latched: HashSet<Vec<ControlId>>,
}

impl HotkeyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluate after the held set changed.
    ///
    /// Returns the action of at most one newly completed combo: the longest
    /// one, ties going to the first in stack order. Every fully held combo is
    /// latched afterwards, whether it fired or not.
    pub fn update<V>(&mut self, held: &HashMap<ControlId, V>, stack: &ProfileStack) -> Option<Action> {
        self.release(held);

        let hotkeys = stack.hotkeys();
        let mut fired: Option<&Action> = None;
        let mut best_len = 0;
        for hotkey in hotkeys.iter().filter(|h| h.is_held(held)) {
            if !self.latched.contains(hotkey.combo()) && hotkey.len() > best_len {
                best_len = hotkey.len();
                fired = Some(hotkey.action());
            }
        }

        for hotkey in hotkeys.iter().filter(|h| h.is_held(held)) {
            self.latched.insert(hotkey.combo().to_vec());
        }

        if let Some(action) = fired {
            debug!("Hotkey fired: {}", action);
        }
        fired.cloned()
    }

    /// Drop the latch of every combo that lost a member. Never fires: a
    /// shrinking held set cannot complete a combo.
    pub fn release<V>(&mut self, held: &HashMap<ControlId, V>) {
        self.latched.retain(|combo| combo.iter().all(|c| held.contains_key(c)));
    }

    /// Latch every combo already fully held under `stack` without firing it.
    ///
    /// Run after the stack changes so combos of a newly reachable profile
    /// need a fresh press.
    pub fn rearm<V>(&mut self, held: &HashMap<ControlId, V>, stack: &ProfileStack) {
        self.release(held);
        for hotkey in stack.hotkeys().into_iter().filter(|h| h.is_held(held)) {
            if self.latched.insert(hotkey.combo().to_vec()) {
                debug!("Hotkey {:?} already held, latched", hotkey.combo());
            }
        }
    }

    /// Whether any latched combo includes `control`
    #[cfg(test)]
    pub fn is_latched(&self, control: &ControlId) -> bool {
        self.latched.iter().any(|combo| combo.contains(control))
    }

    pub fn clear(&mut self) {
        self.latched.clear();
    }
}
