//! Mapping module - resolves controller input to output actions

pub mod action;
pub mod config;
pub mod control;
pub mod executor;
pub mod hotkey;
pub mod profile;
pub mod registry;

pub use action::Action;
pub use config::{Config, ConfigError};
pub use control::ControlId;
pub use executor::{EventTranslator, TranslatorOptions, TranslatorState};
pub use profile::{ControlProfile, MappingTable, ProfileId};
pub use registry::{LayerId, ProfileNotFoundError, ProfileRegistry, ProfileStack};
