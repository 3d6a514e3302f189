//! pad2key: game controller to keyboard/mouse/gamepad mapper
//!
//! This library provides the layered profile engine that turns controller
//! events into synthesized keyboard, mouse or Xbox 360 pad events on Linux.

pub mod backend;
pub mod input;
pub mod keys;
pub mod manager;
pub mod mapping;
pub mod process;
pub mod startup;

// Re-export commonly used items
pub use backend::{MockDevice, OutputEmitter, VirtualDevice};
pub use input::{ControllerEvent, InputSource};
pub use manager::SessionManager;
pub use mapping::{Config, EventTranslator, ProfileRegistry, ProfileStack};
