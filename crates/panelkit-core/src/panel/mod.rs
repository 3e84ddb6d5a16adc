//! Collapsible panel transitions
//!
//! This module provides:
//! - The pure transition state machine
//! - The controller exposing toggles, events and completion signals
//! - Styling strategies the controller drives

mod controller;
pub mod machine;
mod styling;

pub use controller::{
    ChangeNotifier, PanelController, PlatformCapabilities, StaticCapabilities, ToggleCompletion,
};
pub use machine::{Effect, TransitionMachine};
pub use styling::{styling_for, ClassToggleStyling, TransitionStyling, TriggerStyling, ViewportStyle};
