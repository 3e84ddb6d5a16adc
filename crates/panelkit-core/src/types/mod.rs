//! Core type definitions for PanelKit
//!
//! Shared types used by the resize multiplexer, the panel transition
//! controller and the hosts that compose them.

mod panel_types;
mod resize_types;

pub use panel_types::*;
pub use resize_types::*;
