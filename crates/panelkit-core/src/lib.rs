//! PanelKit Core Library
//!
//! This crate provides the core of a collapsible side panel, including:
//! - Resize observation shared across consumers, one native watch per element
//! - Per-consumer resize streams with debounce and enable/disable
//! - The collapse/expand transition controller and its styling strategies
//! - A host that keeps container margins in sync with the animating panel
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     panelkit-core                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  resize/       - Multiplexer, adapter, platform seam        │
//! │  panel/        - Transition machine, controller, styling    │
//! │  host.rs       - Margin recomputation driver                │
//! │  config.rs     - Panel configuration                        │
//! │  types/        - Shared type definitions                    │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod panel;
pub mod resize;
pub mod types;

// Re-export commonly used types
pub use error::{ConfigError, Error, Result};
pub use types::*;

pub use config::{PanelConfig, ResizeConfig, StylingKind};

pub use host::{MarginContainer, PanelHost};

pub use panel::{
    ChangeNotifier, PanelController, PlatformCapabilities, StaticCapabilities, ToggleCompletion,
    TransitionStyling, ViewportStyle,
};

pub use resize::{
    init_shared, shared, shutdown_shared, ManualResizePlatform, ObserveResize,
    ResizeObserverFactory, ResizeSubscription, SizeObserver, UnsupportedResizePlatform,
};
