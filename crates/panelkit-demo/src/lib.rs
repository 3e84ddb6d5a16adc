//! PanelKit demo host
//!
//! Headless composition of the core: a simulated styling engine animates a
//! side panel while the host keeps the content margins in sync.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────┐
//! │ Panel (256px / 68px) │ Content                              │
//! │                      │ margin-left follows the panel width  │
//! │  PanelController     │  ◄── PanelHost ◄── SizeObserver      │
//! │  SimulatedAnimator ──┼──► ManualResizePlatform              │
//! └──────────────────────┴──────────────────────────────────────┘
//! ```

pub mod animator;
pub mod app;

pub use animator::SimulatedAnimator;
pub use app::{config_path, run, DemoReport};
