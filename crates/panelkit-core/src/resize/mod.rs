//! Resize observation
//!
//! This module provides:
//! - A multiplexer that shares one native watch per element
//! - A per-consumer adapter with debounce and enable/disable
//! - The process-wide registry slot with explicit init and shutdown

mod adapter;
mod multiplexer;
pub mod platform;
mod shared;

pub use adapter::ObserveResize;
pub use multiplexer::{
    ResizeSink, ResizeStream, ResizeSubscription, SizeObserver, SubscriptionGuard,
    DEFAULT_CHANNEL_CAPACITY,
};
pub use platform::{
    ManualResizePlatform, NativeResizeWatch, ResizeObserverFactory, UnsupportedResizePlatform,
};
pub use shared::{init_shared, shared, shutdown_shared};
