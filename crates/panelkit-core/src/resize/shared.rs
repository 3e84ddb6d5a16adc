//! Process-wide resize registry
//!
//! The registry lives from [`init_shared`] until [`shutdown_shared`]; both
//! are called explicitly by the application at start and stop.

use super::multiplexer::SizeObserver;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

static SHARED: Lazy<Mutex<Option<Arc<SizeObserver>>>> = Lazy::new(|| Mutex::new(None));

/// Return the shared registry, creating it with `init` on first use
pub fn init_shared<F>(init: F) -> Arc<SizeObserver>
where
    F: FnOnce() -> SizeObserver,
{
    let mut slot = SHARED.lock();
    if let Some(existing) = slot.as_ref() {
        return Arc::clone(existing);
    }

    info!("Initializing shared resize registry");
    let observer = Arc::new(init());
    *slot = Some(Arc::clone(&observer));
    observer
}

/// The shared registry, if initialized
pub fn shared() -> Option<Arc<SizeObserver>> {
    SHARED.lock().clone()
}

/// Tear down the shared registry and clear the slot. Idempotent.
pub fn shutdown_shared() {
    let taken = SHARED.lock().take();
    if let Some(observer) = taken {
        observer.teardown();
        info!("Shared resize registry shut down");
    }
}
