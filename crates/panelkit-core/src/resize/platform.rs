//! Platform seam for native resize watching
//!
//! The multiplexer never talks to a windowing system directly. Hosts hand it
//! a [`ResizeObserverFactory`] that creates one native watch per element and
//! pushes raw batches into the supplied [`ResizeSink`].

use super::multiplexer::ResizeSink;
use crate::types::{ElementId, ResizeBatch, ResizeEntry, Size};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A live platform-level watch on one element
pub trait NativeResizeWatch: Send {
    /// Stop watching. Called exactly once by the multiplexer.
    fn disconnect(&mut self);
}

/// Creates native resize watches
pub trait ResizeObserverFactory: Send + Sync {
    /// Start watching `element`, reporting batches through `sink`.
    ///
    /// Returns `None` when the platform has no resize-watch primitive.
    fn create(&self, element: ElementId, sink: ResizeSink) -> Option<Box<dyn NativeResizeWatch>>;
}

/// Factory for platforms without a resize-watch primitive
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedResizePlatform;

impl ResizeObserverFactory for UnsupportedResizePlatform {
    fn create(&self, _element: ElementId, _sink: ResizeSink) -> Option<Box<dyn NativeResizeWatch>> {
        None
    }
}

/// In-process platform whose notifications are raised by hand.
///
/// Used by headless hosts and tests to simulate an element changing size.
#[derive(Clone, Default)]
pub struct ManualResizePlatform {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    watches: HashMap<ElementId, ResizeSink>,
    last_sizes: HashMap<ElementId, Size>,
    created: usize,
    released: usize,
}

impl ManualResizePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a new size for `element`.
    ///
    /// Returns false when nothing is watching the element.
    pub fn fire(&self, element: ElementId, size: Size) -> bool {
        self.fire_batch(element, vec![ResizeEntry::new(element, size)])
    }

    /// Report a batch of entries for `element` in one callback
    pub fn fire_batch(&self, element: ElementId, batch: ResizeBatch) -> bool {
        let sink = {
            let mut state = self.inner.lock();
            if let Some(last) = batch.last() {
                state.last_sizes.insert(element, last.content_size);
            }
            state.watches.get(&element).cloned()
        };

        match sink {
            Some(sink) => {
                sink.emit(batch);
                true
            }
            None => false,
        }
    }

    /// Last size reported for `element`, watched or not
    pub fn last_size(&self, element: ElementId) -> Option<Size> {
        self.inner.lock().last_sizes.get(&element).copied()
    }

    /// Number of native watches ever created
    pub fn created_count(&self) -> usize {
        self.inner.lock().created
    }

    /// Number of native watches disconnected
    pub fn released_count(&self) -> usize {
        self.inner.lock().released
    }

    /// Number of native watches currently connected
    pub fn active_count(&self) -> usize {
        self.inner.lock().watches.len()
    }

    pub fn is_watching(&self, element: ElementId) -> bool {
        self.inner.lock().watches.contains_key(&element)
    }
}

impl ResizeObserverFactory for ManualResizePlatform {
    fn create(&self, element: ElementId, sink: ResizeSink) -> Option<Box<dyn NativeResizeWatch>> {
        let generation = sink.generation();
        let mut state = self.inner.lock();
        state.watches.insert(element, sink);
        state.created += 1;
        debug!("Manual platform watching {}", element);

        Some(Box::new(ManualWatch {
            element,
            generation,
            platform: Arc::clone(&self.inner),
            connected: true,
        }))
    }
}

struct ManualWatch {
    element: ElementId,
    generation: u64,
    platform: Arc<Mutex<ManualState>>,
    connected: bool,
}

impl NativeResizeWatch for ManualWatch {
    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;

        let mut state = self.platform.lock();
        let current = state.watches.get(&self.element).map(ResizeSink::generation);
        if current == Some(self.generation) {
            state.watches.remove(&self.element);
        }
        state.released += 1;
        debug!("Manual platform released {}", self.element);
    }
}
