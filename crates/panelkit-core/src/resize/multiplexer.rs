//! Resize multiplexer
//!
//! [`SizeObserver`] lets any number of consumers watch the same element
//! while only one native watch exists per element. Each registry entry is
//! reference counted; the native watch is released and the broadcast
//! channel closed when the last subscriber goes away.

use super::platform::{NativeResizeWatch, ResizeObserverFactory};
use crate::types::{ElementId, ResizeBatch};
use futures::stream::{self, Stream};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Default buffer size of each element's broadcast channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Process-wide registry of observed elements
pub struct SizeObserver {
    registry: Arc<Registry>,
}

struct Registry {
    factory: Arc<dyn ResizeObserverFactory>,
    elements: Mutex<HashMap<ElementId, ObservedElement>>,
    next_generation: AtomicU64,
    capacity: usize,
}

struct ObservedElement {
    generation: u64,
    refcount: usize,
    stream: broadcast::Sender<ResizeBatch>,
    native: Option<Box<dyn NativeResizeWatch>>,
}

impl ObservedElement {
    fn release(mut self, element: ElementId) {
        if let Some(mut native) = self.native.take() {
            native.disconnect();
        }
        // Dropping the sender closes every subscriber's stream.
        drop(self.stream);
        debug!("Released observed element {} (generation {})", element, self.generation);
    }
}

impl SizeObserver {
    pub fn new(factory: impl ResizeObserverFactory + 'static) -> Self {
        Self::with_capacity(Arc::new(factory), DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a registry with a custom per-element channel capacity
    pub fn with_capacity(factory: Arc<dyn ResizeObserverFactory>, capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                factory,
                elements: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Subscribe to size changes of `element`.
    ///
    /// Only notifications raised after this call are delivered. The native
    /// watch is created on the first subscription; when the platform has no
    /// resize primitive the subscription is valid but never fires.
    pub fn observe(&self, element: ElementId) -> ResizeSubscription {
        let (generation, receiver, created) = {
            let mut elements = self.registry.elements.lock();
            match elements.get_mut(&element) {
                Some(entry) => {
                    entry.refcount += 1;
                    (entry.generation, entry.stream.subscribe(), false)
                }
                None => {
                    let generation = self.registry.next_generation.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = broadcast::channel(self.registry.capacity);
                    elements.insert(
                        element,
                        ObservedElement {
                            generation,
                            refcount: 1,
                            stream: tx,
                            native: None,
                        },
                    );
                    (generation, rx, true)
                }
            }
        };

        // The factory runs outside the registry lock so a platform that
        // reports synchronously can re-enter the registry through its sink.
        if created {
            self.attach_native(element, generation);
        }

        ResizeSubscription {
            stream: ResizeStream {
                element,
                receiver: Some(receiver),
            },
            guard: SubscriptionGuard {
                element,
                generation,
                registry: Arc::downgrade(&self.registry),
                released: false,
            },
        }
    }

    fn attach_native(&self, element: ElementId, generation: u64) {
        let sink = ResizeSink {
            element,
            generation,
            registry: Arc::downgrade(&self.registry),
        };

        let Some(native) = self.registry.factory.create(element, sink) else {
            warn!("Resize watching unavailable, {} will never report", element);
            return;
        };

        let leftover = {
            let mut elements = self.registry.elements.lock();
            match elements.get_mut(&element) {
                Some(entry) if entry.generation == generation => {
                    entry.native = Some(native);
                    None
                }
                _ => Some(native),
            }
        };

        match leftover {
            None => info!("Started native resize watch on {}", element),
            Some(mut native) => {
                // Every subscriber left while the watch was being created.
                debug!("Observation of {} ended before its watch attached", element);
                native.disconnect();
            }
        }
    }

    /// Release every observed element regardless of refcount.
    ///
    /// Idempotent. Outstanding subscriptions see their streams end and
    /// their later unsubscribes become no-ops.
    pub fn teardown(&self) {
        self.registry.teardown();
    }

    /// Number of elements currently observed
    pub fn observed_count(&self) -> usize {
        self.registry.elements.lock().len()
    }

    /// Current subscriber count for `element`, zero when not observed
    pub fn refcount(&self, element: ElementId) -> usize {
        self.registry
            .elements
            .lock()
            .get(&element)
            .map(|e| e.refcount)
            .unwrap_or(0)
    }

    pub fn is_observing(&self, element: ElementId) -> bool {
        self.registry.elements.lock().contains_key(&element)
    }

    /// Whether a native watch backs the observation of `element`
    pub fn has_native_watch(&self, element: ElementId) -> bool {
        self.registry
            .elements
            .lock()
            .get(&element)
            .is_some_and(|e| e.native.is_some())
    }
}

impl Registry {
    fn release(&self, element: ElementId, generation: u64) {
        let removed = {
            let mut elements = self.elements.lock();
            let drained = match elements.get_mut(&element) {
                Some(entry) if entry.generation == generation => {
                    entry.refcount -= 1;
                    entry.refcount == 0
                }
                _ => false,
            };
            if drained {
                elements.remove(&element)
            } else {
                None
            }
        };

        if let Some(entry) = removed {
            entry.release(element);
        }
    }

    fn teardown(&self) {
        // Snapshot first: disconnecting may call back into the registry.
        let drained: Vec<_> = std::mem::take(&mut *self.elements.lock()).into_iter().collect();
        if drained.is_empty() {
            return;
        }

        info!("Tearing down {} observed elements", drained.len());
        for (element, entry) in drained {
            entry.release(element);
        }
    }

    fn publish(&self, element: ElementId, generation: u64, batch: ResizeBatch) {
        let sender = {
            let elements = self.elements.lock();
            match elements.get(&element) {
                Some(entry) if entry.generation == generation => entry.stream.clone(),
                _ => return,
            }
        };
        // No receivers is fine: every subscriber may be mid-resubscribe.
        let _ = sender.send(batch);
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Entry point the platform reports raw batches through
#[derive(Clone)]
pub struct ResizeSink {
    element: ElementId,
    generation: u64,
    registry: Weak<Registry>,
}

impl ResizeSink {
    /// Deliver a batch to every current subscriber.
    ///
    /// Silently dropped once the element has been released.
    pub fn emit(&self, batch: ResizeBatch) {
        if let Some(registry) = self.registry.upgrade() {
            registry.publish(self.element, self.generation, batch);
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A consumer's registration on one observed element.
///
/// Dropping it unsubscribes.
pub struct ResizeSubscription {
    stream: ResizeStream,
    guard: SubscriptionGuard,
}

impl ResizeSubscription {
    pub fn element(&self) -> ElementId {
        self.stream.element
    }

    /// Wait for the next batch; `None` once the element has been released
    pub async fn recv(&mut self) -> Option<ResizeBatch> {
        self.stream.recv().await
    }

    /// Take the next batch if one is already queued
    pub fn try_recv(&mut self) -> Option<ResizeBatch> {
        self.stream.try_recv()
    }

    /// Explicitly unsubscribe
    pub fn unsubscribe(mut self) {
        self.guard.release();
    }

    /// Separate the receiving half from the registration
    pub fn split(self) -> (ResizeStream, SubscriptionGuard) {
        (self.stream, self.guard)
    }

    /// Turn the subscription into a [`Stream`] that unsubscribes on drop
    pub fn into_stream(self) -> impl Stream<Item = ResizeBatch> + Send + 'static {
        stream::unfold(self, |mut sub| async move {
            let batch = sub.recv().await?;
            Some((batch, sub))
        })
    }
}

/// Receiving half of a subscription
pub struct ResizeStream {
    element: ElementId,
    receiver: Option<broadcast::Receiver<ResizeBatch>>,
}

impl ResizeStream {
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub async fn recv(&mut self) -> Option<ResizeBatch> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(batch) => return Some(batch),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Resize subscriber on {} lagged, skipped {} batches", self.element, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<ResizeBatch> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.try_recv() {
                Ok(batch) => return Some(batch),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Resize subscriber on {} lagged, skipped {} batches", self.element, skipped);
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }
}

/// Registration half of a subscription; releases its refcount on drop
pub struct SubscriptionGuard {
    element: ElementId,
    generation: u64,
    registry: Weak<Registry>,
    released: bool,
}

impl SubscriptionGuard {
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Decrement the element's refcount. Repeated calls are no-ops.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(registry) = self.registry.upgrade() {
            registry.release(self.element, self.generation);
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resize::platform::{ManualResizePlatform, UnsupportedResizePlatform};
    use crate::types::Size;
    use futures::StreamExt;

    fn setup() -> (ManualResizePlatform, SizeObserver, ElementId) {
        let platform = ManualResizePlatform::new();
        let observer = SizeObserver::new(platform.clone());
        (platform, observer, ElementId::new())
    }

    #[test]
    fn test_single_native_watch_per_element() {
        let (platform, observer, element) = setup();

        let subs: Vec<_> = (0..5).map(|_| observer.observe(element)).collect();

        assert_eq!(platform.created_count(), 1);
        assert_eq!(platform.active_count(), 1);
        assert_eq!(observer.refcount(element), 5);
        assert!(observer.has_native_watch(element));

        drop(subs);
        assert_eq!(platform.released_count(), 1);
        assert_eq!(observer.observed_count(), 0);
    }

    #[test]
    fn test_release_only_after_last_unsubscribe() {
        let (platform, observer, element) = setup();

        let first = observer.observe(element);
        let second = observer.observe(element);
        let third = observer.observe(element);

        // Unsubscribe out of creation order.
        second.unsubscribe();
        assert_eq!(platform.released_count(), 0);
        third.unsubscribe();
        assert_eq!(platform.released_count(), 0);
        assert_eq!(observer.refcount(element), 1);

        first.unsubscribe();
        assert_eq!(platform.created_count(), 1);
        assert_eq!(platform.released_count(), 1);
        assert!(!observer.is_observing(element));
    }

    #[test]
    fn test_fan_out_to_every_subscriber() {
        let (platform, observer, element) = setup();
        let mut a = observer.observe(element);
        let mut b = observer.observe(element);

        assert!(platform.fire(element, Size::new(200.0, 600.0)));

        let from_a = a.try_recv().unwrap();
        let from_b = b.try_recv().unwrap();
        assert_eq!(from_a, from_b);
        assert_eq!(from_a[0].content_size, Size::new(200.0, 600.0));
    }

    #[test]
    fn test_only_notifications_after_subscription() {
        let (platform, observer, element) = setup();
        let mut early = observer.observe(element);
        platform.fire(element, Size::new(10.0, 10.0));

        let mut late = observer.observe(element);
        platform.fire(element, Size::new(20.0, 10.0));

        assert_eq!(early.try_recv().unwrap()[0].content_size.width, 10.0);
        assert_eq!(early.try_recv().unwrap()[0].content_size.width, 20.0);
        assert_eq!(late.try_recv().unwrap()[0].content_size.width, 20.0);
        assert!(late.try_recv().is_none());
    }

    #[test]
    fn test_remaining_subscriber_keeps_receiving() {
        let (platform, observer, element) = setup();
        let first = observer.observe(element);
        let mut second = observer.observe(element);

        first.unsubscribe();
        assert!(platform.fire(element, Size::new(68.0, 400.0)));
        assert!(second.try_recv().is_some());

        second.unsubscribe();
        assert_eq!(observer.observed_count(), 0);
        assert!(!platform.fire(element, Size::new(70.0, 400.0)));
    }

    #[test]
    fn test_rebuild_after_release() {
        let (platform, observer, element) = setup();

        observer.observe(element).unsubscribe();
        let mut again = observer.observe(element);

        assert_eq!(platform.created_count(), 2);
        assert_eq!(platform.released_count(), 1);
        platform.fire(element, Size::new(1.0, 1.0));
        assert!(again.try_recv().is_some());
    }

    #[test]
    fn test_unsupported_platform_is_silent() {
        let observer = SizeObserver::new(UnsupportedResizePlatform);
        let element = ElementId::new();

        let mut sub = observer.observe(element);
        assert!(observer.is_observing(element));
        assert!(!observer.has_native_watch(element));
        assert!(sub.try_recv().is_none());

        sub.unsubscribe();
        assert_eq!(observer.observed_count(), 0);
    }

    #[test]
    fn test_teardown_releases_everything_and_is_idempotent() {
        let (platform, observer, element) = setup();
        let other = ElementId::new();

        let mut sub = observer.observe(element);
        let _sub2 = observer.observe(element);
        let _sub3 = observer.observe(other);

        observer.teardown();
        assert_eq!(observer.observed_count(), 0);
        assert_eq!(platform.released_count(), 2);
        assert!(sub.try_recv().is_none());

        observer.teardown();
        assert_eq!(platform.released_count(), 2);
    }

    #[test]
    fn test_unsubscribe_after_teardown_is_noop() {
        let (platform, observer, element) = setup();
        let stale = observer.observe(element);
        observer.teardown();

        // A fresh observation of the same element must not be affected.
        let fresh = observer.observe(element);
        stale.unsubscribe();
        assert_eq!(observer.refcount(element), 1);
        assert!(platform.is_watching(element));

        drop(fresh);
        assert_eq!(observer.observed_count(), 0);
    }

    #[test]
    fn test_guard_release_is_idempotent() {
        let (_platform, observer, element) = setup();
        let _keep = observer.observe(element);
        let (_stream, mut guard) = observer.observe(element).split();

        guard.release();
        guard.release();
        drop(guard);
        assert_eq!(observer.refcount(element), 1);
    }

    #[tokio::test]
    async fn test_stream_ends_when_element_released() {
        let (platform, observer, element) = setup();
        let mut stream = Box::pin(observer.observe(element).into_stream());

        platform.fire(element, Size::new(5.0, 5.0));
        assert!(stream.next().await.is_some());

        observer.teardown();
        assert!(stream.next().await.is_none());
    }

    /// Factory whose registry is torn down while a watch is being created
    #[derive(Default)]
    struct TeardownDuringCreate {
        disconnects: Arc<AtomicU64>,
    }

    struct CountedWatch(Arc<AtomicU64>);

    impl NativeResizeWatch for CountedWatch {
        fn disconnect(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ResizeObserverFactory for TeardownDuringCreate {
        fn create(&self, _element: ElementId, sink: ResizeSink) -> Option<Box<dyn NativeResizeWatch>> {
            if let Some(registry) = sink.registry.upgrade() {
                registry.teardown();
            }
            Some(Box::new(CountedWatch(Arc::clone(&self.disconnects))))
        }
    }

    #[test]
    fn test_watch_created_after_release_is_disconnected() {
        let factory = TeardownDuringCreate::default();
        let disconnects = Arc::clone(&factory.disconnects);
        let observer = SizeObserver::new(factory);
        let element = ElementId::new();

        let mut sub = observer.observe(element);

        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert!(!observer.is_observing(element));
        assert!(!observer.has_native_watch(element));
        assert!(sub.try_recv().is_none());

        sub.unsubscribe();
        assert_eq!(observer.observed_count(), 0);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_stream_unsubscribes() {
        let (_platform, observer, element) = setup();
        let stream = observer.observe(element).into_stream();
        assert_eq!(observer.refcount(element), 1);

        drop(stream);
        assert_eq!(observer.observed_count(), 0);
    }
}
