//! Per-consumer resize stream with debounce and enable/disable controls

use super::multiplexer::{ResizeStream, SizeObserver, SubscriptionGuard};
use crate::error::{Error, Result};
use crate::types::{ElementId, ResizeBatch};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Wraps one [`SizeObserver`] subscription for a single consumer.
///
/// Batches are forwarded verbatim to the receiver returned by
/// [`ObserveResize::new`]. Forwarding runs on its own tokio task so that
/// delivery never happens inside the caller's update pass.
pub struct ObserveResize {
    observer: Arc<SizeObserver>,
    element: ElementId,
    debounce: Option<Duration>,
    disabled: bool,
    output: mpsc::UnboundedSender<ResizeBatch>,
    current: Option<ActiveSubscription>,
}

struct ActiveSubscription {
    _guard: SubscriptionGuard,
    task: JoinHandle<()>,
}

impl Drop for ActiveSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl ObserveResize {
    pub fn new(
        observer: Arc<SizeObserver>,
        element: ElementId,
    ) -> (Self, mpsc::UnboundedReceiver<ResizeBatch>) {
        let (output, rx) = mpsc::unbounded_channel();
        (
            Self {
                observer,
                element,
                debounce: None,
                disabled: false,
                output,
                current: None,
            },
            rx,
        )
    }

    /// Set the initial debounce interval without subscribing
    pub fn with_debounce(mut self, interval: Option<Duration>) -> Self {
        self.debounce = normalize(interval);
        self
    }

    /// Set the initial disabled flag without subscribing
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Subscribe once the consumer is ready, unless disabled or already subscribed
    pub fn start(&mut self) -> Result<()> {
        if self.current.is_none() && !self.disabled {
            self.subscribe()?;
        }
        Ok(())
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn debounce(&self) -> Option<Duration> {
        self.debounce
    }

    /// Change the debounce interval, rebuilding an active subscription
    pub fn set_debounce(&mut self, interval: Option<Duration>) -> Result<()> {
        self.debounce = normalize(interval);
        debug!("Resize debounce for {} set to {:?}", self.element, self.debounce);
        if self.disabled {
            return Ok(());
        }
        self.subscribe()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Stop delivery, or resubscribe from scratch when re-enabled
    pub fn set_disabled(&mut self, disabled: bool) -> Result<()> {
        self.disabled = disabled;
        if disabled {
            self.unsubscribe();
            Ok(())
        } else {
            self.subscribe()
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.current.is_some()
    }

    /// Drop the current subscription. No-op when not subscribed.
    pub fn unsubscribe(&mut self) {
        if self.current.take().is_some() {
            debug!("Unsubscribed resize stream on {}", self.element);
        }
    }

    fn subscribe(&mut self) -> Result<()> {
        self.unsubscribe();

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Runtime(format!("Resize stream needs a tokio runtime: {}", e)))?;

        let (stream, guard) = self.observer.observe(self.element).split();
        let task = runtime.spawn(forward(stream, self.debounce, self.output.clone()));

        debug!("Subscribed resize stream on {} (debounce {:?})", self.element, self.debounce);
        self.current = Some(ActiveSubscription { _guard: guard, task });
        Ok(())
    }
}

fn normalize(interval: Option<Duration>) -> Option<Duration> {
    interval.filter(|d| !d.is_zero())
}

async fn forward(
    mut stream: ResizeStream,
    debounce: Option<Duration>,
    output: mpsc::UnboundedSender<ResizeBatch>,
) {
    let Some(interval) = debounce else {
        while let Some(batch) = stream.recv().await {
            if output.send(batch).is_err() {
                return;
            }
        }
        return;
    };

    let mut pending: Option<ResizeBatch> = None;
    let quiet = tokio::time::sleep(interval);
    tokio::pin!(quiet);

    loop {
        tokio::select! {
            next = stream.recv() => match next {
                Some(batch) => {
                    // Anything already queued was raised before now; keep the newest.
                    let mut latest = batch;
                    while let Some(batch) = stream.try_recv() {
                        latest = batch;
                    }
                    pending = Some(latest);
                    quiet.as_mut().reset(Instant::now() + interval);
                }
                None => {
                    if let Some(batch) = pending.take() {
                        let _ = output.send(batch);
                    }
                    return;
                }
            },
            () = &mut quiet, if pending.is_some() => {
                if let Some(batch) = pending.take() {
                    if output.send(batch).is_err() {
                        return;
                    }
                }
            }
        }
    }
}
