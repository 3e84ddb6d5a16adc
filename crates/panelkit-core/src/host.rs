//! Panel host: keeps container margins in step with the panel
//!
//! The container around a collapsible panel lays out its content next to
//! the panel, so its margins must follow the panel's animating width. The
//! host recomputes them on every size change of the panel element and on
//! every phase boundary of the panel's transition.

use crate::config::ResizeConfig;
use crate::error::Result;
use crate::resize::{ObserveResize, SizeObserver};
use crate::types::{ElementId, PanelEvent, ResizeBatch, Size};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Container that lays out content around the panel
#[cfg_attr(test, mockall::automock)]
pub trait MarginContainer: Send + Sync {
    fn recompute_margins(&self);

    /// Drop the container's own margin transition so it does not lag
    /// behind the panel's width animation
    fn clear_margin_transition(&self) {}
}

pub struct PanelHost {
    resize: ObserveResize,
    task: JoinHandle<()>,
}

impl PanelHost {
    /// Start driving `container` from the panel element's size changes and
    /// from the controller events received on `events`
    pub fn start(
        observer: Arc<SizeObserver>,
        element: ElementId,
        config: &ResizeConfig,
        events: broadcast::Receiver<PanelEvent>,
        container: Arc<dyn MarginContainer>,
    ) -> Result<Self> {
        let (resize, output) = ObserveResize::new(observer, element);
        let mut resize = resize.with_debounce(config.debounce());
        resize.start()?;

        info!("Panel host started for {}", element);
        let task = tokio::spawn(drive(output, events, container));
        Ok(Self { resize, task })
    }

    pub fn element(&self) -> ElementId {
        self.resize.element()
    }

    pub fn set_resize_debounce(&mut self, interval: Option<Duration>) -> Result<()> {
        self.resize.set_debounce(interval)
    }

    pub fn set_resize_disabled(&mut self, disabled: bool) -> Result<()> {
        self.resize.set_disabled(disabled)
    }

    pub fn shutdown(mut self) {
        self.resize.unsubscribe();
        info!("Panel host stopped for {}", self.resize.element());
    }
}

impl Drop for PanelHost {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive(
    mut resizes: mpsc::UnboundedReceiver<ResizeBatch>,
    mut events: broadcast::Receiver<PanelEvent>,
    container: Arc<dyn MarginContainer>,
) {
    let mut last_size: Option<Size> = None;
    let mut resizes_open = true;
    let mut events_open = true;

    while resizes_open || events_open {
        tokio::select! {
            batch = resizes.recv(), if resizes_open => match batch {
                Some(batch) => {
                    let size = batch.last().map(|entry| entry.content_size);
                    // A recompute that leaves the panel's size alone must not re-trigger itself.
                    if size.is_some() && size != last_size {
                        last_size = size;
                        container.recompute_margins();
                    } else {
                        debug!("Skipping resize batch with unchanged size");
                    }
                }
                None => resizes_open = false,
            },
            event = events.recv(), if events_open => match event {
                Ok(event) => {
                    // Margins may now depend on more than the panel's size.
                    last_size = None;
                    if let PanelEvent::CollapsedChange(collapsed) = event {
                        debug!("Panel settled (collapsed: {}), clearing margin transition", collapsed);
                        container.clear_margin_transition();
                    }
                    container.recompute_margins();
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Panel host lagged, skipped {} events", skipped);
                    last_size = None;
                    container.recompute_margins();
                }
                Err(broadcast::error::RecvError::Closed) => events_open = false,
            },
        }
    }
}
