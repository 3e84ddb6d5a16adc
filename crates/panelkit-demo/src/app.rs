//! Demo application wiring

use crate::animator::{SimulatedAnimator, FRAME};
use panelkit_core::{
    init_shared, shutdown_shared, ElementId, ManualResizePlatform, MarginContainer, PanelConfig,
    PanelController, PanelHost, SizeObserver, StaticCapabilities, ToggleResult,
};
use parking_lot::Mutex as SyncMutex;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const PANEL_HEIGHT: f32 = 720.0;

/// Outcome of a demo run
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub results: Vec<(&'static str, ToggleResult)>,
    pub margin_recomputes: usize,
    pub content_margin: f32,
    pub watches_released: usize,
}

/// Config file location: `$PANELKIT_CONFIG`, else `<config_dir>/panelkit/panel.json`
pub fn config_path() -> PathBuf {
    resolve_config_path(std::env::var_os("PANELKIT_CONFIG"))
}

fn resolve_config_path(overridden: Option<OsString>) -> PathBuf {
    if let Some(path) = overridden {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("panelkit")
        .join("panel.json")
}

/// Content area next to the panel; its left margin tracks the panel width
struct ContentContainer {
    platform: ManualResizePlatform,
    panel: ElementId,
    margin: SyncMutex<f32>,
    recomputes: AtomicUsize,
}

impl MarginContainer for ContentContainer {
    fn recompute_margins(&self) {
        let width = self
            .platform
            .last_size(self.panel)
            .map(|size| size.width)
            .unwrap_or_default();
        *self.margin.lock() = width;
        self.recomputes.fetch_add(1, Ordering::SeqCst);
        debug!("Content margin-left = {:.1}px", width);
    }

    fn clear_margin_transition(&self) {
        debug!("Content margin transition cleared");
    }
}

/// Collapse, expand, then collapse with a mid-way reversal
pub async fn run(config: PanelConfig) -> anyhow::Result<DemoReport> {
    config.validate()?;

    let platform = ManualResizePlatform::new();
    let observer = init_shared(|| {
        SizeObserver::with_capacity(Arc::new(platform.clone()), config.resize.channel_capacity)
    });

    let panel = ElementId::new();
    let controller = Arc::new(Mutex::new(PanelController::from_config(
        &config,
        Arc::new(StaticCapabilities::default()),
    )));
    let container = Arc::new(ContentContainer {
        platform: platform.clone(),
        panel,
        margin: SyncMutex::new(0.0),
        recomputes: AtomicUsize::new(0),
    });

    let events = controller.lock().await.subscribe();
    let host = PanelHost::start(
        Arc::clone(&observer),
        panel,
        &config.resize,
        events,
        container.clone(),
    )?;

    let mut animator = SimulatedAnimator::new(platform.clone(), panel, &config, PANEL_HEIGHT);
    animator.layout();
    controller.lock().await.content_checked();

    let mut results = Vec::new();

    let completion = controller.lock().await.collapse();
    animator.run(&controller).await;
    results.push(("collapse", completion.await));

    let completion = controller.lock().await.expand();
    animator.run(&controller).await;
    results.push(("expand", completion.await));

    let first = controller.lock().await.collapse();
    let reversal = {
        let controller = Arc::clone(&controller);
        let delay = config.transition_duration() / 2;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!("Reversing collapse mid-way");
            let mut controller = controller.lock().await;
            controller.expand()
        })
    };
    animator.run(&controller).await;
    let second = reversal.await?;
    results.push(("collapse (reversed)", first.await));
    results.push(("expand (reversal)", second.await));

    // Let the host catch up with the last frames before reading the margin.
    tokio::time::sleep(FRAME + config.resize.debounce().unwrap_or_default() * 2).await;

    host.shutdown();
    shutdown_shared();

    let content_margin = *container.margin.lock();
    Ok(DemoReport {
        results,
        margin_recomputes: container.recomputes.load(Ordering::SeqCst),
        content_margin,
        watches_released: platform.released_count(),
    })
}
