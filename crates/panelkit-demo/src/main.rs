//! PanelKit Demo
//!
//! Runs the collapsible panel through a scripted sequence headlessly.

use panelkit_core::PanelConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("PanelKit demo v{}", env!("CARGO_PKG_VERSION"));

    let path = panelkit_demo::config_path();
    let config = PanelConfig::load(&path)?;
    info!(
        "Panel {}px / {}px, {}ms, {:?} styling",
        config.expanded_width, config.collapsed_width, config.transition_duration_ms, config.styling
    );

    let report = panelkit_demo::run(config).await?;
    for (step, result) in &report.results {
        info!("{:<22} -> {}", step, result);
    }
    info!(
        "Margins recomputed {} times, content margin {:.1}px, {} native watch(es) released",
        report.margin_recomputes, report.content_margin, report.watches_released
    );

    Ok(())
}
