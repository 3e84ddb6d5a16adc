//! Simulated styling engine
//!
//! Tweens the panel width frame by frame, reporting each frame as a resize
//! notification and each transition as a phase-start/phase-end pair, the
//! way a browser animation engine would.

use panelkit_core::{
    ElementId, ManualResizePlatform, PanelConfig, PanelController, PanelState, PhaseEvent, Size,
    TransitionState,
};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Length of one animation frame
pub const FRAME: Duration = Duration::from_millis(16);

pub struct SimulatedAnimator {
    platform: ManualResizePlatform,
    element: ElementId,
    expanded_width: f32,
    collapsed_width: f32,
    height: f32,
    frames: u32,
    width: f32,
    shown: PanelState,
}

impl SimulatedAnimator {
    pub fn new(platform: ManualResizePlatform, element: ElementId, config: &PanelConfig, height: f32) -> Self {
        let frames = (config.transition_duration_ms / FRAME.as_millis() as u64).max(1) as u32;
        let shown = PanelState::from_collapsed(config.initially_collapsed);
        Self {
            platform,
            element,
            expanded_width: config.expanded_width,
            collapsed_width: config.collapsed_width,
            height,
            frames,
            width: config.width_for(config.initially_collapsed),
            shown,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Report the current width as the element's initial layout
    pub fn layout(&self) {
        self.platform.fire(self.element, Size::new(self.width, self.height));
    }

    /// Play transitions until the controller settles
    pub async fn run(&mut self, controller: &Mutex<PanelController>) {
        loop {
            let state = controller.lock().await.state();
            let target = match state {
                TransitionState::Transitioning { target, instant: false } => target,
                settled => {
                    self.snap(settled.target());
                    return;
                }
            };

            let event = PhaseEvent::new(self.shown, target);
            controller.lock().await.phase_start(event);

            let interrupted = self.tween(controller, target).await;
            if interrupted {
                debug!("Transition to {:?} interrupted at {}px", target, self.width);
            }

            // Interrupted transitions still report their end.
            controller.lock().await.phase_end(event);
            self.shown = target;
        }
    }

    async fn tween(&mut self, controller: &Mutex<PanelController>, target: PanelState) -> bool {
        let from = self.width;
        let to = self.width_of(target);

        for frame in 1..=self.frames {
            tokio::time::sleep(FRAME).await;
            if controller.lock().await.state().target() != target {
                return true;
            }

            self.width = if frame == self.frames {
                to
            } else {
                from + (to - from) * ease_out(frame as f32 / self.frames as f32)
            };
            self.platform.fire(self.element, Size::new(self.width, self.height));
        }
        false
    }

    fn snap(&mut self, state: PanelState) {
        self.shown = state;
        let width = self.width_of(state);
        if width != self.width {
            self.width = width;
            self.platform.fire(self.element, Size::new(width, self.height));
        }
    }

    fn width_of(&self, state: PanelState) -> f32 {
        match state {
            PanelState::Expanded => self.expanded_width,
            PanelState::Collapsed => self.collapsed_width,
        }
    }
}

fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}
