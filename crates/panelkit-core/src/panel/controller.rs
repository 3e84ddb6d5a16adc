//! Panel transition controller
//!
//! Owns the collapsed flag of one panel, drives the [`TransitionMachine`]
//! and turns its effects into styling changes, published [`PanelEvent`]s
//! and resolved [`ToggleCompletion`]s.

use super::machine::{Effect, TransitionMachine};
use super::styling::{styling_for, TransitionStyling, ViewportStyle};
use crate::config::PanelConfig;
use crate::types::{PanelEvent, PanelState, PhaseEvent, ToggleResult, TransitionState};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Platform queries the controller needs
#[cfg_attr(test, mockall::automock)]
pub trait PlatformCapabilities: Send + Sync {
    /// Whether the panel is rendered on a live surface that can animate
    fn is_live_surface(&self) -> bool;

    /// Whether the platform-wide no-animation mode is active
    fn animations_suppressed(&self) -> bool;
}

/// Capabilities with fixed answers
#[derive(Debug, Clone, Copy)]
pub struct StaticCapabilities {
    pub live_surface: bool,
    pub suppressed: bool,
}

impl Default for StaticCapabilities {
    fn default() -> Self {
        Self {
            live_surface: true,
            suppressed: false,
        }
    }
}

impl PlatformCapabilities for StaticCapabilities {
    fn is_live_surface(&self) -> bool {
        self.live_surface
    }

    fn animations_suppressed(&self) -> bool {
        self.suppressed
    }
}

/// Tells the host that presentable state changed and needs a re-render
pub trait ChangeNotifier: Send + Sync {
    fn notify_changed(&self);
}

/// Awaitable result of one toggle request.
///
/// Resolves exactly once with the state actually reached, which differs from
/// the requested one when a later toggle redirected the transition.
pub struct ToggleCompletion {
    rx: oneshot::Receiver<ToggleResult>,
    fallback: ToggleResult,
    result: Option<ToggleResult>,
}

impl ToggleCompletion {
    fn new(rx: oneshot::Receiver<ToggleResult>, fallback: ToggleResult) -> Self {
        Self {
            rx,
            fallback,
            result: None,
        }
    }

    /// Result if already resolved. Stays available once seen.
    pub fn try_result(&mut self) -> Option<ToggleResult> {
        if self.result.is_none() {
            self.result = match self.rx.try_recv() {
                Ok(result) => Some(result),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(self.fallback),
            };
        }
        self.result
    }
}

impl Future for ToggleCompletion {
    type Output = ToggleResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(result) = this.result {
            return Poll::Ready(result);
        }

        let fallback = this.fallback;
        let result = match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(received) => received.unwrap_or(fallback),
            Poll::Pending => return Poll::Pending,
        };
        this.result = Some(result);
        Poll::Ready(result)
    }
}

pub struct PanelController {
    machine: TransitionMachine,
    styling: Box<dyn TransitionStyling>,
    capabilities: Arc<dyn PlatformCapabilities>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    events: broadcast::Sender<PanelEvent>,
    waiters: Vec<oneshot::Sender<ToggleResult>>,
}

impl PanelController {
    pub fn new(
        styling: Box<dyn TransitionStyling>,
        capabilities: Arc<dyn PlatformCapabilities>,
        initially_collapsed: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            machine: TransitionMachine::new(initially_collapsed),
            styling,
            capabilities,
            notifier: None,
            events,
            waiters: Vec::new(),
        }
    }

    pub fn from_config(config: &PanelConfig, capabilities: Arc<dyn PlatformCapabilities>) -> Self {
        Self::new(styling_for(config), capabilities, config.initially_collapsed)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Subscribe to `CollapsedStart`, `ExpandedStart` and `CollapsedChange`
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    pub fn collapsed(&self) -> bool {
        self.machine.collapsed()
    }

    /// Equivalent to `toggle(Some(collapsed))` without awaiting
    pub fn set_collapsed(&mut self, collapsed: bool) {
        let _ = self.toggle(Some(collapsed));
    }

    pub fn state(&self) -> TransitionState {
        self.machine.state()
    }

    pub fn style(&self) -> ViewportStyle {
        self.styling.style()
    }

    pub fn animations_enabled(&self) -> bool {
        self.machine.animations_enabled()
    }

    /// Mount signal: content has been checked on a rendering surface
    pub fn content_checked(&mut self) {
        if !self.machine.animations_enabled() && self.capabilities.is_live_surface() {
            debug!("Panel mounted on a live surface, enabling animations");
            self.machine.enable_animations();
        }
    }

    /// Toggle to `target`, or flip the current state when `None`
    pub fn toggle(&mut self, target: Option<bool>) -> ToggleCompletion {
        self.toggle_with(target, true)
    }

    pub fn collapse(&mut self) -> ToggleCompletion {
        self.toggle(Some(true))
    }

    pub fn expand(&mut self) -> ToggleCompletion {
        self.toggle(Some(false))
    }

    /// Toggle with explicit animation intent
    pub fn toggle_with(&mut self, target: Option<bool>, animate: bool) -> ToggleCompletion {
        let collapsed = target.unwrap_or(!self.machine.collapsed());
        let target = PanelState::from_collapsed(collapsed);

        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);

        info!("Panel toggle requested: {:?}", target);
        let suppressed = self.capabilities.animations_suppressed();
        let effects = self.machine.request(target, animate, suppressed);
        self.apply(effects);

        ToggleCompletion::new(rx, target.into())
    }

    /// Phase-start notification from the styling engine
    pub fn phase_start(&mut self, event: PhaseEvent) {
        let suppressed = self.capabilities.animations_suppressed();
        let effects = self.machine.phase_start(event, suppressed);
        self.apply(effects);
    }

    /// Phase-end notification from the styling engine
    pub fn phase_end(&mut self, event: PhaseEvent) {
        let effects = self.machine.phase_end(event);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        if effects.is_empty() {
            return;
        }

        for effect in effects {
            match effect {
                Effect::BeginTransition {
                    from,
                    target,
                    instant,
                } => {
                    self.styling.set_target(target, instant);
                    if instant {
                        // Zero-length transitions complete on the spot.
                        let event = PhaseEvent::new(from, target);
                        self.phase_start(event);
                        self.phase_end(event);
                    }
                }
                Effect::AttachTransitionClass => self.styling.set_transition_active(true),
                Effect::DetachTransitionClass => self.styling.set_transition_active(false),
                Effect::Emit(event) => {
                    // No subscribers is not an error.
                    let _ = self.events.send(event);
                }
                Effect::Resolve(state) => {
                    info!("Panel transition settled: {:?}", state);
                    self.resolve(state.into());
                }
            }
        }

        if let Some(notifier) = &self.notifier {
            notifier.notify_changed();
        }
    }

    fn resolve(&mut self, result: ToggleResult) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(result);
        }
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        let result = self.machine.state().target().into();
        self.resolve(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const E: PanelState = PanelState::Expanded;
    const C: PanelState = PanelState::Collapsed;

    fn controller(live: bool, suppressed: bool) -> PanelController {
        let mut caps = MockPlatformCapabilities::new();
        caps.expect_is_live_surface().return_const(live);
        caps.expect_animations_suppressed().return_const(suppressed);
        PanelController::from_config(&PanelConfig::default(), Arc::new(caps))
    }

    fn mounted() -> PanelController {
        let mut controller = controller(true, false);
        controller.content_checked();
        controller
    }

    fn drain(rx: &mut broadcast::Receiver<PanelEvent>) -> Vec<PanelEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_collapse_end_to_end() {
        let mut controller = mounted();
        let mut events = controller.subscribe();

        let completion = controller.collapse();
        assert_eq!(controller.state(), TransitionState::Transitioning { target: C, instant: false });

        controller.phase_start(PhaseEvent::new(E, C));
        assert!(controller.style().transition_class);
        controller.phase_end(PhaseEvent::new(E, C));

        assert_eq!(
            drain(&mut events),
            vec![PanelEvent::CollapsedStart, PanelEvent::CollapsedChange(true)]
        );
        assert!(controller.collapsed());
        assert!(!controller.style().transition_class);
        assert_eq!(controller.style().width, 68.0);
        assert_eq!(completion.await, ToggleResult::Collapsed);
    }

    #[test]
    fn test_completion_pending_until_phase_end() {
        let mut controller = mounted();
        let mut completion = tokio_test::task::spawn(controller.collapse());

        tokio_test::assert_pending!(completion.poll());
        controller.phase_start(PhaseEvent::new(E, C));
        tokio_test::assert_pending!(completion.poll());

        controller.phase_end(PhaseEvent::new(E, C));
        assert!(completion.is_woken());
        tokio_test::assert_ready_eq!(completion.poll(), ToggleResult::Collapsed);
    }

    #[test]
    fn test_pre_mount_toggle_is_instant() {
        let mut controller = controller(true, false);
        let mut events = controller.subscribe();

        let completion = controller.collapse();
        assert_eq!(completion.now_or_never(), Some(ToggleResult::Collapsed));
        assert_eq!(controller.state(), TransitionState::IdleCollapsed);
        assert!(!controller.style().transition_class);
        assert_eq!(
            drain(&mut events),
            vec![PanelEvent::CollapsedStart, PanelEvent::CollapsedChange(true)]
        );
    }

    #[test]
    fn test_not_live_surface_never_enables_animations() {
        let mut controller = controller(false, false);
        controller.content_checked();
        assert!(!controller.animations_enabled());

        let mut completion = controller.collapse();
        assert_eq!(completion.try_result(), Some(ToggleResult::Collapsed));
    }

    #[test]
    fn test_suppressed_mode_forces_instant() {
        let mut controller = controller(true, true);
        controller.content_checked();

        let mut completion = controller.expand();
        assert_eq!(completion.try_result(), Some(ToggleResult::Expanded));

        let mut completion = controller.collapse();
        assert_eq!(completion.try_result(), Some(ToggleResult::Collapsed));
        assert!(!controller.style().transition_class);
    }

    #[test]
    fn test_animate_false_is_instant_after_mount() {
        let mut controller = mounted();
        let mut completion = controller.toggle_with(Some(true), false);
        assert_eq!(completion.try_result(), Some(ToggleResult::Collapsed));
    }

    #[tokio::test]
    async fn test_redirect_resolves_both_with_reached_state() {
        let mut controller = mounted();
        let mut events = controller.subscribe();

        let first = controller.toggle(Some(true));
        let second = controller.toggle(Some(false));
        assert!(!controller.collapsed());

        controller.phase_start(PhaseEvent::new(C, E));
        controller.phase_end(PhaseEvent::new(C, E));

        assert_eq!(controller.state(), TransitionState::IdleExpanded);
        let changes: Vec<_> = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, PanelEvent::CollapsedChange(_)))
            .collect();
        assert_eq!(changes, vec![PanelEvent::CollapsedChange(false)]);
        assert_eq!(first.await, ToggleResult::Expanded);
        assert_eq!(second.await, ToggleResult::Expanded);
    }

    #[test]
    fn test_duplicate_phase_end_emits_once() {
        let mut controller = mounted();
        let mut events = controller.subscribe();

        let _ = controller.collapse();
        controller.phase_end(PhaseEvent::new(E, C));
        controller.phase_end(PhaseEvent::new(E, C));

        assert_eq!(drain(&mut events), vec![PanelEvent::CollapsedChange(true)]);
    }

    #[test]
    fn test_toggle_without_argument_flips() {
        let mut controller = controller(true, false);
        let mut first = controller.toggle(None);
        assert_eq!(first.try_result(), Some(ToggleResult::Collapsed));

        let mut second = controller.toggle(None);
        assert_eq!(second.try_result(), Some(ToggleResult::Expanded));
    }

    #[test]
    fn test_same_target_in_flight_joins_pending() {
        let mut controller = mounted();
        let mut first = controller.collapse();
        let mut second = controller.collapse();
        assert_eq!(first.try_result(), None);

        controller.phase_end(PhaseEvent::new(E, C));
        assert_eq!(first.try_result(), Some(ToggleResult::Collapsed));
        assert_eq!(second.try_result(), Some(ToggleResult::Collapsed));
    }

    #[test]
    fn test_toggle_to_current_idle_state_resolves_immediately() {
        let mut controller = mounted();
        let mut completion = controller.expand();
        assert_eq!(completion.try_result(), Some(ToggleResult::Expanded));
    }

    #[test]
    fn test_set_collapsed_property() {
        let mut controller = controller(true, false);
        controller.set_collapsed(true);
        assert!(controller.collapsed());
        assert_eq!(controller.state(), TransitionState::IdleCollapsed);
    }

    #[test]
    fn test_drop_resolves_pending_completion() {
        let mut controller = mounted();
        let completion = controller.collapse();
        drop(controller);
        assert_eq!(completion.now_or_never(), Some(ToggleResult::Collapsed));
    }

    #[tokio::test]
    async fn test_completion_awaitable_after_try_result() {
        let mut controller = controller(true, false);
        let mut completion = controller.collapse();

        assert_eq!(completion.try_result(), Some(ToggleResult::Collapsed));
        assert_eq!(completion.try_result(), Some(ToggleResult::Collapsed));
        assert_eq!(completion.await, ToggleResult::Collapsed);
    }

    #[test]
    fn test_completion_poll_then_try_result() {
        let mut controller = mounted();
        let mut completion = tokio_test::task::spawn(controller.collapse());
        controller.phase_end(PhaseEvent::new(E, C));

        tokio_test::assert_ready_eq!(completion.poll(), ToggleResult::Collapsed);
        assert_eq!(completion.try_result(), Some(ToggleResult::Collapsed));
        tokio_test::assert_ready_eq!(completion.poll(), ToggleResult::Collapsed);
    }

    #[test]
    fn test_closed_completion_uses_fallback_both_ways() {
        let (tx, rx) = oneshot::channel();
        drop(tx);
        let mut completion = ToggleCompletion::new(rx, ToggleResult::Expanded);
        assert_eq!(completion.try_result(), Some(ToggleResult::Expanded));
        assert_eq!(completion.now_or_never(), Some(ToggleResult::Expanded));

        let (tx, rx) = oneshot::channel::<ToggleResult>();
        drop(tx);
        let completion = ToggleCompletion::new(rx, ToggleResult::Collapsed);
        assert_eq!(completion.now_or_never(), Some(ToggleResult::Collapsed));
    }

    #[test]
    fn test_notifier_called_on_changes() {
        struct Counter(AtomicUsize);
        impl ChangeNotifier for Counter {
            fn notify_changed(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let mut controller = mounted().with_notifier(counter.clone());

        let _ = controller.collapse();
        let after_toggle = counter.0.load(Ordering::SeqCst);
        assert!(after_toggle >= 1);

        controller.phase_end(PhaseEvent::new(E, E));
        assert_eq!(counter.0.load(Ordering::SeqCst), after_toggle);
    }
}
