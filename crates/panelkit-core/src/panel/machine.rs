//! Collapse/expand transition state machine
//!
//! Pure bookkeeping: every input returns the [`Effect`]s the controller has
//! to carry out. Nothing here touches styling, channels or completions.

use crate::types::{PanelEvent, PanelState, PhaseEvent, TransitionState};
use tracing::debug;

/// Work requested by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Point the styling engine at `target`
    BeginTransition {
        from: PanelState,
        target: PanelState,
        instant: bool,
    },
    AttachTransitionClass,
    DetachTransitionClass,
    Emit(PanelEvent),
    /// Resolve every pending completion with `PanelState`
    Resolve(PanelState),
}

#[derive(Debug, Clone)]
pub struct TransitionMachine {
    state: TransitionState,
    collapsed: bool,
    animations_enabled: bool,
    last_end: Option<PhaseEvent>,
}

impl TransitionMachine {
    pub fn new(initially_collapsed: bool) -> Self {
        Self {
            state: TransitionState::idle(PanelState::from_collapsed(initially_collapsed)),
            collapsed: initially_collapsed,
            animations_enabled: false,
            last_end: None,
        }
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Requested collapsed intent
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn animations_enabled(&self) -> bool {
        self.animations_enabled
    }

    /// Allow animated transitions once mounted in a live rendering surface
    pub fn enable_animations(&mut self) {
        self.animations_enabled = true;
    }

    /// Request the panel to move to `target`.
    ///
    /// `animate` is the caller's intent; transitions are instant anyway before
    /// mount and while the platform suppresses animation.
    pub fn request(&mut self, target: PanelState, animate: bool, suppressed: bool) -> Vec<Effect> {
        self.collapsed = target.is_collapsed();
        let instant = !self.animations_enabled || suppressed || !animate;

        match self.state {
            TransitionState::Transitioning { target: current, .. } if current == target => {
                debug!("Toggle to {:?} already in flight", target);
                Vec::new()
            }
            TransitionState::Transitioning { target: current, .. } => {
                debug!("Redirecting transition {:?} -> {:?}", current, target);
                self.begin(current, target, instant)
            }
            idle if idle.target() == target => vec![Effect::Resolve(target)],
            idle => self.begin(idle.target(), target, instant),
        }
    }

    fn begin(&mut self, from: PanelState, target: PanelState, instant: bool) -> Vec<Effect> {
        self.state = TransitionState::Transitioning { target, instant };
        // A new request re-arms completion; duplicates only matter within one transition.
        self.last_end = None;
        vec![Effect::BeginTransition {
            from,
            target,
            instant,
        }]
    }

    /// The styling engine started playing a transition
    pub fn phase_start(&mut self, event: PhaseEvent, suppressed: bool) -> Vec<Effect> {
        if !event.is_change() {
            return Vec::new();
        }

        match self.state {
            TransitionState::Transitioning { target, instant } if event.to == target => {
                let mut effects = vec![Effect::Emit(match target {
                    PanelState::Collapsed => PanelEvent::CollapsedStart,
                    PanelState::Expanded => PanelEvent::ExpandedStart,
                })];
                if !instant && !suppressed {
                    effects.push(Effect::AttachTransitionClass);
                }
                effects
            }
            _ => {
                debug!("Ignoring stale phase start {:?} in {:?}", event, self.state);
                Vec::new()
            }
        }
    }

    /// The styling engine finished playing a transition
    pub fn phase_end(&mut self, event: PhaseEvent) -> Vec<Effect> {
        if self.last_end == Some(event) {
            debug!("Ignoring duplicate phase end {:?}", event);
            return Vec::new();
        }
        self.last_end = Some(event);

        if !event.is_change() {
            return Vec::new();
        }

        match self.state {
            TransitionState::Transitioning { target, .. } if event.to == target => {
                self.state = TransitionState::idle(target);
                vec![
                    Effect::DetachTransitionClass,
                    Effect::Emit(PanelEvent::CollapsedChange(target.is_collapsed())),
                    Effect::Resolve(target),
                ]
            }
            _ => {
                debug!("Ignoring stale phase end {:?} in {:?}", event, self.state);
                Vec::new()
            }
        }
    }
}
