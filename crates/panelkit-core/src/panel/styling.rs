//! Pluggable transition styling
//!
//! A panel's width change is played by the platform styling engine. Two
//! strategies describe what the engine is told:
//! - [`ClassToggleStyling`]: width follows a collapsed class, and a transition
//!   class is attached only while a transition plays.
//! - [`TriggerStyling`]: a declarative trigger with one labelled state per
//!   width; the trigger itself carries the transition timing.

use crate::config::{PanelConfig, StylingKind};
use crate::types::PanelState;
use std::time::Duration;

/// Presentational snapshot a renderer applies to the panel element
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportStyle {
    pub width: f32,
    pub collapsed_class: bool,
    pub transition_class: bool,
    pub transition_duration: Duration,
    pub easing: String,
    pub trigger_label: Option<&'static str>,
}

/// Strategy the panel controller drives
pub trait TransitionStyling: Send {
    /// Move the styling engine towards `target`
    fn set_target(&mut self, target: PanelState, instant: bool);

    /// Attach or remove the transition styling class
    fn set_transition_active(&mut self, active: bool);

    fn style(&self) -> ViewportStyle;
}

/// Build the strategy selected in `config`
pub fn styling_for(config: &PanelConfig) -> Box<dyn TransitionStyling> {
    let initial = PanelState::from_collapsed(config.initially_collapsed);
    match config.styling {
        StylingKind::ClassToggle => Box::new(ClassToggleStyling::new(config, initial)),
        StylingKind::Trigger => Box::new(TriggerStyling::new(config, initial)),
    }
}

#[derive(Debug, Clone)]
pub struct ClassToggleStyling {
    expanded_width: f32,
    collapsed_width: f32,
    duration: Duration,
    easing: String,
    collapsed: bool,
    transition_active: bool,
}

impl ClassToggleStyling {
    pub fn new(config: &PanelConfig, initial: PanelState) -> Self {
        Self {
            expanded_width: config.expanded_width,
            collapsed_width: config.collapsed_width,
            duration: config.transition_duration(),
            easing: config.easing.clone(),
            collapsed: initial.is_collapsed(),
            transition_active: false,
        }
    }
}

impl TransitionStyling for ClassToggleStyling {
    fn set_target(&mut self, target: PanelState, _instant: bool) {
        self.collapsed = target.is_collapsed();
    }

    fn set_transition_active(&mut self, active: bool) {
        self.transition_active = active;
    }

    fn style(&self) -> ViewportStyle {
        ViewportStyle {
            width: if self.collapsed {
                self.collapsed_width
            } else {
                self.expanded_width
            },
            collapsed_class: self.collapsed,
            transition_class: self.transition_active,
            transition_duration: if self.transition_active {
                self.duration
            } else {
                Duration::ZERO
            },
            easing: self.easing.clone(),
            trigger_label: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerStyling {
    expanded_width: f32,
    collapsed_width: f32,
    duration: Duration,
    easing: String,
    state: PanelState,
    instant: bool,
}

impl TriggerStyling {
    pub fn new(config: &PanelConfig, initial: PanelState) -> Self {
        Self {
            expanded_width: config.expanded_width,
            collapsed_width: config.collapsed_width,
            duration: config.transition_duration(),
            easing: config.easing.clone(),
            state: initial,
            instant: true,
        }
    }

    fn label(&self) -> &'static str {
        match self.state {
            PanelState::Expanded => "expanded",
            PanelState::Collapsed => "collapsed",
        }
    }
}

impl TransitionStyling for TriggerStyling {
    fn set_target(&mut self, target: PanelState, instant: bool) {
        self.state = target;
        self.instant = instant;
    }

    // The trigger animates on its own; there is no class to toggle.
    fn set_transition_active(&mut self, _active: bool) {}

    fn style(&self) -> ViewportStyle {
        ViewportStyle {
            width: match self.state {
                PanelState::Expanded => self.expanded_width,
                PanelState::Collapsed => self.collapsed_width,
            },
            collapsed_class: self.state.is_collapsed(),
            transition_class: false,
            transition_duration: if self.instant {
                Duration::ZERO
            } else {
                self.duration
            },
            easing: self.easing.clone(),
            trigger_label: Some(self.label()),
        }
    }
}
