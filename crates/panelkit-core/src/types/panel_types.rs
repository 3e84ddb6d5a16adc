//! Panel transition types

use serde::{Deserialize, Serialize};

/// Resting visual state of a collapsible panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    Expanded,
    Collapsed,
}

impl PanelState {
    pub fn from_collapsed(collapsed: bool) -> Self {
        if collapsed {
            Self::Collapsed
        } else {
            Self::Expanded
        }
    }

    pub fn is_collapsed(self) -> bool {
        self == Self::Collapsed
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Expanded => Self::Collapsed,
            Self::Collapsed => Self::Expanded,
        }
    }
}

/// Result label a toggle resolves with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleResult {
    Collapsed,
    Expanded,
}

impl ToggleResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::Expanded => "expanded",
        }
    }
}

impl From<PanelState> for ToggleResult {
    fn from(state: PanelState) -> Self {
        match state {
            PanelState::Expanded => Self::Expanded,
            PanelState::Collapsed => Self::Collapsed,
        }
    }
}

impl std::fmt::Display for ToggleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition state of a panel controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    IdleExpanded,
    IdleCollapsed,
    Transitioning { target: PanelState, instant: bool },
}

impl TransitionState {
    pub fn idle(state: PanelState) -> Self {
        match state {
            PanelState::Expanded => Self::IdleExpanded,
            PanelState::Collapsed => Self::IdleCollapsed,
        }
    }

    /// State the panel is at rest in or heading towards
    pub fn target(&self) -> PanelState {
        match self {
            Self::IdleExpanded => PanelState::Expanded,
            Self::IdleCollapsed => PanelState::Collapsed,
            Self::Transitioning { target, .. } => *target,
        }
    }

    pub fn is_idle(&self) -> bool {
        !matches!(self, Self::Transitioning { .. })
    }
}

/// Phase boundary reported by the styling engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEvent {
    pub from: PanelState,
    pub to: PanelState,
}

impl PhaseEvent {
    pub fn new(from: PanelState, to: PanelState) -> Self {
        Self { from, to }
    }

    /// Whether the event describes an actual change of state
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

/// Events a panel controller publishes to its collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// A transition towards the collapsed state is about to play
    CollapsedStart,
    /// A transition towards the expanded state is about to play
    ExpandedStart,
    /// A transition finished; carries whether the panel is now collapsed
    CollapsedChange(bool),
}

