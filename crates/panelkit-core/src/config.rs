//! Panel configuration

use crate::error::{ConfigError, Result};
use crate::resize::DEFAULT_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// How the panel's transition is expressed to the styling engine
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StylingKind {
    /// Toggle a collapsed class and a transient transition class
    #[default]
    ClassToggle,
    /// Declarative trigger with labelled width states
    Trigger,
}

/// Resize observation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResizeConfig {
    /// Debounce interval for margin recomputation; none delivers immediately
    pub debounce_ms: Option<u64>,
    /// Buffer of each element's broadcast channel
    pub channel_capacity: usize,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ResizeConfig {
    pub fn debounce(&self) -> Option<Duration> {
        self.debounce_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelConfig {
    pub expanded_width: f32,
    pub collapsed_width: f32,
    pub transition_duration_ms: u64,
    pub easing: String,
    pub styling: StylingKind,
    pub initially_collapsed: bool,
    pub resize: ResizeConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            expanded_width: 256.0,
            collapsed_width: 68.0,
            transition_duration_ms: 300,
            easing: "cubic-bezier(0.25, 0.8, 0.25, 1)".to_string(),
            styling: StylingKind::default(),
            initially_collapsed: false,
            resize: ResizeConfig::default(),
        }
    }
}

impl PanelConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No panel config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        info!("Loading panel config from {:?}", path);
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, width) in [
            ("expandedWidth", self.expanded_width),
            ("collapsedWidth", self.collapsed_width),
        ] {
            if !width.is_finite() || width < 0.0 {
                return Err(ConfigError::InvalidWidth(format!("{} = {}", name, width)));
            }
        }

        if self.collapsed_width >= self.expanded_width {
            return Err(ConfigError::WidthOrder {
                collapsed: self.collapsed_width,
                expanded: self.expanded_width,
            });
        }

        if self.resize.channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(())
    }

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms)
    }

    pub fn width_for(&self, collapsed: bool) -> f32 {
        if collapsed {
            self.collapsed_width
        } else {
            self.expanded_width
        }
    }
}
