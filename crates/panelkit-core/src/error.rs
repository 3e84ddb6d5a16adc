//! Error types for PanelKit Core
//!
//! Resize observation and panel transitions degrade silently instead of
//! failing, so errors only come from configuration and host start-up.

use thiserror::Error;

/// Main error type for PanelKit operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Configuration validation errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid width: {0}")]
    InvalidWidth(String),

    #[error("Collapsed width {collapsed} must be smaller than expanded width {expanded}")]
    WidthOrder { collapsed: f32, expanded: f32 },

    #[error("Channel capacity must be greater than zero")]
    ZeroCapacity,
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
