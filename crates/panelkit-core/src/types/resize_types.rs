//! Types describing observed elements and their size changes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, identity-comparable handle to a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Width and height of a box in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// One raw size-change record as reported by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeEntry {
    pub element: ElementId,
    pub content_size: Size,
    pub observed_at: chrono::DateTime<chrono::Utc>,
}

impl ResizeEntry {
    pub fn new(element: ElementId, content_size: Size) -> Self {
        Self {
            element,
            content_size,
            observed_at: chrono::Utc::now(),
        }
    }
}

/// A batch of entries delivered by a single platform callback
pub type ResizeBatch = Vec<ResizeEntry>;
