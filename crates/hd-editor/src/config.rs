//! Editor settings.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes.

use hd_core::{DrawingKind, QuadTreeConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Handle edge length in view pixels.
    pub handle_size: f64,
    /// Pointer slop in view pixels. Drags shorter than this count as clicks.
    pub tolerance: f64,
    /// Undo history depth.
    pub undo_limit: usize,
    /// Snap grid. `None` disables snapping.
    pub grid: Option<GridConfig>,
    /// Drawing implementation for new and loaded documents.
    pub drawing: DrawingKind,
    pub quadtree: QuadTreeConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_size: 7.0,
            tolerance: 2.0,
            undo_limit: 100,
            grid: None,
            drawing: DrawingKind::QuadTree,
            quadtree: QuadTreeConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: f64,
    pub height: f64,
    /// Whether the view paints the grid lines.
    pub visible: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 8.0,
            height: 8.0,
            visible: true,
        }
    }
}
