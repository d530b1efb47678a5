//! Tuning knobs for the spatial index.

use serde::{Deserialize, Serialize};

/// Configuration for [`QuadTree`](crate::quadtree::QuadTree).
///
/// All fields fall back to their defaults when missing from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// Entries a leaf holds before it tries to split.
    pub max_capacity: usize,
    /// Leaves this wide or high (or smaller) never split.
    pub min_size: f64,
    /// Out-of-bounds entries tolerated before the tree is reorganized.
    pub max_overflow: usize,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_capacity: 32,
            min_size: 32.0,
            max_overflow: 32,
        }
    }
}
