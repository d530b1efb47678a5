//! Grid snapping for pointer positions and figure origins.

use crate::config::GridConfig;
use kurbo::{Point, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConstrainer {
    pub width: f64,
    pub height: f64,
}

impl GridConstrainer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Nearest grid point.
    pub fn constrain_point(&self, p: Point) -> Point {
        Point::new(
            (p.x / self.width).round() * self.width,
            (p.y / self.height).round() * self.height,
        )
    }

    /// Adjust a translation so that `origin + delta` lands on the grid.
    pub fn constrain_delta(&self, origin: Point, delta: Vec2) -> Vec2 {
        self.constrain_point(origin + delta) - origin
    }
}

impl From<&GridConfig> for GridConstrainer {
    fn from(grid: &GridConfig) -> Self {
        Self::new(grid.width, grid.height)
    }
}
