//! Locators map a figure's bounds to a point on or inside it.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A point expressed as a fraction of a rectangle's width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeLocator {
    pub rel_x: f64,
    pub rel_y: f64,
}

impl RelativeLocator {
    pub const fn new(rel_x: f64, rel_y: f64) -> Self {
        Self { rel_x, rel_y }
    }

    pub const NORTH_WEST: Self = Self::new(0.0, 0.0);
    pub const NORTH: Self = Self::new(0.5, 0.0);
    pub const NORTH_EAST: Self = Self::new(1.0, 0.0);
    pub const EAST: Self = Self::new(1.0, 0.5);
    pub const SOUTH_EAST: Self = Self::new(1.0, 1.0);
    pub const SOUTH: Self = Self::new(0.5, 1.0);
    pub const SOUTH_WEST: Self = Self::new(0.0, 1.0);
    pub const WEST: Self = Self::new(0.0, 0.5);
    pub const CENTER: Self = Self::new(0.5, 0.5);

    /// The eight compass points in clockwise order from north-west.
    pub const COMPASS: [Self; 8] = [
        Self::NORTH_WEST,
        Self::NORTH,
        Self::NORTH_EAST,
        Self::EAST,
        Self::SOUTH_EAST,
        Self::SOUTH,
        Self::SOUTH_WEST,
        Self::WEST,
    ];

    pub fn locate(&self, bounds: Rect) -> Point {
        let b = bounds.abs();
        Point::new(
            b.x0 + b.width() * self.rel_x,
            b.y0 + b.height() * self.rel_y,
        )
    }

    /// Whether moving this locator changes the left/right/top/bottom edge.
    pub fn moves_edges(&self) -> (bool, bool, bool, bool) {
        (
            self.rel_x == 0.0,
            self.rel_x == 1.0,
            self.rel_y == 0.0,
            self.rel_y == 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compass_points() {
        let r = Rect::new(10.0, 20.0, 30.0, 60.0);
        assert_eq!(RelativeLocator::NORTH_WEST.locate(r), Point::new(10.0, 20.0));
        assert_eq!(RelativeLocator::EAST.locate(r), Point::new(30.0, 40.0));
        assert_eq!(RelativeLocator::CENTER.locate(r), r.center());
    }

    #[test]
    fn edge_flags() {
        assert_eq!(RelativeLocator::NORTH.moves_edges(), (false, false, true, false));
        assert_eq!(RelativeLocator::SOUTH_EAST.moves_edges(), (false, true, false, true));
    }
}
