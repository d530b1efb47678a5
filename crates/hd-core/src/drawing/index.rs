//! Candidate selection for spatial queries.
//!
//! A drawing asks its index for the figures that might answer a query and
//! then filters and orders them itself, so both implementations return the
//! same answers in the same z-order.

use crate::id::FigureId;
use crate::quadtree::QuadTree;
use kurbo::{Point, Rect};
use std::collections::HashSet;

pub trait FigureIndex: Default + Send {
    fn insert(&mut self, id: FigureId, draw_bounds: Rect);
    fn remove(&mut self, id: FigureId);
    fn clear(&mut self);
    /// Figures whose draw bounds may contain `p`. `None` means "all of them".
    fn query_point(&self, p: Point) -> Option<HashSet<FigureId>>;
    /// Figures whose draw bounds may intersect `r`. `None` means "all of them".
    fn query_rect(&self, r: Rect) -> Option<HashSet<FigureId>>;
}

/// No index: every query scans the whole figure list.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearScan;

impl FigureIndex for LinearScan {
    fn insert(&mut self, _id: FigureId, _draw_bounds: Rect) {}

    fn remove(&mut self, _id: FigureId) {}

    fn clear(&mut self) {}

    fn query_point(&self, _p: Point) -> Option<HashSet<FigureId>> {
        None
    }

    fn query_rect(&self, _r: Rect) -> Option<HashSet<FigureId>> {
        None
    }
}

impl FigureIndex for QuadTree<FigureId> {
    fn insert(&mut self, id: FigureId, draw_bounds: Rect) {
        self.add(id, draw_bounds);
    }

    fn remove(&mut self, id: FigureId) {
        QuadTree::remove(self, &id);
    }

    fn clear(&mut self) {
        QuadTree::clear(self);
    }

    fn query_point(&self, p: Point) -> Option<HashSet<FigureId>> {
        Some(self.find_contains(p))
    }

    fn query_rect(&self, r: Rect) -> Option<HashSet<FigureId>> {
        Some(self.find_intersects(r))
    }
}
