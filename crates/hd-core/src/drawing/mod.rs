//! The drawing: an ordered, z-sorted collection of figures with spatial
//! queries, change notification and edit recording.
//!
//! List order is back-to-front: the last figure in [`Drawing::children`] is
//! the front-most within its layer. Figures on a higher
//! [`AttributeKey::Layer`](crate::AttributeKey::Layer) always draw in front of
//! lower layers; within a layer the list order decides. The sorted order is
//! cached and only recomputed before an order-dependent query, which is why
//! those queries take `&mut self`.
//!
//! Mutating operations come in two flavours. `add`, `remove`, `bring_to_front`
//! and friends notify listeners and queue an [`UndoableEdit`] that the owner
//! collects with [`Drawing::take_edits`]. The `basic_*` variants only change
//! the structure.

mod index;
mod indexed;

pub use index::{FigureIndex, LinearScan};
pub use indexed::IndexedDrawing;

use crate::attribute::{AttributeKey, AttributeValue};
use crate::config::QuadTreeConfig;
use crate::event::Listeners;
use crate::figure::Figure;
use crate::graphics::Graphics;
use crate::id::FigureId;
use crate::quadtree::QuadTree;
use crate::undo::UndoableEdit;
use kurbo::{Affine, Point, Rect};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Drawing backed by a plain list scan.
pub type DefaultDrawing = IndexedDrawing<LinearScan>;
/// Drawing whose queries are narrowed by a quad-tree over draw bounds.
pub type QuadTreeDrawing = IndexedDrawing<QuadTree<FigureId>>;

/// The lock shared between the UI thread and background load/save.
pub type SharedDrawing = Arc<Mutex<Box<dyn Drawing>>>;

pub fn shared(drawing: Box<dyn Drawing>) -> SharedDrawing {
    Arc::new(Mutex::new(drawing))
}

/// Selects a drawing implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingKind {
    #[default]
    Default,
    QuadTree,
}

impl DrawingKind {
    pub fn create(self) -> Box<dyn Drawing> {
        match self {
            DrawingKind::Default => Box::new(DefaultDrawing::new()),
            DrawingKind::QuadTree => Box::new(QuadTreeDrawing::new()),
        }
    }

    /// Like [`DrawingKind::create`], with a tuned quad-tree.
    pub fn create_with(self, config: QuadTreeConfig) -> Box<dyn Drawing> {
        match self {
            DrawingKind::Default => Box::new(DefaultDrawing::new()),
            DrawingKind::QuadTree => Box::new(QuadTreeDrawing::with_index(QuadTree::new(
                crate::quadtree::DEFAULT_ROOT,
                config,
            ))),
        }
    }
}

pub trait Drawing: Send {
    // ─── Structure ───────────────────────────────────────────────────────

    /// Append `figure` at the front of its layer.
    fn add(&mut self, figure: Figure) -> FigureId {
        let n = self.figure_count();
        self.add_at(n, figure)
    }

    /// Insert `figure` at list position `index` (clamped), notifying
    /// listeners and queueing one edit.
    fn add_at(&mut self, index: usize, figure: Figure) -> FigureId;

    /// Remove a figure, notifying listeners and queueing one edit.
    ///
    /// Removing an absent figure returns `None` and only invalidates an empty
    /// area.
    fn remove(&mut self, id: FigureId) -> Option<Figure>;

    fn basic_add(&mut self, figure: Figure) -> FigureId {
        let n = self.figure_count();
        self.basic_add_at(n, figure)
    }

    fn basic_add_at(&mut self, index: usize, figure: Figure) -> FigureId;

    /// Remove without notification, returning the former list index too.
    fn basic_remove(&mut self, id: FigureId) -> Option<(usize, Figure)>;

    /// Drop every figure without notification or edits.
    fn clear(&mut self);

    // ─── Membership ──────────────────────────────────────────────────────

    fn contains(&self, id: FigureId) -> bool;
    fn figure_count(&self) -> usize;
    fn figure(&self, id: FigureId) -> Option<&Figure>;
    fn index_of(&self, id: FigureId) -> Option<usize>;
    /// Figures in list order.
    fn children(&self) -> &[FigureId];
    /// Figures in z-order, back to front.
    fn sorted_children(&mut self) -> Vec<FigureId>;

    // ─── Queries ─────────────────────────────────────────────────────────

    /// The front-most visible figure containing `p`.
    fn find_figure(&mut self, p: Point) -> Option<FigureId> {
        self.find_figure_except(p, &HashSet::new())
    }

    fn find_figure_except(&mut self, p: Point, ignore: &HashSet<FigureId>) -> Option<FigureId>;
    /// Visible figures whose draw bounds intersect `r`, back to front.
    fn find_figures(&mut self, r: Rect) -> Vec<FigureId>;
    /// Visible figures whose bounds lie inside `r`, back to front.
    fn find_figures_within(&mut self, r: Rect) -> Vec<FigureId>;

    // ─── Z-order ─────────────────────────────────────────────────────────

    /// Move a figure to list position `index` (clamped), returning its old
    /// position. Queues a z-order edit only if the position changed.
    fn move_to(&mut self, id: FigureId, index: usize) -> Option<usize>;

    /// Move a figure to the front of z-order (last in the list).
    /// Returns true if the order changed.
    fn bring_to_front(&mut self, id: FigureId) -> bool {
        let last = self.figure_count().saturating_sub(1);
        matches!(self.move_to(id, last), Some(old) if old != last)
    }

    /// Move a figure to the back of z-order. Returns true if the order changed.
    fn send_to_back(&mut self, id: FigureId) -> bool {
        matches!(self.move_to(id, 0), Some(old) if old != 0)
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Run `mutate` inside the will-change/changed bracket: invalidate the old
    /// and new draw bounds, re-index, relayout connections, and emit
    /// `FigureChanged`. Records no edit. Returns false for an absent figure.
    fn update_figure(&mut self, id: FigureId, mutate: &mut dyn FnMut(&mut Figure)) -> bool;

    /// Set (or with `None`, clear) an attribute and queue an attribute edit.
    fn set_attribute(
        &mut self,
        id: FigureId,
        key: AttributeKey,
        value: Option<AttributeValue>,
    ) -> bool;

    /// Apply `t` to every figure in `ids`, queueing one geometry edit each.
    fn transform_figures(&mut self, ids: &[FigureId], t: Affine);

    // ─── Connections ─────────────────────────────────────────────────────

    /// Connections in the drawing attached to `id`.
    fn dependent_connections(&self, id: FigureId) -> Vec<FigureId>;

    // ─── Painting ────────────────────────────────────────────────────────

    /// Paint visible figures whose draw bounds intersect `clip`, back to front.
    fn draw(&mut self, g: &mut dyn Graphics, clip: Rect);

    /// Union of all draw bounds.
    fn draw_bounds(&self) -> Option<Rect>;

    // ─── Listeners & Edits ───────────────────────────────────────────────

    fn listeners(&mut self) -> &mut Listeners;
    fn fire_undoable_edit(&mut self, edit: UndoableEdit);
    /// Drain the edits queued since the last call.
    fn take_edits(&mut self) -> Vec<UndoableEdit>;
}
