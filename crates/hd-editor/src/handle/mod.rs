//! Handles: small draggable affordances attached to selected figures.
//!
//! A gesture on a handle runs `track_start`, any number of `track_step`s and
//! then either `track_end` or `cancel`. Steps change the figure
//! provisionally through [`Drawing::update_figure`], which records nothing.
//! `track_end` queues exactly one undoable edit summarising the whole
//! gesture, and `cancel` puts the figure back the way `track_start` found it.

mod connection;
mod move_handle;
mod resize;
mod rotate;

pub use connection::{ConnectionEnd, ConnectionEndHandle, ConnectorHandle};
pub(crate) use connection::{ConnectionTracker, find_target};
pub use move_handle::MoveHandle;
pub use resize::ResizeHandle;
pub use rotate::RotateHandle;

use crate::constrainer::GridConstrainer;
use crate::input::Modifiers;
use hd_core::{
    Boundable, Color, Connectable, Drawing, DrawingEvent, Figure, FigureGeometry, FigureId, Graphics,
    RelativeLocator, UndoRedoManager, UndoableEdit,
};
use kurbo::{Point, Rect, Shape};
use std::borrow::Cow;

/// What a handle needs from the editor while tracking.
pub struct HandleContext<'a> {
    pub drawing: &'a mut dyn Drawing,
    pub undo: &'a mut UndoRedoManager,
    pub constrainer: Option<GridConstrainer>,
}

impl HandleContext<'_> {
    pub fn constrain(&self, p: Point) -> Point {
        self.constrainer.map_or(p, |g| g.constrain_point(p))
    }
}

/// Handle families. Handles of the same family on different figures can be
/// dragged together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleKind {
    Move(RelativeLocator),
    Resize(RelativeLocator),
    Rotate,
    Connector,
    ConnectionEnd(ConnectionEnd),
}

pub trait Handle: Send {
    /// The figure this handle manipulates.
    fn owner(&self) -> FigureId;
    fn kind(&self) -> HandleKind;

    /// Handle centre in drawing coordinates, or `None` once the owner is gone.
    fn locate(&self, drawing: &dyn Drawing) -> Option<Point>;

    /// Name of the edit the gesture produces.
    fn label(&self) -> &'static str;

    fn track_start(&mut self, ctx: &mut HandleContext<'_>, anchor: Point, modifiers: Modifiers);
    fn track_step(
        &mut self,
        ctx: &mut HandleContext<'_>,
        anchor: Point,
        lead: Point,
        modifiers: Modifiers,
    );
    fn track_end(
        &mut self,
        ctx: &mut HandleContext<'_>,
        anchor: Point,
        lead: Point,
        modifiers: Modifiers,
    );
    fn cancel(&mut self, ctx: &mut HandleContext<'_>);

    /// Whether a drag on `other` should also drive this handle.
    fn is_combinable_with(&self, other: &dyn Handle) -> bool {
        let combinable = matches!(
            self.kind(),
            HandleKind::Move(_) | HandleKind::Resize(_) | HandleKind::Rotate
        );
        combinable && self.kind() == other.kind() && self.owner() != other.owner()
    }

    /// Hit area in drawing coordinates for a handle `size` units wide.
    fn bounds(&self, drawing: &dyn Drawing, size: f64) -> Option<Rect> {
        self.locate(drawing).map(|c| handle_rect(c, size))
    }

    fn draw(&self, drawing: &dyn Drawing, g: &mut dyn Graphics, size: f64) {
        if let Some(r) = self.bounds(drawing, size) {
            let path = r.to_path(0.1);
            g.fill_path(&path, Color::WHITE);
            g.stroke_path(&path, Color::BLACK, 1.0);
        }
    }
}

impl std::fmt::Debug for dyn Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("owner", &self.owner())
            .field("kind", &self.kind())
            .finish()
    }
}

pub fn handle_rect(center: Point, size: f64) -> Rect {
    let half = size / 2.0;
    Rect::new(center.x - half, center.y - half, center.x + half, center.y + half)
}

// ─── Snapshots ───────────────────────────────────────────────────────────

/// Geometry captured at `track_start`.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    id: FigureId,
    before: FigureGeometry,
    pub(crate) bounds: Rect,
}

impl Snapshot {
    pub(crate) fn take(drawing: &dyn Drawing, id: FigureId) -> Option<Self> {
        let figure = drawing.figure(id)?;
        Some(Self {
            id,
            before: figure.geometry(),
            bounds: figure.bounds(),
        })
    }

    /// Reset to the snapshot, then apply `f`.
    pub(crate) fn apply(&self, drawing: &mut dyn Drawing, f: impl Fn(&mut Figure)) {
        drawing.update_figure(self.id, &mut |fig| {
            fig.restore_geometry(&self.before);
            f(fig);
        });
    }

    pub(crate) fn restore(&self, drawing: &mut dyn Drawing) {
        self.apply(drawing, |_| {});
    }

    /// Queue one geometry edit from the snapshot to the current state.
    /// Nothing is queued when the gesture left the figure unchanged.
    pub(crate) fn commit(
        self,
        drawing: &mut dyn Drawing,
        label: impl Into<Cow<'static, str>>,
    ) -> bool {
        let Some(after) = drawing.figure(self.id).map(Figure::geometry) else {
            return false;
        };
        if after == self.before {
            return false;
        }
        drawing.fire_undoable_edit(UndoableEdit::geometry(self.id, self.before, after, label));
        true
    }
}

/// Take a provisional figure back out of the drawing without an edit,
/// repainting the area it covered.
pub(crate) fn discard_provisional(drawing: &mut dyn Drawing, id: FigureId) -> Option<Figure> {
    let (_, figure) = drawing.basic_remove(id)?;
    drawing.listeners().emit(&DrawingEvent::AreaInvalidated {
        figure: Some(id),
        area: figure.draw_bounds(),
    });
    Some(figure)
}

/// Toggle the connector affordance on `id` without recording an edit.
pub(crate) fn show_connectors(drawing: &mut dyn Drawing, id: FigureId, visible: bool) {
    if drawing
        .figure(id)
        .is_some_and(|f| f.connectors_visible() != visible)
    {
        drawing.update_figure(id, &mut |f| f.set_connectors_visible(visible));
    }
}
