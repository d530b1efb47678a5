//! Gesture trackers the selection tool delegates to between pointer-down and
//! pointer-up.

use super::ToolContext;
use crate::handle::{Handle, Snapshot};
use crate::input::Modifiers;
use hd_core::{Boundable, CompositeToken, FigureId, geom};
use kurbo::{Affine, Point, Rect};

/// Close a gesture's composite after collecting whatever the gesture queued.
fn close(ctx: &mut ToolContext<'_>, token: CompositeToken) {
    ctx.undo.absorb(ctx.drawing);
    if let Err(e) = ctx.undo.end(token) {
        log::warn!("closing gesture: {e}");
    }
}

// ─── Handle Tracker ──────────────────────────────────────────────────────

/// Drags a handle, together with every combinable handle of the other
/// selected figures.
pub(crate) struct HandleTracker {
    handles: Vec<Box<dyn Handle>>,
    anchor: Point,
    token: CompositeToken,
}

impl HandleTracker {
    pub(crate) fn start(
        ctx: &mut ToolContext<'_>,
        primary: Box<dyn Handle>,
        anchor: Point,
        m: Modifiers,
    ) -> Self {
        let mut handles: Vec<Box<dyn Handle>> = ctx
            .view
            .handles(ctx.drawing)
            .into_iter()
            .filter(|h| h.is_combinable_with(primary.as_ref()))
            .collect();
        handles.insert(0, primary);
        log::trace!("tracking {} handle(s) from {anchor:?}", handles.len());

        let token = ctx.undo.begin(handles[0].label());
        let mut hctx = ctx.handle_context();
        for h in &mut handles {
            h.track_start(&mut hctx, anchor, m);
        }
        Self {
            handles,
            anchor,
            token,
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut ToolContext<'_>, lead: Point, m: Modifiers) {
        let mut hctx = ctx.handle_context();
        for h in &mut self.handles {
            h.track_step(&mut hctx, self.anchor, lead, m);
        }
    }

    pub(crate) fn end(mut self, ctx: &mut ToolContext<'_>, lead: Point, m: Modifiers) {
        let mut hctx = ctx.handle_context();
        for h in &mut self.handles {
            h.track_end(&mut hctx, self.anchor, lead, m);
        }
        close(ctx, self.token);
    }

    pub(crate) fn cancel(mut self, ctx: &mut ToolContext<'_>) {
        let mut hctx = ctx.handle_context();
        for h in &mut self.handles {
            h.cancel(&mut hctx);
        }
        close(ctx, self.token);
    }
}

// ─── Drag Tracker ────────────────────────────────────────────────────────

/// Moves the whole selection. Connections attached at both ends are left to
/// follow their owners.
pub(crate) struct DragTracker {
    snapshots: Vec<Snapshot>,
    anchor: Point,
    /// Selection origin at the start, for grid snapping.
    origin: Point,
    token: CompositeToken,
}

impl DragTracker {
    pub(crate) fn start(ctx: &mut ToolContext<'_>, anchor: Point) -> Self {
        let ids = ctx.view.selection_in_z_order(ctx.drawing);
        let drawing = &*ctx.drawing;
        let movable = |id: &FigureId| {
            drawing
                .figure(*id)
                .and_then(|f| f.connection())
                .is_none_or(|c| c.start.is_none() || c.end.is_none())
        };
        let snapshots: Vec<Snapshot> = ids
            .into_iter()
            .filter(movable)
            .filter_map(|id| Snapshot::take(drawing, id))
            .collect();
        let origin = geom::union_all(snapshots.iter().map(|s| s.bounds))
            .map_or(anchor, |r| r.origin());
        let token = ctx.undo.begin("Move");
        Self {
            snapshots,
            anchor,
            origin,
            token,
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut ToolContext<'_>, lead: Point, m: Modifiers) {
        let mut delta = lead - self.anchor;
        if m.shift() {
            delta = geom::dominant_axis(delta);
        }
        if let Some(grid) = ctx.view.constrainer() {
            delta = grid.constrain_delta(self.origin, delta);
        }
        let t = Affine::translate(delta);
        for s in &self.snapshots {
            s.apply(ctx.drawing, |f| f.transform(t));
        }
    }

    pub(crate) fn end(mut self, ctx: &mut ToolContext<'_>, lead: Point, m: Modifiers) {
        self.step(ctx, lead, m);
        for s in self.snapshots {
            s.commit(ctx.drawing, "Move");
        }
        close(ctx, self.token);
    }

    pub(crate) fn cancel(self, ctx: &mut ToolContext<'_>) {
        for s in &self.snapshots {
            s.restore(ctx.drawing);
        }
        close(ctx, self.token);
    }
}

// ─── Select Area Tracker ─────────────────────────────────────────────────

/// Rubber-band selection of the figures lying wholly inside the dragged
/// rectangle.
pub(crate) struct SelectAreaTracker {
    anchor: Point,
    additive: bool,
}

impl SelectAreaTracker {
    pub(crate) fn start(ctx: &mut ToolContext<'_>, anchor: Point, additive: bool) -> Self {
        if !additive {
            ctx.view.clear_selection();
        }
        ctx.view.set_rubber_band(Some(Rect::from_points(anchor, anchor)));
        Self { anchor, additive }
    }

    pub(crate) fn step(&mut self, ctx: &mut ToolContext<'_>, lead: Point) {
        ctx.view
            .set_rubber_band(Some(Rect::from_points(self.anchor, lead)));
    }

    pub(crate) fn end(self, ctx: &mut ToolContext<'_>, lead: Point) {
        let area = Rect::from_points(self.anchor, lead);
        let found = ctx.drawing.find_figures_within(area);
        if !self.additive {
            ctx.view.clear_selection();
        }
        for id in found {
            ctx.view.add_to_selection(id);
        }
        ctx.view.set_rubber_band(None);
    }

    pub(crate) fn cancel(self, ctx: &mut ToolContext<'_>) {
        ctx.view.set_rubber_band(None);
    }
}
