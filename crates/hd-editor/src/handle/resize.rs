//! The eight resize handles on a figure's bounds.

use super::{Handle, HandleContext, HandleKind, Snapshot};
use crate::input::Modifiers;
use hd_core::{Boundable, Drawing, FigureId, RelativeLocator};
use kurbo::{Point, Rect};

pub struct ResizeHandle {
    owner: FigureId,
    locator: RelativeLocator,
    snapshot: Option<Snapshot>,
}

impl ResizeHandle {
    pub fn new(owner: FigureId, locator: RelativeLocator) -> Self {
        Self {
            owner,
            locator,
            snapshot: None,
        }
    }

    /// Corner and edge handles, clockwise from north-west.
    pub fn all(owner: FigureId) -> [Self; 8] {
        RelativeLocator::COMPASS.map(|l| Self::new(owner, l))
    }

    /// The bounds after dragging this handle to `lead`. Only the edges the
    /// locator sits on move.
    fn resized(&self, ctx: &HandleContext<'_>, old: Rect, anchor: Point, lead: Point) -> Rect {
        let start = self.locator.locate(old);
        let target = ctx.constrain(start + (lead - anchor));
        let (left, right, top, bottom) = self.locator.moves_edges();
        let mut r = old;
        if left {
            r.x0 = target.x;
        }
        if right {
            r.x1 = target.x;
        }
        if top {
            r.y0 = target.y;
        }
        if bottom {
            r.y1 = target.y;
        }
        r
    }
}

impl Handle for ResizeHandle {
    fn owner(&self) -> FigureId {
        self.owner
    }

    fn kind(&self) -> HandleKind {
        HandleKind::Resize(self.locator)
    }

    fn locate(&self, drawing: &dyn Drawing) -> Option<Point> {
        drawing
            .figure(self.owner)
            .map(|f| self.locator.locate(f.bounds()))
    }

    fn label(&self) -> &'static str {
        "Resize"
    }

    fn track_start(&mut self, ctx: &mut HandleContext<'_>, _anchor: Point, _m: Modifiers) {
        self.snapshot = Snapshot::take(ctx.drawing, self.owner);
    }

    fn track_step(&mut self, ctx: &mut HandleContext<'_>, anchor: Point, lead: Point, _m: Modifiers) {
        let Some(snap) = &self.snapshot else {
            return;
        };
        let r = self.resized(ctx, snap.bounds, anchor, lead);
        snap.apply(ctx.drawing, |f| {
            f.set_bounds(Point::new(r.x0, r.y0), Point::new(r.x1, r.y1));
        });
    }

    fn track_end(&mut self, ctx: &mut HandleContext<'_>, anchor: Point, lead: Point, m: Modifiers) {
        self.track_step(ctx, anchor, lead, m);
        if let Some(snap) = self.snapshot.take() {
            snap.commit(ctx.drawing, self.label());
        }
    }

    fn cancel(&mut self, ctx: &mut HandleContext<'_>) {
        if let Some(snap) = self.snapshot.take() {
            snap.restore(ctx.drawing);
        }
    }
}
