//! Corner markers that translate their owner.

use super::{Handle, HandleContext, HandleKind, Snapshot};
use crate::input::Modifiers;
use hd_core::{Boundable, Drawing, FigureId, RelativeLocator, geom};
use kurbo::{Affine, Point, Vec2};

pub struct MoveHandle {
    owner: FigureId,
    locator: RelativeLocator,
    snapshot: Option<Snapshot>,
}

impl MoveHandle {
    pub fn new(owner: FigureId, locator: RelativeLocator) -> Self {
        Self {
            owner,
            locator,
            snapshot: None,
        }
    }

    /// One handle on each corner of `owner`.
    pub fn corners(owner: FigureId) -> [Self; 4] {
        [
            RelativeLocator::NORTH_WEST,
            RelativeLocator::NORTH_EAST,
            RelativeLocator::SOUTH_EAST,
            RelativeLocator::SOUTH_WEST,
        ]
        .map(|l| Self::new(owner, l))
    }

    fn translation(ctx: &HandleContext<'_>, snap: &Snapshot, anchor: Point, lead: Point, m: Modifiers) -> Vec2 {
        let mut delta = lead - anchor;
        if m.shift() {
            delta = geom::dominant_axis(delta);
        }
        match ctx.constrainer {
            Some(grid) => grid.constrain_delta(snap.bounds.origin(), delta),
            None => delta,
        }
    }
}

impl Handle for MoveHandle {
    fn owner(&self) -> FigureId {
        self.owner
    }

    fn kind(&self) -> HandleKind {
        HandleKind::Move(self.locator)
    }

    fn locate(&self, drawing: &dyn Drawing) -> Option<Point> {
        drawing
            .figure(self.owner)
            .map(|f| self.locator.locate(f.bounds()))
    }

    fn label(&self) -> &'static str {
        "Move"
    }

    fn track_start(&mut self, ctx: &mut HandleContext<'_>, _anchor: Point, _m: Modifiers) {
        self.snapshot = Snapshot::take(ctx.drawing, self.owner);
    }

    fn track_step(&mut self, ctx: &mut HandleContext<'_>, anchor: Point, lead: Point, m: Modifiers) {
        let Some(snap) = &self.snapshot else {
            return;
        };
        let delta = Self::translation(ctx, snap, anchor, lead, m);
        snap.apply(ctx.drawing, |f| f.transform(Affine::translate(delta)));
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
