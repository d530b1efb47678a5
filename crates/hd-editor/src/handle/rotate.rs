//! Rotation about the centre of the owner's bounds.

use super::{Handle, HandleContext, HandleKind, Snapshot};
use crate::input::Modifiers;
use hd_core::{Boundable, Drawing, FigureId, geom};
use kurbo::{Affine, Point};
use std::f64::consts::PI;

/// Distance of the handle above the top edge.
pub const ROTATE_OFFSET: f64 = 20.0;
/// Angle increment with shift held.
pub const SNAP_ANGLE: f64 = PI / 12.0;

pub struct RotateHandle {
    owner: FigureId,
    snapshot: Option<Snapshot>,
}

impl RotateHandle {
    pub fn new(owner: FigureId) -> Self {
        Self {
            owner,
            snapshot: None,
        }
    }
}

impl Handle for RotateHandle {
    fn owner(&self) -> FigureId {
        self.owner
    }

    fn kind(&self) -> HandleKind {
        HandleKind::Rotate
    }

    fn locate(&self, drawing: &dyn Drawing) -> Option<Point> {
        let b = drawing.figure(self.owner)?.bounds();
        Some(Point::new(b.center().x, b.y0 - ROTATE_OFFSET))
    }

    fn label(&self) -> &'static str {
        "Rotate"
    }

    fn track_start(&mut self, ctx: &mut HandleContext<'_>, _anchor: Point, _m: Modifiers) {
        self.snapshot = Snapshot::take(ctx.drawing, self.owner);
    }

    fn track_step(&mut self, ctx: &mut HandleContext<'_>, anchor: Point, lead: Point, m: Modifiers) {
        let Some(snap) = &self.snapshot else {
            return;
        };
        let center = snap.bounds.center();
        let mut theta = geom::angle(center, lead) - geom::angle(center, anchor);
        if m.shift() {
            theta = (theta / SNAP_ANGLE).round() * SNAP_ANGLE;
        }
        snap.apply(ctx.drawing, |f| f.transform(Affine::rotate_about(theta, center)));
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
