//! Connectors attach connection end points to figures.
//!
//! A connector names its owner by [`FigureId`], never by reference. The
//! drawing resolves owners when it lays a connection out.

use crate::figure::{Boundable, Figure, FigureKind};
use crate::geom::{chop_ellipse, chop_rect, length2};
use crate::id::FigureId;
use crate::locator::RelativeLocator;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Half-size of the square drawn for a visible connector.
pub const CONNECTOR_RADIUS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConnectorKind {
    /// Chops the owner's outline on the ray towards the opposite end.
    Chop,
    /// A fixed point relative to the owner's bounds.
    Locator(RelativeLocator),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub owner: FigureId,
    pub kind: ConnectorKind,
}

impl Connector {
    pub fn chop(owner: FigureId) -> Self {
        Self {
            owner,
            kind: ConnectorKind::Chop,
        }
    }

    pub fn at(owner: FigureId, locator: RelativeLocator) -> Self {
        Self {
            owner,
            kind: ConnectorKind::Locator(locator),
        }
    }

    /// The connector's hit box on `owner`.
    pub fn bounds(&self, owner: &Figure) -> Rect {
        match self.kind {
            ConnectorKind::Chop => owner.bounds(),
            ConnectorKind::Locator(l) => {
                Rect::from_center_size(l.locate(owner.bounds()), (0.0, 0.0))
                    .inflate(CONNECTOR_RADIUS, CONNECTOR_RADIUS)
            }
        }
    }

    pub fn center(&self, owner: &Figure) -> Point {
        self.bounds(owner).center()
    }

    /// The point where a connection leaving this connector towards `toward`
    /// touches the owner.
    pub fn find_point(&self, owner: &Figure, toward: Point) -> Point {
        match self.kind {
            ConnectorKind::Chop => match owner.kind {
                FigureKind::Ellipse { rect } => chop_ellipse(rect, toward),
                _ => chop_rect(owner.bounds(), toward),
            },
            ConnectorKind::Locator(l) => l.locate(owner.bounds()),
        }
    }
}

/// The standard connector set of a connectable figure: a chop connector
/// followed by the four edge midpoints.
pub fn standard_connectors(owner: FigureId) -> SmallVec<[Connector; 5]> {
    let mut out = SmallVec::new();
    out.push(Connector::chop(owner));
    for l in [
        RelativeLocator::NORTH,
        RelativeLocator::EAST,
        RelativeLocator::SOUTH,
        RelativeLocator::WEST,
    ] {
        out.push(Connector::at(owner, l));
    }
    out
}

/// The connector of `owner` whose box centre is nearest to `p`.
///
/// Ties keep the first connector in [`standard_connectors`] order.
pub fn nearest_connector(owner: &Figure, connectors: &[Connector], p: Point) -> Option<Connector> {
    let mut best: Option<(f64, Connector)> = None;
    for c in connectors {
        let d = length2(c.center(owner), p);
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, *c));
        }
    }
    best.map(|(_, c)| c)
}

// ─── Connection Layout ───────────────────────────────────────────────────

/// The geometry and attachments of a connection figure.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionData {
    pub points: SmallVec<[Point; 4]>,
    pub start: Option<Connector>,
    pub end: Option<Connector>,
}

impl ConnectionData {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            points: SmallVec::from_slice(&[start, end]),
            start: None,
            end: None,
        }
    }

    pub fn start_point(&self) -> Point {
        self.points.first().copied().unwrap_or(Point::ZERO)
    }

    pub fn end_point(&self) -> Point {
        self.points.last().copied().unwrap_or(Point::ZERO)
    }

    /// Owners this connection depends on.
    pub fn owners(&self) -> impl Iterator<Item = FigureId> + '_ {
        self.start.iter().chain(self.end.iter()).map(|c| c.owner)
    }

    /// Move the end points onto their connectors.
    ///
    /// `start_owner`/`end_owner` are the figures the connectors name; a
    /// missing owner leaves that end where it is.
    pub fn layout(&mut self, start_owner: Option<&Figure>, end_owner: Option<&Figure>) {
        if self.points.len() < 2 {
            return;
        }
        let n = self.points.len();
        let start = self.start.zip(start_owner);
        let end = self.end.zip(end_owner);

        // Each end aims at the neighbouring bend point, or at the centre of
        // the opposite connector for a straight connection.
        let toward_start = if n > 2 {
            self.points[1]
        } else {
            end.map_or(self.points[n - 1], |(c, f)| c.center(f))
        };
        let toward_end = if n > 2 {
            self.points[n - 2]
        } else {
            start.map_or(self.points[0], |(c, f)| c.center(f))
        };

        if let Some((c, f)) = start {
            self.points[0] = c.find_point(f, toward_start);
        }
        if let Some((c, f)) = end {
            self.points[n - 1] = c.find_point(f, toward_end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_prefers_first_on_tie() {
        let f = Figure::rectangle(Rect::new(0.0, 0.0, 20.0, 20.0));
        let cs = standard_connectors(f.id());
        assert_eq!(
            nearest_connector(&f, &cs, Point::new(10.0, 11.0)).map(|c| c.kind),
            Some(ConnectorKind::Chop)
        );
        assert_eq!(
            nearest_connector(&f, &cs, Point::new(21.0, 10.0)).map(|c| c.kind),
            Some(ConnectorKind::Locator(RelativeLocator::EAST))
        );
        // (17, 3) is equally far from the north and east midpoints.
        assert_eq!(
            nearest_connector(&f, &cs, Point::new(17.0, 3.0)).map(|c| c.kind),
            Some(ConnectorKind::Locator(RelativeLocator::NORTH))
        );
        // (15, 5) ties the chop connector too, which comes first.
        assert_eq!(
            nearest_connector(&f, &cs, Point::new(15.0, 5.0)).map(|c| c.kind),
            Some(ConnectorKind::Chop)
        );
    }

    #[test]
    fn layout_chops_both_ends() {
        let a = Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = Figure::rectangle(Rect::new(100.0, 0.0, 110.0, 10.0));
        let mut conn = ConnectionData::new(Point::new(5.0, 5.0), Point::new(105.0, 5.0));
        conn.start = Some(Connector::chop(a.id()));
        conn.end = Some(Connector::chop(b.id()));
        conn.layout(Some(&a), Some(&b));
        assert_eq!(conn.start_point(), Point::new(10.0, 5.0));
        assert_eq!(conn.end_point(), Point::new(100.0, 5.0));
    }

    #[test]
    fn layout_without_owner_keeps_point() {
        let b = Figure::rectangle(Rect::new(100.0, 0.0, 110.0, 10.0));
        let mut conn = ConnectionData::new(Point::new(5.0, 5.0), Point::new(105.0, 5.0));
        conn.end = Some(Connector::at(b.id(), RelativeLocator::WEST));
        conn.layout(None, Some(&b));
        assert_eq!(conn.start_point(), Point::new(5.0, 5.0));
        assert_eq!(conn.end_point(), Point::new(100.0, 5.0));
    }
}
