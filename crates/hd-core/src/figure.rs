//! Figures: the drawable, attributed model entities held by a drawing.
//!
//! A figure is a tagged [`FigureKind`] plus its [`Attributes`]. Behaviour is
//! split across a few capability traits rather than a class hierarchy:
//! [`Boundable`], [`Paintable`], [`Connectable`] and [`TextHolding`].

use crate::attribute::{AttributeKey, AttributeValue, Attributes, Color};
use crate::connector::{ConnectionData, Connector, nearest_connector, standard_connectors};
use crate::geom::{
    ellipse_contains, map_between, polyline_contains_point, rect_contains, union_all,
};
use crate::graphics::Graphics;
use crate::id::FigureId;
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, Shape, Vec2};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Minimum distance within which a thin stroke still counts as hit.
pub const HIT_TOLERANCE: f64 = 2.0;
/// Length of an arrow tip.
pub const ARROW_SIZE: f64 = 8.0;
/// Advance of one character as a fraction of the font size.
const CHAR_WIDTH: f64 = 0.6;
/// Line height as a fraction of the font size.
const LINE_HEIGHT: f64 = 1.2;
/// Tolerance used when flattening shapes to paths.
const PATH_TOLERANCE: f64 = 0.1;

// ─── Figure Kinds ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum FigureKind {
    Rectangle { rect: Rect },
    Ellipse { rect: Rect },
    /// Open polyline through two or more points.
    Line { points: SmallVec<[Point; 4]> },
    /// Text whose top-left corner is at `origin`.
    Text { origin: Point, text: String },
    Group { children: Vec<Figure> },
    Connection(ConnectionData),
}

impl FigureKind {
    /// Tag used by the persistence layer.
    pub fn tag(&self) -> &'static str {
        match self {
            FigureKind::Rectangle { .. } => "rect",
            FigureKind::Ellipse { .. } => "ellipse",
            FigureKind::Line { .. } => "line",
            FigureKind::Text { .. } => "text",
            FigureKind::Group { .. } => "group",
            FigureKind::Connection(_) => "connection",
        }
    }
}

/// A snapshot of everything that positions a figure.
///
/// Restoring a snapshot is exact, so it backs both gesture cancellation and
/// geometry edits.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureGeometry(FigureKind);

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    id: FigureId,
    pub kind: FigureKind,
    pub attributes: Attributes,
    connectors_visible: bool,
}

// ─── Construction ────────────────────────────────────────────────────────

impl Figure {
    pub fn new(kind: FigureKind) -> Self {
        Self {
            id: FigureId::next(),
            kind,
            attributes: Attributes::new(),
            connectors_visible: false,
        }
    }

    pub fn rectangle(rect: Rect) -> Self {
        Self::new(FigureKind::Rectangle { rect: rect.abs() })
    }

    pub fn ellipse(rect: Rect) -> Self {
        Self::new(FigureKind::Ellipse { rect: rect.abs() })
    }

    pub fn line(start: Point, end: Point) -> Self {
        Self::polyline([start, end])
    }

    pub fn polyline(points: impl IntoIterator<Item = Point>) -> Self {
        Self::new(FigureKind::Line {
            points: points.into_iter().collect(),
        })
    }

    pub fn text(origin: Point, text: impl Into<String>) -> Self {
        Self::new(FigureKind::Text {
            origin,
            text: text.into(),
        })
    }

    pub fn group(children: Vec<Figure>) -> Self {
        Self::new(FigureKind::Group { children })
    }

    pub fn new_connection(start: Point, end: Point) -> Self {
        Self::new(FigureKind::Connection(ConnectionData::new(start, end)))
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: AttributeKey, value: AttributeValue) -> Self {
        self.attributes.set(key, Some(value));
        self
    }

    /// Rebuild a figure with a known id (used when loading).
    pub(crate) fn with_id(mut self, id: FigureId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> FigureId {
        self.id
    }

    pub fn is_visible(&self) -> bool {
        self.attributes.is_visible()
    }

    pub fn layer(&self) -> i64 {
        self.attributes.layer()
    }

    pub fn children(&self) -> &[Figure] {
        match &self.kind {
            FigureKind::Group { children } => children,
            _ => &[],
        }
    }

    pub fn connection(&self) -> Option<&ConnectionData> {
        match &self.kind {
            FigureKind::Connection(c) => Some(c),
            _ => None,
        }
    }

    pub fn connection_mut(&mut self) -> Option<&mut ConnectionData> {
        match &mut self.kind {
            FigureKind::Connection(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self.kind, FigureKind::Connection(_))
    }

    pub fn geometry(&self) -> FigureGeometry {
        FigureGeometry(self.kind.clone())
    }

    pub fn restore_geometry(&mut self, geometry: &FigureGeometry) {
        self.kind = geometry.0.clone();
    }

    /// Deep copy with fresh ids. `ids` collects the old → new mapping so
    /// copied connections can be re-pointed with [`Figure::remap_connectors`].
    pub fn duplicate(&self, ids: &mut HashMap<FigureId, FigureId>) -> Figure {
        let kind = match &self.kind {
            FigureKind::Group { children } => FigureKind::Group {
                children: children.iter().map(|c| c.duplicate(ids)).collect(),
            },
            other => other.clone(),
        };
        let copy = Figure {
            id: FigureId::next(),
            kind,
            attributes: self.attributes.clone(),
            connectors_visible: false,
        };
        ids.insert(self.id, copy.id);
        copy
    }

    /// Re-point connectors through `ids`; connectors whose owner is not in
    /// the map are detached.
    pub fn remap_connectors(&mut self, ids: &HashMap<FigureId, FigureId>) {
        if let Some(conn) = self.connection_mut() {
            for end in [&mut conn.start, &mut conn.end] {
                *end = end.and_then(|c| {
                    ids.get(&c.owner).map(|owner| Connector {
                        owner: *owner,
                        kind: c.kind,
                    })
                });
            }
        }
    }
}

// ─── Capabilities ────────────────────────────────────────────────────────

pub trait Boundable {
    /// Geometric bounds, excluding stroke.
    fn bounds(&self) -> Rect;
    /// Area touched when painting, including stroke, arrows and hit slop.
    fn draw_bounds(&self) -> Rect;
    fn contains(&self, p: Point) -> bool;
    fn transform(&mut self, t: Affine);
    /// Fit the figure to the rectangle spanned by `anchor` and `lead`.
    fn set_bounds(&mut self, anchor: Point, lead: Point);
}

pub trait Paintable {
    fn draw(&self, g: &mut dyn Graphics);
}

pub trait Connectable {
    fn can_connect(&self) -> bool;
    fn connectors(&self) -> SmallVec<[Connector; 5]>;
    /// The connector nearest to `p`, if this figure accepts connections.
    fn find_connector(&self, p: Point) -> Option<Connector>;
    fn connectors_visible(&self) -> bool;
    fn set_connectors_visible(&mut self, visible: bool);
}

pub trait TextHolding {
    fn text(&self) -> Option<&str>;
    /// Returns false if the figure holds no text.
    fn set_text(&mut self, text: String) -> bool;
}

fn text_extent(text: &str, font_size: f64) -> Vec2 {
    let lines = text.lines().count().max(1);
    let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    Vec2::new(
        widest as f64 * CHAR_WIDTH * font_size,
        lines as f64 * LINE_HEIGHT * font_size,
    )
}

fn points_bounds(points: &[Point]) -> Rect {
    union_all(points.iter().map(|p| Rect::from_points(*p, *p))).unwrap_or(Rect::ZERO)
}

impl Boundable for Figure {
    fn bounds(&self) -> Rect {
        match &self.kind {
            FigureKind::Rectangle { rect } | FigureKind::Ellipse { rect } => rect.abs(),
            FigureKind::Line { points } => points_bounds(points),
            FigureKind::Connection(c) => points_bounds(&c.points),
            FigureKind::Text { origin, text } => {
                let size = text_extent(text, self.attributes.font_size());
                Rect::from_origin_size(*origin, size.to_size())
            }
            FigureKind::Group { children } => {
                union_all(children.iter().map(Boundable::bounds)).unwrap_or(Rect::ZERO)
            }
        }
    }

    fn draw_bounds(&self) -> Rect {
        if let FigureKind::Group { children } = &self.kind {
            return union_all(children.iter().map(Boundable::draw_bounds)).unwrap_or(Rect::ZERO);
        }
        let mut grow = (self.attributes.stroke_width() / 2.0).max(HIT_TOLERANCE);
        if self.attributes.flag(AttributeKey::ArrowAtStart)
            || self.attributes.flag(AttributeKey::ArrowAtEnd)
        {
            grow += ARROW_SIZE;
        }
        if self.connectors_visible {
            grow = grow.max(crate::connector::CONNECTOR_RADIUS + 1.0);
        }
        self.bounds().inflate(grow, grow)
    }

    fn contains(&self, p: Point) -> bool {
        let half = self.attributes.stroke_width() / 2.0;
        match &self.kind {
            FigureKind::Rectangle { rect } => rect_contains(rect.inflate(half, half), p),
            FigureKind::Ellipse { rect } => ellipse_contains(rect.inflate(half, half), p),
            FigureKind::Line { points } => {
                polyline_contains_point(points, half.max(HIT_TOLERANCE), p)
            }
            FigureKind::Connection(c) => {
                polyline_contains_point(&c.points, half.max(HIT_TOLERANCE), p)
            }
            FigureKind::Text { .. } => rect_contains(self.bounds(), p),
            FigureKind::Group { children } => children.iter().any(|c| c.contains(p)),
        }
    }

    fn transform(&mut self, t: Affine) {
        match &mut self.kind {
            FigureKind::Rectangle { rect } | FigureKind::Ellipse { rect } => {
                *rect = Rect::from_points(t * rect.origin(), t * Point::new(rect.x1, rect.y1));
            }
            FigureKind::Line { points } => points.iter_mut().for_each(|p| *p = t * *p),
            FigureKind::Connection(c) => c.points.iter_mut().for_each(|p| *p = t * *p),
            FigureKind::Text { origin, .. } => *origin = t * *origin,
            FigureKind::Group { children } => children.iter_mut().for_each(|c| c.transform(t)),
        }
    }

    fn set_bounds(&mut self, anchor: Point, lead: Point) {
        let new = Rect::from_points(anchor, lead);
        let old = self.bounds();
        match &mut self.kind {
            FigureKind::Rectangle { rect } | FigureKind::Ellipse { rect } => *rect = new,
            FigureKind::Line { points } => {
                points.iter_mut().for_each(|p| *p = map_between(old, new, *p));
            }
            FigureKind::Connection(c) => {
                c.points.iter_mut().for_each(|p| *p = map_between(old, new, *p));
            }
            FigureKind::Text { origin, .. } => *origin = new.origin(),
            FigureKind::Group { children } => {
                for child in children {
                    let b = child.bounds();
                    child.set_bounds(
                        map_between(old, new, b.origin()),
                        map_between(old, new, Point::new(b.x1, b.y1)),
                    );
                }
            }
        }
    }
}

// ─── Painting ────────────────────────────────────────────────────────────

fn polyline_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        rest.iter().for_each(|p| path.line_to(*p));
    }
    path
}

/// Filled triangle with its tip at `tip`, pointing away from `from`.
fn arrow_path(from: Point, tip: Point) -> Option<BezPath> {
    let d = tip - from;
    let len = d.hypot();
    if len == 0.0 {
        return None;
    }
    let dir = d / len;
    let normal = Vec2::new(-dir.y, dir.x) * (ARROW_SIZE / 2.0);
    let base = tip - dir * ARROW_SIZE;
    let mut path = BezPath::new();
    path.move_to(tip);
    path.line_to(base + normal);
    path.line_to(base - normal);
    path.close_path();
    Some(path)
}

impl Figure {
    fn paint_shape(&self, g: &mut dyn Graphics, path: &BezPath) {
        if let Some(fill) = self.attributes.color(AttributeKey::FillColor) {
            g.fill_path(path, fill);
        }
        if let Some(stroke) = self.attributes.color(AttributeKey::StrokeColor) {
            g.stroke_path(path, stroke, self.attributes.stroke_width());
        }
    }

    fn paint_polyline(&self, g: &mut dyn Graphics, points: &[Point]) {
        let Some(stroke) = self.attributes.color(AttributeKey::StrokeColor) else {
            return;
        };
        g.stroke_path(&polyline_path(points), stroke, self.attributes.stroke_width());
        let n = points.len();
        if n < 2 {
            return;
        }
        let arrows = [
            (AttributeKey::ArrowAtStart, points[1], points[0]),
            (AttributeKey::ArrowAtEnd, points[n - 2], points[n - 1]),
        ];
        for (key, from, tip) in arrows {
            if self.attributes.flag(key)
                && let Some(path) = arrow_path(from, tip)
            {
                g.fill_path(&path, stroke);
            }
        }
    }

    fn paint_connectors(&self, g: &mut dyn Graphics) {
        for c in self.connectors() {
            if let crate::connector::ConnectorKind::Locator(_) = c.kind {
                let b = c.bounds(self);
                g.fill_path(&b.to_path(PATH_TOLERANCE), Color::WHITE);
                g.stroke_path(&b.to_path(PATH_TOLERANCE), Color::BLACK, 1.0);
            }
        }
    }
}

impl Paintable for Figure {
    fn draw(&self, g: &mut dyn Graphics) {
        if !self.is_visible() {
            return;
        }
        match &self.kind {
            FigureKind::Rectangle { rect } => self.paint_shape(g, &rect.to_path(PATH_TOLERANCE)),
            FigureKind::Ellipse { rect } => {
                self.paint_shape(g, &Ellipse::from_rect(*rect).to_path(PATH_TOLERANCE));
            }
            FigureKind::Line { points } => self.paint_polyline(g, points),
            FigureKind::Connection(c) => self.paint_polyline(g, &c.points),
            FigureKind::Text { origin, text } => {
                if let Some(color) = self.attributes.color(AttributeKey::TextColor) {
                    g.draw_text(*origin, text, self.attributes.font_size(), color);
                }
            }
            FigureKind::Group { children } => children.iter().for_each(|c| c.draw(g)),
        }
        if self.connectors_visible {
            self.paint_connectors(g);
        }
    }
}

// ─── Connections & Text ──────────────────────────────────────────────────

impl Connectable for Figure {
    fn can_connect(&self) -> bool {
        !self.is_connection()
    }

    fn connectors(&self) -> SmallVec<[Connector; 5]> {
        if self.can_connect() {
            standard_connectors(self.id)
        } else {
            SmallVec::new()
        }
    }

    fn find_connector(&self, p: Point) -> Option<Connector> {
        nearest_connector(self, &self.connectors(), p)
    }

    fn connectors_visible(&self) -> bool {
        self.connectors_visible
    }

    fn set_connectors_visible(&mut self, visible: bool) {
        self.connectors_visible = visible;
    }
}

impl TextHolding for Figure {
    fn text(&self) -> Option<&str> {
        match &self.kind {
            FigureKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    fn set_text(&mut self, new_text: String) -> bool {
        match &mut self.kind {
            FigureKind::Text { text, .. } => {
                *text = new_text;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{DrawCommand, RecordingGraphics};
    use pretty_assertions::assert_eq;

    #[test]
    fn rectangle_bounds_and_hit() {
        let f = Figure::rectangle(Rect::new(10.0, 10.0, 0.0, 0.0));
        assert_eq!(f.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(f.contains(Point::new(10.0, 10.0)));
        assert!(!f.contains(Point::new(11.0, 11.0)));
        assert_eq!(f.draw_bounds(), Rect::new(-2.0, -2.0, 12.0, 12.0));
    }

    #[test]
    fn line_hit_uses_tolerance() {
        let f = Figure::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(f.contains(Point::new(50.0, 1.5)));
        assert!(!f.contains(Point::new(50.0, 3.0)));
    }

    #[test]
    fn text_metrics_follow_font_size() {
        let f = Figure::text(Point::new(0.0, 0.0), "abcd\nxy")
            .with(AttributeKey::FontSize, AttributeValue::Number(10.0));
        assert_eq!(f.bounds(), Rect::new(0.0, 0.0, 24.0, 24.0));
    }

    #[test]
    fn set_bounds_maps_line_points() {
        let mut f = Figure::polyline([
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(20.0, 10.0),
        ]);
        f.set_bounds(Point::new(0.0, 0.0), Point::new(40.0, 20.0));
        assert_eq!(f.bounds(), Rect::new(0.0, 0.0, 40.0, 20.0));
        match &f.kind {
            FigureKind::Line { points } => assert_eq!(points[1], Point::new(20.0, 10.0)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn group_transforms_children() {
        let mut g = Figure::group(vec![
            Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Figure::ellipse(Rect::new(20.0, 20.0, 30.0, 30.0)),
        ]);
        assert_eq!(g.bounds(), Rect::new(0.0, 0.0, 30.0, 30.0));
        g.transform(Affine::translate((5.0, 5.0)));
        assert_eq!(g.bounds(), Rect::new(5.0, 5.0, 35.0, 35.0));
        assert!(g.contains(Point::new(30.0, 30.0)));
        assert!(!g.contains(Point::new(20.0, 25.0)));
    }

    #[test]
    fn geometry_restore_is_exact() {
        let mut f = Figure::ellipse(Rect::new(0.1, 0.2, 10.3, 7.7));
        let before = f.geometry();
        f.transform(Affine::rotate(0.3).then_scale(1.7));
        assert_ne!(f.geometry(), before);
        f.restore_geometry(&before);
        assert_eq!(f.geometry(), before);
    }

    #[test]
    fn duplicate_remaps_connections() {
        let a = Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut conn = Figure::new_connection(Point::new(10.0, 5.0), Point::new(50.0, 5.0));
        if let Some(c) = conn.connection_mut() {
            c.start = Some(Connector::chop(a.id()));
        }

        let mut ids = HashMap::new();
        let a2 = a.duplicate(&mut ids);
        let mut conn2 = conn.duplicate(&mut ids);
        conn2.remap_connectors(&ids);

        assert_ne!(a2.id(), a.id());
        let c2 = conn2.connection().unwrap();
        assert_eq!(c2.start.map(|c| c.owner), Some(a2.id()));
        assert_eq!(c2.end, None);
    }

    #[test]
    fn hidden_figures_paint_nothing() {
        let f = Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0))
            .with(AttributeKey::Visible, AttributeValue::Bool(false));
        let mut g = RecordingGraphics::new();
        f.draw(&mut g);
        assert!(g.commands.is_empty());
    }

    #[test]
    fn line_with_arrow_paints_tip() {
        let f = Figure::line(Point::new(0.0, 0.0), Point::new(20.0, 0.0))
            .with(AttributeKey::ArrowAtEnd, AttributeValue::Bool(true));
        let mut g = RecordingGraphics::new();
        f.draw(&mut g);
        assert_eq!(g.commands.len(), 2);
        assert!(matches!(g.commands[1], DrawCommand::Fill { .. }));
        assert_eq!(f.draw_bounds(), Rect::new(-10.0, -10.0, 30.0, 10.0));
    }

    #[test]
    fn connections_do_not_accept_connections() {
        let c = Figure::new_connection(Point::ZERO, Point::new(1.0, 1.0));
        assert!(!c.can_connect());
        assert!(c.find_connector(Point::ZERO).is_none());
    }

    #[test]
    fn text_holding() {
        let mut t = Figure::text(Point::ZERO, "hi");
        assert!(t.set_text("there".into()));
        assert_eq!(t.text(), Some("there"));
        let mut r = Figure::rectangle(Rect::ZERO);
        assert!(!r.set_text("x".into()));
    }
}
