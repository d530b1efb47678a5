//! Geometry helpers shared by figures, connectors and the drawing.
//!
//! Bounds in this crate are inclusive on every edge: a zero-width line still
//! intersects a rectangle it touches, and a point on the border of a figure's
//! bounds is inside it. `kurbo::Rect::contains` is half-open, so the helpers
//! here are used wherever that difference matters.

use kurbo::{Point, Rect, Vec2};

/// Inclusive point-in-rectangle test.
pub fn rect_contains(r: Rect, p: Point) -> bool {
    let r = r.abs();
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

/// Inclusive test whether `outer` fully contains `inner`.
pub fn rect_contains_rect(outer: Rect, inner: Rect) -> bool {
    let (o, i) = (outer.abs(), inner.abs());
    i.x0 >= o.x0 && i.x1 <= o.x1 && i.y0 >= o.y0 && i.y1 <= o.y1
}

/// Inclusive rectangle overlap test.
pub fn intersects(a: Rect, b: Rect) -> bool {
    let (a, b) = (a.abs(), b.abs());
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Union of a sequence of rectangles, or `None` for an empty sequence.
pub fn union_all(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Squared distance between two points.
pub fn length2(a: Point, b: Point) -> f64 {
    (b - a).hypot2()
}

/// Squared distance from `p` to the segment `a`–`b`.
pub fn segment_distance2(a: Point, b: Point, p: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return length2(a, p);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    length2(a + ab * t, p)
}

/// Whether `p` lies within `tolerance` of the segment `a`–`b`.
pub fn line_contains_point(a: Point, b: Point, tolerance: f64, p: Point) -> bool {
    segment_distance2(a, b, p) <= tolerance * tolerance
}

/// Whether `p` lies within `tolerance` of any segment of the polyline.
pub fn polyline_contains_point(points: &[Point], tolerance: f64, p: Point) -> bool {
    match points {
        [] => false,
        [only] => length2(*only, p) <= tolerance * tolerance,
        _ => points
            .windows(2)
            .any(|w| line_contains_point(w[0], w[1], tolerance, p)),
    }
}

/// Inclusive point-in-ellipse test for the ellipse inscribed in `r`.
pub fn ellipse_contains(r: Rect, p: Point) -> bool {
    let r = r.abs();
    let (rx, ry) = (r.width() / 2.0, r.height() / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return rect_contains(r, p);
    }
    let c = r.center();
    let dx = (p.x - c.x) / rx;
    let dy = (p.y - c.y) / ry;
    dx * dx + dy * dy <= 1.0
}

/// Angle of `p` around `center`, in radians, measured like `atan2`.
pub fn angle(center: Point, p: Point) -> f64 {
    (p.y - center.y).atan2(p.x - center.x)
}

/// Point on the border of `r` on the ray from its centre towards `toward`.
pub fn chop_rect(r: Rect, toward: Point) -> Point {
    let r = r.abs();
    let c = r.center();
    let d = toward - c;
    if d.x == 0.0 && d.y == 0.0 {
        return c;
    }
    let (hw, hh) = (r.width() / 2.0, r.height() / 2.0);
    // Scale the direction so that the larger relative component hits the border.
    let sx = if d.x != 0.0 { hw / d.x.abs() } else { f64::INFINITY };
    let sy = if d.y != 0.0 { hh / d.y.abs() } else { f64::INFINITY };
    c + d * sx.min(sy)
}

/// Point on the ellipse inscribed in `r` on the ray from its centre towards `toward`.
pub fn chop_ellipse(r: Rect, toward: Point) -> Point {
    let r = r.abs();
    let c = r.center();
    let (rx, ry) = (r.width() / 2.0, r.height() / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return chop_rect(r, toward);
    }
    let th = angle(c, toward);
    // Parametric angle on the ellipse that corresponds to the polar angle `th`.
    let t = (rx * th.sin()).atan2(ry * th.cos());
    Point::new(c.x + rx * t.cos(), c.y + ry * t.sin())
}

/// Map `old` onto `new` with a translate-scale transform, applied to `p`.
///
/// Degenerate extents keep their scale at 1 so zero-width lines stay put.
pub fn map_between(old: Rect, new: Rect, p: Point) -> Point {
    let (old, new) = (old.abs(), new.abs());
    let sx = if old.width() > 0.0 { new.width() / old.width() } else { 1.0 };
    let sy = if old.height() > 0.0 { new.height() / old.height() } else { 1.0 };
    Point::new(new.x0 + (p.x - old.x0) * sx, new.y0 + (p.y - old.y0) * sy)
}

/// Constrain `d` to its dominant axis.
pub fn dominant_axis(d: Vec2) -> Vec2 {
    if d.x.abs() > d.y.abs() {
        Vec2::new(d.x, 0.0)
    } else {
        Vec2::new(0.0, d.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_contains(r, Point::new(10.0, 10.0)));
        assert!(intersects(r, Rect::new(10.0, 0.0, 10.0, 5.0)));
        assert!(!intersects(r, Rect::new(10.5, 0.0, 12.0, 5.0)));
    }

    #[test]
    fn chop_rect_hits_border() {
        let r = Rect::new(0.0, 0.0, 20.0, 10.0);
        assert_eq!(chop_rect(r, Point::new(100.0, 5.0)), Point::new(20.0, 5.0));
        assert_eq!(chop_rect(r, Point::new(10.0, -50.0)), Point::new(10.0, 0.0));
        assert_eq!(chop_rect(r, r.center()), r.center());
    }

    #[test]
    fn chop_ellipse_hits_axis_points() {
        let r = Rect::new(0.0, 0.0, 20.0, 10.0);
        let p = chop_ellipse(r, Point::new(100.0, 5.0));
        assert!((p.x - 20.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
        let p = chop_ellipse(r, Point::new(10.0, 100.0));
        assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn polyline_tolerance() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        assert!(polyline_contains_point(&pts, 1.0, Point::new(5.0, 0.5)));
        assert!(polyline_contains_point(&pts, 1.0, Point::new(10.5, 7.0)));
        assert!(!polyline_contains_point(&pts, 1.0, Point::new(5.0, 5.0)));
    }

    #[test]
    fn ellipse_membership() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(ellipse_contains(r, Point::new(5.0, 5.0)));
        assert!(!ellipse_contains(r, Point::new(0.5, 0.5)));
    }

    #[test]
    fn map_between_scales() {
        let old = Rect::new(0.0, 0.0, 10.0, 10.0);
        let new = Rect::new(10.0, 10.0, 30.0, 20.0);
        assert_eq!(map_between(old, new, Point::new(5.0, 5.0)), Point::new(20.0, 15.0));
    }
}
