//! The drawing view: selection, handles, coordinate mapping and repaint
//! bookkeeping for one drawing.
//!
//! The view never owns the drawing. Operations that need it take it as an
//! argument, so the editor can hand in whatever it holds the lock on.

use crate::config::{EditorConfig, GridConfig};
use crate::constrainer::GridConstrainer;
use crate::handle::{
    ConnectionEndHandle, ConnectorHandle, Handle, MoveHandle, ResizeHandle, RotateHandle,
};
use hd_core::{
    Boundable, Color, Connectable, Drawing, DrawingEvent, FigureId, Graphics, ListenerId,
    Subscription, geom,
};
use kurbo::{Affine, BezPath, Point, Rect, Shape, Vec2};
use parking_lot::Mutex;
use std::sync::Arc;

const GRID_COLOR: Color = Color::rgba(0.85, 0.85, 0.9, 1.0);
const RUBBER_BAND_COLOR: Color = Color::rgba(0.2, 0.4, 0.9, 1.0);

// ─── Coordinates ─────────────────────────────────────────────────────────

/// Maps drawing coordinates to view coordinates: `view = drawing * scale +
/// translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub translation: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn to_view(&self, p: Point) -> Point {
        (p.to_vec2() * self.scale + self.translation).to_point()
    }

    pub fn to_drawing(&self, p: Point) -> Point {
        ((p.to_vec2() - self.translation) / self.scale).to_point()
    }

    pub fn affine(&self) -> Affine {
        Affine::translate(self.translation) * Affine::scale(self.scale)
    }
}

// ─── View ────────────────────────────────────────────────────────────────

pub struct DrawingView {
    /// Selected figures in selection order.
    selection: Vec<FigureId>,
    transform: ViewTransform,
    /// Drawing-space area awaiting repaint, filled by the drawing listener.
    dirty: Arc<Mutex<Option<Rect>>>,
    listener: Option<ListenerId>,
    grid: Option<GridConfig>,
    snap_to_grid: bool,
    enabled: bool,
    handle_size: f64,
    tolerance: f64,
    rubber_band: Option<Rect>,
}

impl std::fmt::Debug for DrawingView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingView")
            .field("selection", &self.selection)
            .field("transform", &self.transform)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl DrawingView {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            selection: Vec::new(),
            transform: ViewTransform::default(),
            dirty: Arc::new(Mutex::new(None)),
            listener: None,
            grid: config.grid,
            snap_to_grid: config.grid.is_some(),
            enabled: true,
            handle_size: config.handle_size,
            tolerance: config.tolerance,
            rubber_band: None,
        }
    }

    /// Start collecting repaint areas from `drawing`.
    pub fn attach(&mut self, drawing: &mut dyn Drawing) {
        let dirty = Arc::clone(&self.dirty);
        let id = drawing.listeners().subscribe(
            Subscription::All,
            Box::new(move |event| {
                if let DrawingEvent::AreaInvalidated { area, .. } = event
                    && *area != Rect::ZERO
                {
                    let mut dirty = dirty.lock();
                    *dirty = Some(dirty.map_or(*area, |d| d.union(*area)));
                }
            }),
        );
        self.listener = Some(id);
        if let Some(all) = drawing.draw_bounds() {
            self.invalidate(all);
        }
    }

    pub fn detach(&mut self, drawing: &mut dyn Drawing) {
        if let Some(id) = self.listener.take() {
            drawing.listeners().unsubscribe(id);
        }
    }

    // ─── Repaint ─────────────────────────────────────────────────────────

    pub fn invalidate(&self, area: Rect) {
        let mut dirty = self.dirty.lock();
        *dirty = Some(dirty.map_or(area, |d| d.union(area)));
    }

    /// Drain the accumulated repaint area.
    pub fn take_dirty(&self) -> Option<Rect> {
        self.dirty.lock().take()
    }

    /// Paint the grid, the figures intersecting `clip`, the handles of the
    /// selection and the rubber band. Everything is in drawing coordinates;
    /// apply [`ViewTransform::affine`] in the sink to map it onto the screen.
    pub fn paint(&self, drawing: &mut dyn Drawing, g: &mut dyn Graphics, clip: Rect) {
        if let Some(grid) = self.grid.filter(|grid| grid.visible) {
            self.paint_grid(g, &grid, clip);
        }
        drawing.draw(g, clip);
        let size = self.handle_size();
        for h in self.handles(drawing) {
            h.draw(drawing, g, size);
        }
        if let Some(band) = self.rubber_band {
            g.stroke_path(&band.to_path(0.1), RUBBER_BAND_COLOR, 1.0 / self.transform.scale);
        }
    }

    fn paint_grid(&self, g: &mut dyn Graphics, grid: &GridConfig, clip: Rect) {
        let mut path = BezPath::new();
        let mut x = (clip.x0 / grid.width).floor() * grid.width;
        while x <= clip.x1 {
            path.move_to((x, clip.y0));
            path.line_to((x, clip.y1));
            x += grid.width.max(1.0);
        }
        let mut y = (clip.y0 / grid.height).floor() * grid.height;
        while y <= clip.y1 {
            path.move_to((clip.x0, y));
            path.line_to((clip.x1, y));
            y += grid.height.max(1.0);
        }
        g.stroke_path(&path, GRID_COLOR, 0.5 / self.transform.scale);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selection(&self) -> &[FigureId] {
        &self.selection
    }

    pub fn is_selected(&self, id: FigureId) -> bool {
        self.selection.contains(&id)
    }

    /// Replace the selection with `id` alone.
    pub fn select(&mut self, id: FigureId) {
        self.selection.clear();
        self.selection.push(id);
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = FigureId>) {
        self.selection.clear();
        for id in ids {
            self.add_to_selection(id);
        }
    }

    pub fn add_to_selection(&mut self, id: FigureId) {
        if !self.selection.contains(&id) {
            self.selection.push(id);
        }
    }

    pub fn remove_from_selection(&mut self, id: FigureId) {
        self.selection.retain(|s| *s != id);
    }

    pub fn toggle_selection(&mut self, id: FigureId) {
        if self.is_selected(id) {
            self.remove_from_selection(id);
        } else {
            self.selection.push(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_all(&mut self, drawing: &mut dyn Drawing) {
        self.selection = drawing.sorted_children();
    }

    /// Forget selected figures that are no longer in `drawing`.
    pub fn prune_selection(&mut self, drawing: &dyn Drawing) {
        self.selection.retain(|id| drawing.contains(*id));
    }

    /// The selection in z-order, back to front.
    pub fn selection_in_z_order(&self, drawing: &mut dyn Drawing) -> Vec<FigureId> {
        drawing
            .sorted_children()
            .into_iter()
            .filter(|id| self.is_selected(*id))
            .collect()
    }

    pub fn selection_bounds(&self, drawing: &dyn Drawing) -> Option<Rect> {
        geom::union_all(
            self.selection
                .iter()
                .filter_map(|id| drawing.figure(*id))
                .map(Boundable::bounds),
        )
    }

    // ─── Handles ─────────────────────────────────────────────────────────

    /// Handles for the current selection.
    ///
    /// A single figure gets resize, rotate and connector handles (a
    /// connection gets its two end handles). Several selected figures get
    /// corner move handles each.
    pub fn handles(&self, drawing: &dyn Drawing) -> Vec<Box<dyn Handle>> {
        let mut out: Vec<Box<dyn Handle>> = Vec::new();
        if let [id] = *self.selection.as_slice() {
            let Some(figure) = drawing.figure(id) else {
                return out;
            };
            if figure.is_connection() {
                out.extend(
                    ConnectionEndHandle::both(id)
                        .into_iter()
                        .map(|h| Box::new(h) as Box<dyn Handle>),
                );
                return out;
            }
            out.extend(ResizeHandle::all(id).into_iter().map(|h| Box::new(h) as Box<dyn Handle>));
            out.push(Box::new(RotateHandle::new(id)));
            if figure.can_connect() {
                out.extend(
                    ConnectorHandle::all(figure)
                        .into_iter()
                        .map(|h| Box::new(h) as Box<dyn Handle>),
                );
            }
            return out;
        }
        for id in &self.selection {
            if drawing.figure(*id).is_some_and(|f| !f.is_connection()) {
                out.extend(
                    MoveHandle::corners(*id)
                        .into_iter()
                        .map(|h| Box::new(h) as Box<dyn Handle>),
                );
            }
        }
        out
    }

    /// The top-most handle under the view-space point `p`.
    pub fn find_handle(&self, drawing: &dyn Drawing, p: Point) -> Option<Box<dyn Handle>> {
        let p = self.transform.to_drawing(p);
        let size = self.handle_size();
        let slop = self.tolerance();
        self.handles(drawing).into_iter().rev().find(|h| {
            h.bounds(drawing, size)
                .is_some_and(|r| geom::rect_contains(r.inflate(slop, slop), p))
        })
    }

    /// Handle edge length in drawing units at the current scale.
    pub fn handle_size(&self) -> f64 {
        self.handle_size / self.transform.scale
    }

    /// Pointer slop in drawing units at the current scale.
    pub fn tolerance(&self) -> f64 {
        self.tolerance / self.transform.scale
    }

    // ─── Coordinates ─────────────────────────────────────────────────────

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.transform.scale = scale;
        } else {
            log::warn!("ignoring view scale {scale}");
        }
    }

    pub fn set_translation(&mut self, translation: Vec2) {
        self.transform.translation = translation;
    }

    pub fn view_to_drawing(&self, p: Point) -> Point {
        self.transform.to_drawing(p)
    }

    pub fn drawing_to_view(&self, p: Point) -> Point {
        self.transform.to_view(p)
    }

    // ─── Properties ──────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn grid(&self) -> Option<GridConfig> {
        self.grid
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        let grid = self.grid.get_or_insert_with(GridConfig::default);
        grid.visible = visible;
    }

    pub fn is_snapping(&self) -> bool {
        self.snap_to_grid && self.grid.is_some()
    }

    pub fn set_snap_to_grid(&mut self, snap: bool) {
        if snap && self.grid.is_none() {
            self.grid = Some(GridConfig {
                visible: false,
                ..GridConfig::default()
            });
        }
        self.snap_to_grid = snap;
    }

    /// The active constrainer, if snapping is on.
    pub fn constrainer(&self) -> Option<GridConstrainer> {
        self.grid
            .as_ref()
            .filter(|_| self.snap_to_grid)
            .map(GridConstrainer::from)
    }

    pub fn rubber_band(&self) -> Option<Rect> {
        self.rubber_band
    }

    pub fn set_rubber_band(&mut self, band: Option<Rect>) {
        let pad = 1.0 / self.transform.scale;
        for r in [self.rubber_band, band].into_iter().flatten() {
            self.invalidate(r.inflate(pad, pad));
        }
        self.rubber_band = band;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hd_core::{DrawingKind, Figure, RecordingGraphics};
    use pretty_assertions::assert_eq;

    fn view() -> DrawingView {
        DrawingView::new(&EditorConfig::default())
    }

    #[test]
    fn view_and_drawing_coordinates_round_trip() {
        let mut v = view();
        v.set_scale(2.0);
        v.set_translation(Vec2::new(10.0, -4.0));
        let p = Point::new(3.0, 7.0);
        assert_eq!(v.drawing_to_view(p), Point::new(16.0, 10.0));
        assert_eq!(v.view_to_drawing(Point::new(16.0, 10.0)), p);
        assert_eq!(v.transform().affine() * p, Point::new(16.0, 10.0));
    }

    #[test]
    fn rejects_degenerate_scale() {
        let mut v = view();
        v.set_scale(0.0);
        v.set_scale(f64::NAN);
        assert_eq!(v.transform().scale, 1.0);
    }

    #[test]
    fn dirty_region_follows_drawing_changes() {
        let mut d = DrawingKind::Default.create();
        let mut v = view();
        v.attach(d.as_mut());
        assert_eq!(v.take_dirty(), None);

        let id = d.add(Figure::rectangle(Rect::new(10.0, 10.0, 20.0, 20.0)));
        let dirty = v.take_dirty().unwrap();
        assert!(dirty.contains(Point::new(10.0, 10.0)));
        assert!(dirty.contains(Point::new(20.0, 20.0)));

        d.transform_figures(&[id], Affine::translate((100.0, 0.0)));
        let dirty = v.take_dirty().unwrap();
        assert!(dirty.contains(Point::new(15.0, 15.0)));
        assert!(dirty.contains(Point::new(115.0, 15.0)));

        v.detach(d.as_mut());
        d.remove(id);
        assert_eq!(v.take_dirty(), None);
    }

    #[test]
    fn selection_keeps_order_and_uniqueness() {
        let mut v = view();
        let (a, b) = (FigureId::next(), FigureId::next());
        v.add_to_selection(b);
        v.add_to_selection(a);
        v.add_to_selection(b);
        assert_eq!(v.selection(), &[b, a]);
        v.toggle_selection(b);
        assert_eq!(v.selection(), &[a]);
        v.set_selection([a, b, a]);
        assert_eq!(v.selection(), &[a, b]);
    }

    #[test]
    fn handle_sets_depend_on_selection_size() {
        let mut d = DrawingKind::Default.create();
        let a = d.add(Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let b = d.add(Figure::ellipse(Rect::new(50.0, 0.0, 60.0, 10.0)));
        let c = d.add(Figure::new_connection(Point::new(10.0, 5.0), Point::new(50.0, 5.0)));
        let mut v = view();

        v.select(a);
        // Eight resize, one rotate, four located connectors.
        assert_eq!(v.handles(d.as_ref()).len(), 13);

        v.select(c);
        assert_eq!(v.handles(d.as_ref()).len(), 2);

        v.set_selection([a, b, c]);
        assert_eq!(v.handles(d.as_ref()).len(), 8);
    }

    #[test]
    fn find_handle_respects_scale() {
        let mut d = DrawingKind::Default.create();
        let a = d.add(Figure::rectangle(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let mut v = view();
        v.select(a);
        v.set_scale(2.0);
        // South-east corner sits at (200, 200) in the view.
        let h = v.find_handle(d.as_ref(), Point::new(202.0, 199.0)).unwrap();
        assert_eq!(h.owner(), a);
        assert!(matches!(
            h.kind(),
            crate::handle::HandleKind::Resize(l) if l == hd_core::RelativeLocator::SOUTH_EAST
        ));
        assert!(v.find_handle(d.as_ref(), Point::new(150.0, 150.0)).is_none());
    }

    #[test]
    fn paint_draws_figures_then_handles() {
        let mut d = DrawingKind::Default.create();
        let a = d.add(Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let mut v = view();
        v.set_grid_visible(true);
        v.select(a);
        let mut g = RecordingGraphics::new();
        v.paint(d.as_mut(), &mut g, Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(g.figure_order(), vec![a]);
        let after_figure = g
            .commands
            .iter()
            .position(|c| matches!(c, hd_core::DrawCommand::EndFigure(_)))
            .unwrap();
        assert!(g.commands.len() > after_figure + 13);
    }

    #[test]
    fn snapping_needs_a_grid() {
        let mut v = view();
        assert_eq!(v.constrainer(), None);
        v.set_snap_to_grid(true);
        assert_eq!(v.constrainer(), Some(GridConstrainer::new(8.0, 8.0)));
        assert!(v.grid().is_some_and(|g| !g.visible));
    }
}
