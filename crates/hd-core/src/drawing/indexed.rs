use super::{Drawing, FigureIndex};
use crate::attribute::{AttributeKey, AttributeValue};
use crate::event::{DrawingEvent, Listeners};
use crate::figure::{Boundable, Figure, Paintable};
use crate::geom::{intersects, rect_contains_rect, union_all};
use crate::graphics::Graphics;
use crate::id::FigureId;
use crate::undo::UndoableEdit;
use kurbo::{Affine, Point, Rect};
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashMap, HashSet};

/// A drawing whose spatial queries are narrowed by `I`.
///
/// Both [`DefaultDrawing`](super::DefaultDrawing) and
/// [`QuadTreeDrawing`](super::QuadTreeDrawing) are this type; they differ only
/// in how candidates are selected, never in the answers or their order.
pub struct IndexedDrawing<I: FigureIndex> {
    figures: HashMap<FigureId, Figure>,
    /// List order, back to front.
    children: Vec<FigureId>,
    /// Z-order cache, valid unless `needs_sorting`.
    sorted: Vec<FigureId>,
    needs_sorting: bool,
    index: I,
    /// Edges run from a connected figure to the connection attached to it.
    connections: DiGraphMap<FigureId, ()>,
    listeners: Listeners,
    pending_edits: Vec<UndoableEdit>,
}

impl<I: FigureIndex> Default for IndexedDrawing<I> {
    fn default() -> Self {
        Self::with_index(I::default())
    }
}

impl<I: FigureIndex> std::fmt::Debug for IndexedDrawing<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedDrawing")
            .field("children", &self.children)
            .field("pending_edits", &self.pending_edits.len())
            .finish()
    }
}

impl<I: FigureIndex> IndexedDrawing<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-configured index, e.g. a quad-tree with custom bounds.
    pub fn with_index(index: I) -> Self {
        Self {
            figures: HashMap::new(),
            children: Vec::new(),
            sorted: Vec::new(),
            needs_sorting: false,
            index,
            connections: DiGraphMap::new(),
            listeners: Listeners::new(),
            pending_edits: Vec::new(),
        }
    }

    fn ensure_sorted(&mut self) {
        if !self.needs_sorting {
            return;
        }
        let figures = &self.figures;
        self.sorted.clone_from(&self.children);
        self.sorted
            .sort_by_key(|id| figures.get(id).map_or(0, Figure::layer));
        self.needs_sorting = false;
    }

    fn invalidate(&mut self, figure: Option<FigureId>, area: Rect) {
        self.listeners
            .emit(&DrawingEvent::AreaInvalidated { figure, area });
    }

    /// Register the owner → connection edges of `id`, if it is a connection.
    fn link_connection(&mut self, id: FigureId) -> bool {
        let Some(owners) = self
            .figures
            .get(&id)
            .and_then(Figure::connection)
            .map(|c| c.owners().collect::<Vec<_>>())
        else {
            return false;
        };
        for owner in owners {
            self.connections.add_edge(owner, id, ());
        }
        true
    }

    fn unlink_connection(&mut self, id: FigureId) {
        let owners: Vec<FigureId> = self
            .connections
            .neighbors_directed(id, Direction::Incoming)
            .collect();
        for owner in owners {
            self.connections.remove_edge(owner, id);
            if self.connections.neighbors(owner).next().is_none()
                && !self.figures.contains_key(&owner)
            {
                self.connections.remove_node(owner);
            }
        }
    }

    /// Move a connection's end points onto its connectors.
    fn layout_connection(&mut self, id: FigureId) {
        let Some(mut conn) = self.figures.remove(&id) else {
            return;
        };
        if let Some(data) = conn.connection_mut() {
            let start = data.start.and_then(|c| self.figures.get(&c.owner));
            let end = data.end.and_then(|c| self.figures.get(&c.owner));
            data.layout(start, end);
        }
        self.figures.insert(id, conn);
    }

    /// Candidates from the index, filtered to visible figures and returned
    /// in z-order.
    fn candidates(&mut self, hits: Option<HashSet<FigureId>>) -> Vec<FigureId> {
        self.ensure_sorted();
        let figures = &self.figures;
        self.sorted
            .iter()
            .copied()
            .filter(|id| hits.as_ref().is_none_or(|h| h.contains(id)))
            .filter(|id| figures.get(id).is_some_and(Figure::is_visible))
            .collect()
    }
}

impl<I: FigureIndex> Drawing for IndexedDrawing<I> {
    fn add_at(&mut self, index: usize, figure: Figure) -> FigureId {
        let id = figure.id();
        if self.contains(id) {
            log::warn!("figure {id} is already in the drawing");
            return id;
        }
        self.basic_add_at(index, figure);
        let index = self.index_of(id).unwrap_or(0);
        let area = self.figures.get(&id).map_or(Rect::ZERO, Figure::draw_bounds);
        self.listeners
            .emit(&DrawingEvent::FigureAdded { id, index });
        self.invalidate(Some(id), area);
        self.pending_edits.push(UndoableEdit::add_figure(id, index));
        id
    }

    fn remove(&mut self, id: FigureId) -> Option<Figure> {
        let Some((index, figure)) = self.basic_remove(id) else {
            self.invalidate(Some(id), Rect::ZERO);
            return None;
        };
        self.listeners
            .emit(&DrawingEvent::FigureRemoved { id, index });
        self.invalidate(Some(id), figure.draw_bounds());
        self.pending_edits
            .push(UndoableEdit::remove_figure(id, index, figure.clone()));
        Some(figure)
    }

    fn basic_add_at(&mut self, index: usize, figure: Figure) -> FigureId {
        let id = figure.id();
        if self.figures.contains_key(&id) {
            return id;
        }
        let index = index.min(self.children.len());
        self.children.insert(index, id);
        self.figures.insert(id, figure);
        if self.link_connection(id) {
            self.layout_connection(id);
        }
        if let Some(f) = self.figures.get(&id) {
            self.index.insert(id, f.draw_bounds());
        }
        self.needs_sorting = true;
        id
    }

    fn basic_remove(&mut self, id: FigureId) -> Option<(usize, Figure)> {
        let index = self.index_of(id)?;
        let figure = self.figures.remove(&id)?;
        self.children.remove(index);
        self.index.remove(id);
        if figure.is_connection() {
            self.unlink_connection(id);
            self.connections.remove_node(id);
        } else if self.connections.contains_node(id)
            && self.connections.neighbors(id).next().is_none()
        {
            self.connections.remove_node(id);
        }
        self.needs_sorting = true;
        Some((index, figure))
    }

    fn clear(&mut self) {
        self.figures.clear();
        self.children.clear();
        self.sorted.clear();
        self.needs_sorting = false;
        self.index.clear();
        self.connections.clear();
        self.pending_edits.clear();
    }

    fn contains(&self, id: FigureId) -> bool {
        self.figures.contains_key(&id)
    }

    fn figure_count(&self) -> usize {
        self.children.len()
    }

    fn figure(&self, id: FigureId) -> Option<&Figure> {
        self.figures.get(&id)
    }

    fn index_of(&self, id: FigureId) -> Option<usize> {
        self.children.iter().position(|c| *c == id)
    }

    fn children(&self) -> &[FigureId] {
        &self.children
    }

    fn sorted_children(&mut self) -> Vec<FigureId> {
        self.ensure_sorted();
        self.sorted.clone()
    }

    fn find_figure_except(&mut self, p: Point, ignore: &HashSet<FigureId>) -> Option<FigureId> {
        let hits = self.index.query_point(p);
        let candidates = self.candidates(hits);
        candidates.into_iter().rev().find(|id| {
            !ignore.contains(id) && self.figures.get(id).is_some_and(|f| f.contains(p))
        })
    }

    fn find_figures(&mut self, r: Rect) -> Vec<FigureId> {
        let hits = self.index.query_rect(r);
        let mut out = self.candidates(hits);
        out.retain(|id| {
            self.figures
                .get(id)
                .is_some_and(|f| intersects(f.draw_bounds(), r))
        });
        out
    }

    fn find_figures_within(&mut self, r: Rect) -> Vec<FigureId> {
        let hits = self.index.query_rect(r);
        let mut out = self.candidates(hits);
        out.retain(|id| {
            self.figures
                .get(id)
                .is_some_and(|f| rect_contains_rect(r, f.bounds()))
        });
        out
    }

    fn move_to(&mut self, id: FigureId, index: usize) -> Option<usize> {
        let old = self.index_of(id)?;
        let new = index.min(self.children.len() - 1);
        if old == new {
            return Some(old);
        }
        self.children.remove(old);
        self.children.insert(new, id);
        self.needs_sorting = true;
        let area = self.figures.get(&id).map_or(Rect::ZERO, Figure::draw_bounds);
        self.listeners.emit(&DrawingEvent::ZOrderChanged { id });
        self.invalidate(Some(id), area);
        self.pending_edits.push(UndoableEdit::z_order(id, old, new));
        Some(old)
    }

    fn update_figure(&mut self, id: FigureId, mutate: &mut dyn FnMut(&mut Figure)) -> bool {
        let Some(figure) = self.figures.get_mut(&id) else {
            return false;
        };
        let old_bounds = figure.bounds();
        let old_area = figure.draw_bounds();
        let was_connection = figure.is_connection();

        mutate(figure);

        if was_connection {
            self.unlink_connection(id);
        }
        if self.link_connection(id) {
            self.layout_connection(id);
        }

        let Some(figure) = self.figures.get(&id) else {
            return false;
        };
        let new_bounds = figure.bounds();
        let new_area = figure.draw_bounds();
        self.index.insert(id, new_area);
        self.needs_sorting = true;

        self.invalidate(Some(id), old_area.union(new_area));
        self.listeners.emit(&DrawingEvent::FigureChanged {
            id,
            old_bounds,
            new_bounds,
        });

        for conn in self.dependent_connections(id) {
            if conn != id {
                self.update_figure(conn, &mut |_| {});
            }
        }
        true
    }

    fn set_attribute(
        &mut self,
        id: FigureId,
        key: AttributeKey,
        value: Option<AttributeValue>,
    ) -> bool {
        let Some(figure) = self.figures.get(&id) else {
            return false;
        };
        if let Some(v) = &value
            && !v.fits(key)
        {
            log::warn!("attribute {key} rejects value {v:?}");
            return false;
        }
        let before = figure.attributes.get_explicit(key).cloned();
        if before == value {
            return true;
        }
        let old = figure.attributes.get(key);
        let mut next = value.clone();
        self.update_figure(id, &mut |f| {
            f.attributes.set(key, next.take());
        });
        let new = self
            .figures
            .get(&id)
            .map_or_else(|| key.default_value(), |f| f.attributes.get(key));
        self.listeners.emit(&DrawingEvent::AttributeChanged {
            id,
            key,
            old,
            new,
        });
        self.pending_edits
            .push(UndoableEdit::attribute(id, key, before, value));
        true
    }

    fn transform_figures(&mut self, ids: &[FigureId], t: Affine) {
        for &id in ids {
            let Some(before) = self.figures.get(&id).map(Figure::geometry) else {
                continue;
            };
            self.update_figure(id, &mut |f| f.transform(t));
            if let Some(after) = self.figures.get(&id).map(Figure::geometry) {
                self.pending_edits
                    .push(UndoableEdit::geometry(id, before, after, "Transform"));
            }
        }
    }

    fn dependent_connections(&self, id: FigureId) -> Vec<FigureId> {
        if !self.connections.contains_node(id) {
            return Vec::new();
        }
        self.connections
            .neighbors_directed(id, Direction::Outgoing)
            .filter(|c| self.figures.contains_key(c))
            .collect()
    }

    fn draw(&mut self, g: &mut dyn Graphics, clip: Rect) {
        let hits = self.index.query_rect(clip);
        let candidates = self.candidates(hits);
        g.push_clip(clip);
        for id in candidates {
            if let Some(f) = self.figures.get(&id)
                && intersects(f.draw_bounds(), clip)
            {
                g.begin_figure(id);
                f.draw(g);
                g.end_figure(id);
            }
        }
        g.pop_clip();
    }

    fn draw_bounds(&self) -> Option<Rect> {
        union_all(self.figures.values().map(Figure::draw_bounds))
    }

    fn listeners(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    fn fire_undoable_edit(&mut self, edit: UndoableEdit) {
        self.pending_edits.push(edit);
    }

    fn take_edits(&mut self) -> Vec<UndoableEdit> {
        std::mem::take(&mut self.pending_edits)
    }
}
