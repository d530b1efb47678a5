//! Region quad-tree mapping opaque keys to 2D bounding boxes.
//!
//! Each node covers a rectangle. An entry is stored at the deepest nodes whose
//! quadrants it intersects, so a wide entry may live in several leaves; query
//! results are therefore sets. An entry whose bounds cover a whole node stays
//! at that node instead of being pushed further down.
//!
//! Entries outside the root rectangle go to an overflow ("outside") set. The
//! overflow set is part of the index: every query scans it. Once it grows past
//! [`QuadTreeConfig::max_overflow`] the tree is reorganized: all nodes are
//! joined back into the root, the root grows to cover every entry, and
//! everything is reinserted.

use crate::config::QuadTreeConfig;
use crate::geom::{intersects, rect_contains, rect_contains_rect, union_all};
use kurbo::{Point, Rect};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Default root extent for a fresh tree.
pub const DEFAULT_ROOT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

#[derive(Debug, Clone)]
struct Node<K> {
    bounds: Rect,
    objects: HashMap<K, Rect>,
    quadrants: Option<Box<[Node<K>; 4]>>,
}

impl<K: Copy + Eq + Hash> Node<K> {
    fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            objects: HashMap::new(),
            quadrants: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.quadrants.is_none()
    }

    fn add(&mut self, key: K, b: Rect, cfg: &QuadTreeConfig) {
        if self.is_leaf()
            && self.objects.len() >= cfg.max_capacity
            && self.bounds.width() > cfg.min_size
            && self.bounds.height() > cfg.min_size
        {
            self.split(cfg);
        }

        match self.quadrants.as_deref_mut() {
            Some(quadrants) if !rect_contains_rect(b, self.bounds) => {
                for q in quadrants.iter_mut() {
                    if intersects(q.bounds, b) {
                        q.add(key, b, cfg);
                    }
                }
            }
            _ => {
                self.objects.insert(key, b);
            }
        }
    }

    fn split(&mut self, cfg: &QuadTreeConfig) {
        let r = self.bounds;
        let c = r.center();
        self.quadrants = Some(Box::new([
            Node::new(Rect::new(r.x0, r.y0, c.x, c.y)),
            Node::new(Rect::new(c.x, r.y0, r.x1, c.y)),
            Node::new(Rect::new(r.x0, c.y, c.x, r.y1)),
            Node::new(Rect::new(c.x, c.y, r.x1, r.y1)),
        ]));
        let objects = std::mem::take(&mut self.objects);
        for (key, b) in objects {
            self.add(key, b, cfg);
        }
    }

    /// Fold all descendants back into this node.
    fn join(&mut self) {
        if let Some(quadrants) = self.quadrants.take() {
            for mut q in *quadrants {
                q.join();
                self.objects.extend(q.objects);
            }
        }
    }

    /// Remove `key`, only descending into quadrants that overlap `hint`.
    fn remove(&mut self, key: &K, hint: Rect) -> bool {
        if self.objects.remove(key).is_some() {
            return true;
        }
        let mut found = false;
        if let Some(quadrants) = self.quadrants.as_deref_mut() {
            for q in quadrants.iter_mut() {
                if intersects(q.bounds, hint) {
                    found |= q.remove(key, hint);
                }
            }
        }
        found
    }

    fn find_contains(&self, p: Point, out: &mut HashSet<K>) {
        out.extend(
            self.objects
                .iter()
                .filter(|(_, b)| rect_contains(**b, p))
                .map(|(k, _)| *k),
        );
        if let Some(quadrants) = self.quadrants.as_deref() {
            for q in quadrants {
                if rect_contains(q.bounds, p) {
                    q.find_contains(p, out);
                }
            }
        }
    }

    fn find_intersects(&self, r: Rect, out: &mut HashSet<K>) {
        out.extend(
            self.objects
                .iter()
                .filter(|(_, b)| intersects(**b, r))
                .map(|(k, _)| *k),
        );
        if let Some(quadrants) = self.quadrants.as_deref() {
            for q in quadrants {
                if intersects(q.bounds, r) {
                    q.find_intersects(r, out);
                }
            }
        }
    }

    fn find_inside(&self, r: Rect, out: &mut HashSet<K>) {
        out.extend(
            self.objects
                .iter()
                .filter(|(_, b)| rect_contains_rect(r, **b))
                .map(|(k, _)| *k),
        );
        if let Some(quadrants) = self.quadrants.as_deref() {
            for q in quadrants {
                if intersects(q.bounds, r) {
                    q.find_inside(r, out);
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self.quadrants.as_deref() {
            Some(qs) => 1 + qs.iter().map(Node::depth).max().unwrap_or(0),
            None => 1,
        }
    }
}

/// A quad-tree over `f64` rectangles.
#[derive(Debug, Clone)]
pub struct QuadTree<K> {
    root: Node<K>,
    outside: HashMap<K, Rect>,
    /// Bounds last passed to `add` for every entry, inside or outside.
    entries: HashMap<K, Rect>,
    config: QuadTreeConfig,
}

impl<K: Copy + Eq + Hash> Default for QuadTree<K> {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT, QuadTreeConfig::default())
    }
}

impl<K: Copy + Eq + Hash> QuadTree<K> {
    pub fn new(bounds: Rect, config: QuadTreeConfig) -> Self {
        Self {
            root: Node::new(bounds.abs()),
            outside: HashMap::new(),
            entries: HashMap::new(),
            config,
        }
    }

    /// Insert `key`, replacing any bounds previously stored for it.
    pub fn add(&mut self, key: K, bounds: Rect) {
        let bounds = bounds.abs();
        if self.entries.contains_key(&key) {
            self.remove(&key);
        }
        self.entries.insert(key, bounds);
        if rect_contains_rect(self.root.bounds, bounds) {
            self.root.add(key, bounds, &self.config);
        } else {
            self.outside.insert(key, bounds);
            if self.outside.len() > self.config.max_overflow {
                self.reorganize();
            }
        }
    }

    /// Remove `key`. Absent keys are ignored.
    pub fn remove(&mut self, key: &K) -> Option<Rect> {
        let bounds = self.entries.remove(key)?;
        if self.outside.remove(key).is_none() {
            self.root.remove(key, bounds);
        }
        Some(bounds)
    }

    /// Join every node into the root, grow the root over all entries, and
    /// reinsert everything.
    pub fn reorganize(&mut self) {
        self.root.join();
        let grown = union_all(self.outside.values().copied())
            .map_or(self.root.bounds, |o| o.union(self.root.bounds));
        log::debug!(
            "quadtree reorganize: {} entries, {} outside, root {:?} -> {:?}",
            self.entries.len(),
            self.outside.len(),
            self.root.bounds,
            grown
        );
        self.root = Node::new(grown);
        self.outside.clear();
        for (key, b) in &self.entries {
            self.root.add(*key, *b, &self.config);
        }
    }

    /// Keys whose bounds contain `p`.
    pub fn find_contains(&self, p: Point) -> HashSet<K> {
        let mut out = HashSet::new();
        self.root.find_contains(p, &mut out);
        out.extend(
            self.outside
                .iter()
                .filter(|(_, b)| rect_contains(**b, p))
                .map(|(k, _)| *k),
        );
        out
    }

    /// Keys whose bounds intersect `r`.
    pub fn find_intersects(&self, r: Rect) -> HashSet<K> {
        let r = r.abs();
        let mut out = HashSet::new();
        self.root.find_intersects(r, &mut out);
        out.extend(
            self.outside
                .iter()
                .filter(|(_, b)| intersects(**b, r))
                .map(|(k, _)| *k),
        );
        out
    }

    /// Keys whose bounds lie entirely inside `r`.
    pub fn find_inside(&self, r: Rect) -> HashSet<K> {
        let r = r.abs();
        let mut out = HashSet::new();
        self.root.find_inside(r, &mut out);
        out.extend(
            self.outside
                .iter()
                .filter(|(_, b)| rect_contains_rect(r, **b))
                .map(|(k, _)| *k),
        );
        out
    }

    pub fn bounds_of(&self, key: &K) -> Option<Rect> {
        self.entries.get(key).copied()
    }

    pub fn root_bounds(&self) -> Rect {
        self.root.bounds
    }

    pub fn outside_len(&self) -> usize {
        self.outside.len()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.root = Node::new(self.root.bounds);
        self.outside.clear();
        self.entries.clear();
    }
}
