//! Integration tests: drawing membership, z-order and spatial queries.
//!
//! Every property is checked against both drawing implementations, which
//! must agree on answers and on order.

use hd_core::geom;
use hd_core::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn implementations() -> Vec<(&'static str, Box<dyn Drawing>)> {
    vec![
        ("default", DrawingKind::Default.create()),
        ("quadtree", DrawingKind::QuadTree.create()),
        (
            "small quadtree",
            Box::new(QuadTreeDrawing::with_index(QuadTree::new(
                Rect::new(0.0, 0.0, 64.0, 64.0),
                QuadTreeConfig {
                    max_capacity: 2,
                    min_size: 4.0,
                    max_overflow: 2,
                },
            ))) as Box<dyn Drawing>,
        ),
    ]
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Figure {
    Figure::rectangle(Rect::new(x, y, x + w, y + h))
}

/// Deterministic pseudo-random source.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, max: f64) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64 / (1u64 << 53) as f64) * max
    }
}

// ─── Membership ─────────────────────────────────────────────────────────

#[test]
fn count_tracks_adds_and_removes() {
    for (name, mut d) in implementations() {
        let mut rng = Lcg(3);
        let mut live: Vec<FigureId> = Vec::new();
        let mut removed: Vec<FigureId> = Vec::new();
        for step in 0..200 {
            if step % 3 == 2 && !live.is_empty() {
                let victim = live.remove((rng.next(live.len() as f64) as usize).min(live.len() - 1));
                assert!(d.remove(victim).is_some(), "{name}");
                removed.push(victim);
            } else {
                live.push(d.add(rect(rng.next(300.0), rng.next(300.0), 10.0, 10.0)));
            }
            assert_eq!(d.figure_count(), live.len(), "{name}");
        }
        assert!(live.iter().all(|id| d.contains(*id)), "{name}");
        assert!(removed.iter().all(|id| !d.contains(*id)), "{name}");
    }
}

#[test]
fn duplicate_add_is_ignored() {
    for (name, mut d) in implementations() {
        let f = rect(0.0, 0.0, 10.0, 10.0);
        let copy = f.clone();
        d.add(f);
        d.add(copy);
        assert_eq!(d.figure_count(), 1, "{name}");
    }
}

// ─── Z-order ─────────────────────────────────────────────────────────────

#[test]
fn later_figures_draw_in_front() {
    for (name, mut d) in implementations() {
        let ids: Vec<FigureId> = (0..5).map(|i| d.add(rect(i as f64, 0.0, 10.0, 10.0))).collect();
        let mut g = RecordingGraphics::new();
        d.draw(&mut g, Rect::new(-100.0, -100.0, 100.0, 100.0));
        assert_eq!(g.figure_order(), ids, "{name}");

        assert!(d.bring_to_front(ids[0]), "{name}");
        let mut g = RecordingGraphics::new();
        d.draw(&mut g, Rect::new(-100.0, -100.0, 100.0, 100.0));
        assert_eq!(g.figure_order().last(), Some(&ids[0]), "{name}");
        assert_eq!(g.figure_order().len(), 5, "{name}");
    }
}

#[test]
fn send_to_back_scenario() {
    for (name, mut d) in implementations() {
        let a = d.add(rect(0.0, 0.0, 10.0, 10.0));
        let b = d.add(rect(5.0, 5.0, 10.0, 10.0));
        let p = Point::new(7.0, 7.0);

        assert_eq!(d.find_figure(p), Some(b), "{name}");
        d.send_to_back(b);
        assert_eq!(d.find_figure(p), Some(a), "{name}");
        // Only B covers (12, 12), whatever the order.
        assert_eq!(d.find_figure(Point::new(12.0, 12.0)), Some(b), "{name}");
    }
}

#[test]
fn inserted_figure_is_found_inside_its_bounds() {
    for (name, mut d) in implementations() {
        d.add(rect(100.0, 100.0, 10.0, 10.0));
        let id = d.add(Figure::ellipse(Rect::new(0.0, 0.0, 20.0, 20.0)));
        assert_eq!(d.find_figure(Point::new(10.0, 10.0)), Some(id), "{name}");
        assert_eq!(d.find_figure(Point::new(1.0, 1.0)), None, "{name}");
    }
}

#[test]
fn implementations_agree_on_random_queries() {
    let mut rng = Lcg(11);
    let mut drawings = implementations();
    let mut ids = Vec::new();
    for _ in 0..150 {
        let f = rect(rng.next(200.0) - 50.0, rng.next(200.0) - 50.0, rng.next(30.0), rng.next(30.0));
        for (_, d) in &mut drawings {
            d.basic_add(f.clone());
        }
        ids.push(f.id());
    }
    // Shuffle z-order and move some figures outside the initial extent.
    for (i, id) in ids.iter().enumerate().step_by(7) {
        let dx = if i % 2 == 0 { 500.0 } else { -5.0 };
        for (_, d) in &mut drawings {
            d.send_to_back(*id);
            d.transform_figures(&[*id], Affine::translate((dx, 0.0)));
        }
    }

    for _ in 0..60 {
        let x = rng.next(800.0) - 100.0;
        let y = rng.next(300.0) - 100.0;
        let r = Rect::new(x, y, x + rng.next(120.0), y + rng.next(120.0));
        let p = Point::new(x, y);

        let mut answers = drawings.iter_mut().map(|(_, d)| {
            (
                d.find_figures(r),
                d.find_figures_within(r),
                d.find_figure(p),
            )
        });
        let first = answers.next().unwrap();
        for other in answers {
            assert_eq!(other, first);
        }
    }
}

// ─── Quad-tree ───────────────────────────────────────────────────────────

#[test]
fn quadtree_matches_brute_force_through_growth() {
    let mut rng = Lcg(99);
    let mut qt: QuadTree<u32> = QuadTree::new(
        Rect::new(0.0, 0.0, 100.0, 100.0),
        QuadTreeConfig {
            max_capacity: 3,
            min_size: 2.0,
            max_overflow: 5,
        },
    );
    let mut stored = Vec::new();
    for key in 0..400u32 {
        // Spread grows with the key so the root has to be reorganized.
        let spread = 100.0 + key as f64 * 5.0;
        let x = rng.next(spread) - spread / 4.0;
        let y = rng.next(spread) - spread / 4.0;
        let r = Rect::new(x, y, x + rng.next(20.0), y + rng.next(20.0));
        qt.add(key, r);
        stored.push((key, r));
    }
    assert!(qt.root_bounds().width() > 100.0);

    for _ in 0..100 {
        let x = rng.next(2000.0) - 500.0;
        let y = rng.next(2000.0) - 500.0;
        let q = Rect::new(x, y, x + rng.next(300.0), y + rng.next(300.0));
        let expected: HashSet<u32> = stored
            .iter()
            .filter(|(_, b)| geom::intersects(*b, q))
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(qt.find_intersects(q), expected);
    }
}
