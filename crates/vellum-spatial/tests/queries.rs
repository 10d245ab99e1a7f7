use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use vellum_core::*;
use vellum_spatial::*;

const SCENE: &str = include_str!("fixtures/scene.json");

fn scene() -> Document {
    parse_document_text(SCENE).unwrap().document
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

/// Small deterministic xorshift stream for reproducible layouts.
struct Stream(u64);

impl Stream {
    fn next(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % 10_000) as f64 / 10.0
    }
}

#[test]
fn point_queries_never_miss_exact_hits() {
    let mut stream = Stream(0x9e37_79b9_7f4a_7c15);
    let mut bounds = BTreeMap::new();
    for i in 0..300 {
        let x = stream.next() * 2.0 - 1000.0;
        let y = stream.next() * 2.0 - 1000.0;
        let w = stream.next() / 2.0;
        let h = stream.next() / 2.0;
        bounds.insert(id(&format!("q_{i}")), Bounds::new(x, y, w, h));
    }

    for cell_size in [7.5, 200.0, 1000.0] {
        let index = SpatialIndex::build_with(&bounds, &[], SpatialIndexConfig { cell_size });
        for _ in 0..500 {
            let px = stream.next() * 2.0 - 1000.0;
            let py = stream.next() * 2.0 - 1000.0;
            let candidates = index.query_point(px, py, 0.0);
            for (nid, b) in &bounds {
                if b.contains(px, py) {
                    assert!(
                        candidates.contains(nid),
                        "{nid} missed at ({px}, {py}) with cell size {cell_size}"
                    );
                }
            }
        }
    }
}

#[test]
fn boundary_points_are_candidates() {
    // Edges sit exactly on cell boundaries.
    let bounds = BTreeMap::from([(id("q_cell"), Bounds::new(200.0, 200.0, 200.0, 200.0))]);
    let index = SpatialIndex::build(&bounds, &[]);
    for (x, y) in [(200.0, 200.0), (400.0, 400.0), (400.0, 200.0), (300.0, 400.0)] {
        assert_eq!(index.query_point(x, y, 0.0), vec![id("q_cell")], "({x}, {y})");
    }
}

#[test]
fn scene_hit_testing_uses_world_bounds() {
    let doc = scene();
    let index = SpatialIndex::build(&active_page_bounds(&doc), &[]);

    // `pin` sits at (150, 10) inside `panel` at (600, 50).
    assert_eq!(topmost_hit(&doc, &index, 760.0, 70.0), Some(id("pin")));
    assert_eq!(
        hit_test(&doc, &index, 760.0, 70.0, 0.0),
        vec![id("pin"), id("panel")]
    );
    // The boolean's operands are painted after the boolean itself.
    assert_eq!(topmost_hit(&doc, &index, 310.0, 550.0), Some(id("logo_outer")));
    assert_eq!(topmost_hit(&doc, &index, 1100.0, 850.0), None);
}

#[test]
fn marquee_over_scene() {
    let doc = scene();
    let index = SpatialIndex::build(&active_page_bounds(&doc), &[]);
    let picked = marquee(
        &doc,
        &index,
        Bounds::new(0.0, 0.0, 300.0, 130.0),
        MarqueeMode::Contain,
    );
    assert_eq!(picked, vec![id("a"), id("b")]);
}

#[test]
fn nearby_finds_snap_candidates() {
    let doc = scene();
    let root = doc.root_id;
    let index = SpatialIndex::build(&active_page_bounds(&doc), &[root]);
    // `a` spans (10, 10)..(110, 60); `b` starts at x = 200.
    assert!(!index.query_nearby(id("a"), 0.0).contains(&root));
    let near = index.query_nearby(id("a"), 100.0);
    assert!(near.contains(&id("b")));
    assert!(!near.contains(&id("a")));
}

#[test]
fn excluded_ids_are_not_indexed() {
    let doc = scene();
    let bounds = active_page_bounds(&doc);
    let index = SpatialIndex::build(&bounds, &[id("panel"), id("pin")]);
    assert_eq!(index.len(), bounds.len() - 2);
    assert!(index.bounds_of(id("panel")).is_none());
    assert_eq!(topmost_hit(&doc, &index, 760.0, 70.0), None);
}
