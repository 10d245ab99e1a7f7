//! Hit testing: point / marquee → node lookup.
//!
//! The grid only narrows the search. Candidates are refined here against
//! their exact world bounds and ordered by paint order, so the node drawn
//! last (topmost) comes first.

use crate::grid::SpatialIndex;
use std::collections::{HashMap, HashSet};
use vellum_core::{Bounds, Document, NodeId, paint_order};

/// How a marquee rectangle selects nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarqueeMode {
    /// Any overlap selects.
    #[default]
    Intersect,
    /// Only nodes fully inside the rectangle are selected.
    Contain,
}

/// Every node whose bounds lie within `tolerance` of `(x, y)`, topmost first.
///
/// Structural roots and hidden nodes never hit.
pub fn hit_test(
    doc: &Document,
    index: &SpatialIndex,
    x: f64,
    y: f64,
    tolerance: f64,
) -> Vec<NodeId> {
    let t = if tolerance.is_finite() { tolerance.max(0.0) } else { 0.0 };
    let hits = index
        .query_point(x, y, tolerance)
        .into_iter()
        .filter(|id| {
            index
                .bounds_of(*id)
                .is_some_and(|b| b.inflate(t).contains(x, y))
        })
        .collect();
    let mut ordered = in_paint_order(doc, hits);
    ordered.reverse();
    ordered
}

/// The topmost node at `(x, y)`, or `None` over the background.
pub fn topmost_hit(doc: &Document, index: &SpatialIndex, x: f64, y: f64) -> Option<NodeId> {
    hit_test(doc, index, x, y, 0.0).into_iter().next()
}

/// Nodes selected by a marquee drag, back to front.
pub fn marquee(
    doc: &Document,
    index: &SpatialIndex,
    rect: Bounds,
    mode: MarqueeMode,
) -> Vec<NodeId> {
    let rect = rect.normalized();
    let hits = index
        .query_rect(rect)
        .into_iter()
        .filter(|id| {
            index.bounds_of(*id).is_some_and(|b| match mode {
                MarqueeMode::Intersect => rect.intersects(b),
                MarqueeMode::Contain => {
                    b.x >= rect.x
                        && b.y >= rect.y
                        && b.max_x() <= rect.max_x()
                        && b.max_y() <= rect.max_y()
                }
            })
        })
        .collect();
    in_paint_order(doc, hits)
}

/// Keep selectable ids from `hits`, sorted back to front. Ids outside the
/// active page tree, and anything inside a hidden subtree, are dropped.
fn in_paint_order(doc: &Document, hits: Vec<NodeId>) -> Vec<NodeId> {
    let root = doc.active_page().map_or(doc.root_id, |page| page.root_id);
    let parents = doc.parent_map();
    let mut hidden = HashSet::new();
    let mut rank = HashMap::new();
    // Pre-order: a parent is classified before its children.
    for (i, id) in paint_order(doc, root).into_iter().enumerate() {
        let own = doc.get(id).is_some_and(|n| n.visible == Some(false));
        let inherited = parents.get(&id).is_some_and(|p| hidden.contains(p));
        if own || inherited {
            hidden.insert(id);
        } else {
            rank.insert(id, i);
        }
    }

    let mut ranked: Vec<(usize, NodeId)> = hits
        .into_iter()
        .filter(|id| !doc.is_structural_root(*id))
        .filter_map(|id| rank.get(&id).map(|r| (*r, id)))
        .collect();
    ranked.sort_unstable_by_key(|(r, _)| *r);
    ranked.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vellum_core::{Node, NodeKind, world_bounds};

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    /// Two overlapping boxes on the root, `ht_top` painted last.
    fn stacked() -> Document {
        let mut doc = Document::new();
        let root = doc.root_id;
        for (name, x) in [("ht_bottom", 0.0), ("ht_top", 50.0)] {
            let nid = id(name);
            doc.nodes.insert(
                nid,
                Node::new(nid, NodeKind::Rectangle { corner_radius: None }).at(x, 0.0, 100.0, 100.0),
            );
            doc.insert_child(root, nid, None);
        }
        doc
    }

    fn index_of(doc: &Document) -> SpatialIndex {
        SpatialIndex::build(&world_bounds(doc, doc.root_id), &[])
    }

    #[test]
    fn topmost_first() {
        let doc = stacked();
        let index = index_of(&doc);
        assert_eq!(
            hit_test(&doc, &index, 75.0, 50.0, 0.0),
            vec![id("ht_top"), id("ht_bottom")]
        );
        assert_eq!(topmost_hit(&doc, &index, 10.0, 50.0), Some(id("ht_bottom")));
    }

    #[test]
    fn background_misses() {
        let doc = stacked();
        let index = index_of(&doc);
        // Inside the root's box, but the root never hits.
        assert_eq!(topmost_hit(&doc, &index, 400.0, 400.0), None);
    }

    #[test]
    fn tolerance_widens_the_hit() {
        let doc = stacked();
        let index = index_of(&doc);
        assert!(hit_test(&doc, &index, 155.0, 50.0, 0.0).is_empty());
        assert_eq!(hit_test(&doc, &index, 155.0, 50.0, 6.0), vec![id("ht_top")]);
    }

    #[test]
    fn hidden_nodes_do_not_hit() {
        let mut doc = stacked();
        if let Some(top) = doc.get_mut(id("ht_top")) {
            top.visible = Some(false);
        }
        let index = index_of(&doc);
        assert_eq!(topmost_hit(&doc, &index, 75.0, 50.0), Some(id("ht_bottom")));
    }

    #[test]
    fn hidden_container_hides_its_children() {
        let mut doc = stacked();
        let group = id("ht_group");
        doc.nodes.insert(
            group,
            Node::new(group, NodeKind::Group).at(300.0, 0.0, 50.0, 50.0),
        );
        let root = doc.root_id;
        doc.insert_child(root, group, None);
        let child = id("ht_inner");
        doc.nodes.insert(
            child,
            Node::new(child, NodeKind::Ellipse).at(0.0, 0.0, 50.0, 50.0),
        );
        doc.insert_child(group, child, None);

        let index = index_of(&doc);
        assert_eq!(topmost_hit(&doc, &index, 310.0, 10.0), Some(child));

        if let Some(g) = doc.get_mut(group) {
            g.visible = Some(false);
        }
        let index = index_of(&doc);
        assert_eq!(topmost_hit(&doc, &index, 310.0, 10.0), None);
        let rect = Bounds::new(290.0, -10.0, 80.0, 80.0);
        assert!(marquee(&doc, &index, rect, MarqueeMode::Contain).is_empty());
    }

    #[test]
    fn marquee_modes() {
        let doc = stacked();
        let index = index_of(&doc);
        let rect = Bounds::new(-10.0, -10.0, 120.0, 120.0);
        assert_eq!(
            marquee(&doc, &index, rect, MarqueeMode::Intersect),
            vec![id("ht_bottom"), id("ht_top")]
        );
        assert_eq!(
            marquee(&doc, &index, rect, MarqueeMode::Contain),
            vec![id("ht_bottom")]
        );
    }
}
