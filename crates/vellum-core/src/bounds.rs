//! World-space bounds and paint order.
//!
//! Converts parent-relative node boxes into absolute axis-aligned bounds.
//! Each level contributes a translate to its position followed by a
//! rotation about its own center, so a rotated node's AABB grows to cover
//! its rotated corners.

use crate::id::NodeId;
use crate::model::{Bounds, Document, Node};
use kurbo::{Affine, Point, Rect};
use std::collections::{BTreeMap, HashSet};

/// Parent-space placement of a node.
pub fn local_transform(node: &Node) -> Affine {
    let translate = Affine::translate((node.position.x, node.position.y));
    match node.rotation {
        Some(deg) if deg != 0.0 && deg.is_finite() => {
            let center = Point::new(node.size.width / 2.0, node.size.height / 2.0);
            translate * Affine::rotate_about(deg.to_radians(), center)
        }
        _ => translate,
    }
}

/// Absolute AABB for every node reachable from `root` (root included).
pub fn world_bounds(doc: &Document, root: NodeId) -> BTreeMap<NodeId, Bounds> {
    let mut out = BTreeMap::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root, Affine::IDENTITY)];

    while let Some((id, parent)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = doc.get(id) else {
            continue;
        };
        let world = parent * local_transform(node);
        let local = Rect::new(0.0, 0.0, node.size.width, node.size.height);
        out.insert(id, Bounds::from_kurbo(world.transform_rect_bbox(local)));
        for child in node.children().iter().rev() {
            stack.push((*child, world));
        }
    }
    out
}

/// World bounds for the active page's tree.
pub fn active_page_bounds(doc: &Document) -> BTreeMap<NodeId, Bounds> {
    match doc.active_page() {
        Some(page) => world_bounds(doc, page.root_id),
        None => world_bounds(doc, doc.root_id),
    }
}

/// Nodes under `root` in paint order, back to front (pre-order DFS, children
/// in list order). The root itself comes first.
pub fn paint_order(doc: &Document, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = doc.get(id) else {
            continue;
        };
        out.push(id);
        stack.extend(node.children().iter().rev().copied());
    }
    out
}

/// Absolute top-left of a node's unrotated box, following its ancestors.
pub fn world_origin(doc: &Document, id: NodeId) -> Option<crate::model::Point> {
    let parents = doc.parent_map();
    let mut chain = vec![doc.get(id)?];
    let mut current = id;
    while let Some(parent) = parents.get(&current) {
        if chain.len() > doc.nodes.len() {
            break;
        }
        chain.push(doc.get(*parent)?);
        current = *parent;
    }
    let transform = chain
        .iter()
        .rev()
        .fold(Affine::IDENTITY, |acc, n| acc * local_transform(n));
    let p = transform * Point::ORIGIN;
    Some(crate::model::Point::new(p.x, p.y))
}
