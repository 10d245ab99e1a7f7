//! Boolean path resolver.
//!
//! Combines the outlines of a boolean node's operands (in `operandIds`
//! order, left to right) into one flattened outline. Operands are placed in
//! the boolean node's local space using their own position and rotation;
//! nested boolean operands resolve recursively and group operands
//! contribute the union of their children.
//!
//! The polygon clipping itself is done by `csgrs` sketches. Curves are
//! flattened with `kurbo` before they reach the clipper, so the resolved
//! path data contains straight segments only.

use crate::bounds::local_transform;
use crate::id::NodeId;
use crate::model::{BooleanErrorCode, BooleanOp, Bounds, Document, FillRule, Node, NodeKind};
use csgrs::sketch::Sketch;
use csgrs::traits::CSG;
use kurbo::{BezPath, Ellipse, PathEl, Point, Rect, RoundedRect, Shape};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

/// Curve flattening accuracy, independent from the node's numeric tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    pub flatten_tolerance: f64,
    pub ellipse_flatten_tolerance: f64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            flatten_tolerance: 0.1,
            ellipse_flatten_tolerance: 0.1,
        }
    }
}

/// Outcome of resolving one boolean node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ResolveResult {
    Ok {
        path_data: String,
        fill_rule: FillRule,
        /// In the boolean node's local space.
        bounds: Bounds,
    },
    Invalid {
        error_code: BooleanErrorCode,
    },
}

impl ResolveResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ResolveResult::Ok { .. })
    }

    pub fn error_code(&self) -> Option<BooleanErrorCode> {
        match self {
            ResolveResult::Ok { .. } => None,
            ResolveResult::Invalid { error_code } => Some(*error_code),
        }
    }
}

type Ring = Vec<Point>;

#[derive(Debug, Clone)]
struct Polygon {
    exterior: Ring,
    holes: Vec<Ring>,
}

type Resolved<T> = Result<T, BooleanErrorCode>;

// ─── Public API ──────────────────────────────────────────────────────────

/// Resolve with default flattening options.
pub fn resolve_boolean_node_path(doc: &Document, node: &Node) -> ResolveResult {
    resolve_with_options(doc, node, &ResolveOptions::default())
}

pub fn resolve_with_options(doc: &Document, node: &Node, opts: &ResolveOptions) -> ResolveResult {
    let mut visiting = HashSet::new();
    let outcome = combine(doc, node, opts, &mut visiting).and_then(|(sketch, tolerance)| {
        let polygons = polygons_of(&sketch, tolerance);
        emit_path(&polygons)
    });

    match outcome {
        Ok((path_data, bounds)) => ResolveResult::Ok {
            path_data,
            fill_rule: FillRule::Evenodd,
            bounds,
        },
        Err(error_code) => {
            warn!("boolean {} did not resolve: {error_code}", node.id);
            ResolveResult::Invalid { error_code }
        }
    }
}

// ─── Combination ─────────────────────────────────────────────────────────

/// Combine a boolean node's operands. Returns the sketch in the node's
/// local space together with the tolerance that governs it.
fn combine(
    doc: &Document,
    node: &Node,
    opts: &ResolveOptions,
    visiting: &mut HashSet<NodeId>,
) -> Resolved<(Sketch<()>, f64)> {
    let Some(data) = node.boolean_data() else {
        return Err(BooleanErrorCode::InvalidGeometry);
    };
    let tolerance = data.tolerance;
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(BooleanErrorCode::InvalidTolerance);
    }
    if !visiting.insert(node.id) {
        return Err(BooleanErrorCode::InvalidGeometry);
    }

    let operands: Vec<&Node> = data
        .operand_ids
        .iter()
        .filter_map(|id| doc.get(*id))
        .collect();
    if operands.len() < 2 {
        visiting.remove(&node.id);
        return Err(BooleanErrorCode::InsufficientOperands);
    }

    let mut sketches = Vec::with_capacity(operands.len());
    for operand in operands {
        let polygons = placed_polygons(doc, operand, opts, tolerance, visiting)?;
        sketches.push(guarded(|| to_sketch(&polygons))?);
    }
    visiting.remove(&node.id);

    let op = data.op;
    let combined = guarded(move || {
        let mut iter = sketches.into_iter();
        let first = iter.next().unwrap_or_else(Sketch::new);
        iter.fold(first, |acc, next| match op {
            BooleanOp::Union => acc.union(&next),
            BooleanOp::Subtract => acc.difference(&next),
            BooleanOp::Intersect => acc.intersection(&next),
            BooleanOp::Exclude => acc.union(&next).difference(&acc.intersection(&next)),
        })
    })?;
    Ok((combined, tolerance))
}

/// Run a clipping step, mapping a panic inside the clipper to a numerical failure.
fn guarded<T>(f: impl FnOnce() -> T) -> Resolved<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|_| BooleanErrorCode::NumericalFailure)
}

// ─── Operand outlines ────────────────────────────────────────────────────

fn placed_polygons(
    doc: &Document,
    node: &Node,
    opts: &ResolveOptions,
    tolerance: f64,
    visiting: &mut HashSet<NodeId>,
) -> Resolved<Vec<Polygon>> {
    let transform = local_transform(node);
    let local = local_polygons(doc, node, opts, tolerance, visiting)?;
    Ok(local
        .into_iter()
        .map(|p| Polygon {
            exterior: p.exterior.iter().map(|pt| transform * *pt).collect(),
            holes: p
                .holes
                .iter()
                .map(|h| h.iter().map(|pt| transform * *pt).collect())
                .collect(),
        })
        .collect())
}

fn local_polygons(
    doc: &Document,
    node: &Node,
    opts: &ResolveOptions,
    tolerance: f64,
    visiting: &mut HashSet<NodeId>,
) -> Resolved<Vec<Polygon>> {
    let (w, h) = (node.size.width, node.size.height);
    if !w.is_finite() || !h.is_finite() || !node.position.is_finite() {
        return Err(BooleanErrorCode::InvalidGeometry);
    }

    let path = match &node.kind {
        NodeKind::Boolean { .. } => {
            let (sketch, inner_tolerance) = combine(doc, node, opts, visiting)?;
            return Ok(polygons_of(&sketch, inner_tolerance));
        }
        NodeKind::Group => {
            let mut sketches = Vec::new();
            for child in node.children().iter().filter_map(|id| doc.get(*id)) {
                let polygons = placed_polygons(doc, child, opts, tolerance, visiting)?;
                sketches.push(guarded(|| to_sketch(&polygons))?);
            }
            let merged = guarded(move || {
                sketches
                    .into_iter()
                    .fold(Sketch::new(), |acc, s| acc.union(&s))
            })?;
            return Ok(polygons_of(&merged, tolerance));
        }
        NodeKind::Ellipse => Ellipse::new((w / 2.0, h / 2.0), (w / 2.0, h / 2.0), 0.0)
            .to_path(opts.ellipse_flatten_tolerance),
        NodeKind::Rectangle { corner_radius } | NodeKind::Frame { corner_radius, .. } => {
            match corner_radius {
                Some(r) if *r > 0.0 => {
                    RoundedRect::new(0.0, 0.0, w, h, r.min(w / 2.0).min(h / 2.0))
                        .to_path(opts.flatten_tolerance)
                }
                _ => Rect::new(0.0, 0.0, w, h).to_path(opts.flatten_tolerance),
            }
        }
        NodeKind::Text { .. } | NodeKind::Image { .. } | NodeKind::ComponentInstance { .. } => {
            Rect::new(0.0, 0.0, w, h).to_path(opts.flatten_tolerance)
        }
        NodeKind::Path {
            vector, path_data, ..
        } => match (vector, path_data) {
            (Some(v), _) if !v.points.is_empty() => v.to_bez_path(),
            (_, Some(d)) => BezPath::from_svg(d).map_err(|_| BooleanErrorCode::InvalidGeometry)?,
            _ => return Err(BooleanErrorCode::InvalidGeometry),
        },
    };

    let rings = flatten_rings(&path, opts.flatten_tolerance);
    if rings.is_empty() {
        return Err(BooleanErrorCode::InvalidGeometry);
    }
    for ring in &rings {
        check_ring(ring, tolerance)?;
    }

    if rings.len() == 1 {
        return Ok(rings
            .into_iter()
            .map(|exterior| Polygon {
                exterior,
                holes: Vec::new(),
            })
            .collect());
    }

    // Multiple subpaths fold with even-odd semantics so nested rings punch holes.
    let folded = guarded(|| {
        rings
            .iter()
            .map(|r| ring_sketch(r))
            .fold(Sketch::new(), |acc, s| {
                acc.union(&s).difference(&acc.intersection(&s))
            })
    })?;
    Ok(polygons_of(&folded, tolerance))
}

/// Flatten a path into closed rings, dropping repeated points.
fn flatten_rings(path: &BezPath, tolerance: f64) -> Vec<Ring> {
    fn finish(ring: &mut Ring, rings: &mut Vec<Ring>) {
        let done = open_ring(std::mem::take(ring).into_iter());
        if !done.is_empty() {
            rings.push(done);
        }
    }

    let mut rings = Vec::new();
    let mut current: Ring = Vec::new();

    kurbo::flatten(path.iter(), tolerance, |el| match el {
        PathEl::MoveTo(p) => {
            finish(&mut current, &mut rings);
            current.push(p);
        }
        PathEl::LineTo(p) => {
            if current.last() != Some(&p) {
                current.push(p);
            }
        }
        PathEl::ClosePath => finish(&mut current, &mut rings),
        _ => {}
    });
    finish(&mut current, &mut rings);
    rings
}

fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

fn check_ring(ring: &[Point], tolerance: f64) -> Resolved<()> {
    if ring.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(BooleanErrorCode::InvalidGeometry);
    }
    if ring.len() < 3 || signed_area(ring).abs() < tolerance {
        return Err(BooleanErrorCode::InvalidGeometry);
    }
    if self_intersects(ring) {
        return Err(BooleanErrorCode::SelfIntersection);
    }
    Ok(())
}

fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn segments_cross(a: Point, b: Point, c: Point, d: Point) -> bool {
    const EPS: f64 = 1e-12;
    let straddles = |p: f64, q: f64| (p > EPS && q < -EPS) || (p < -EPS && q > EPS);
    straddles(orient(c, d, a), orient(c, d, b)) && straddles(orient(a, b, c), orient(a, b, d))
}

/// True when two non-adjacent edges of the closed ring properly cross.
fn self_intersects(ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (ring[j], ring[(j + 1) % n]);
            if segments_cross(a, b, c, d) {
                return true;
            }
        }
    }
    false
}

// ─── Sketch conversion ───────────────────────────────────────────────────

fn ring_sketch(ring: &[Point]) -> Sketch<()> {
    let pts: Vec<[f64; 2]> = ring.iter().map(|p| [p.x, p.y]).collect();
    Sketch::polygon(&pts, None)
}

fn to_sketch(polygons: &[Polygon]) -> Sketch<()> {
    polygons.iter().fold(Sketch::new(), |acc, poly| {
        let shape = poly
            .holes
            .iter()
            .fold(ring_sketch(&poly.exterior), |s, hole| {
                s.difference(&ring_sketch(hole))
            });
        acc.union(&shape)
    })
}

/// Read polygons back out of a sketch, dropping slivers below `tolerance`.
fn polygons_of(sketch: &Sketch<()>, tolerance: f64) -> Vec<Polygon> {
    let keep = |ring: &Ring| ring.len() >= 3 && signed_area(ring).abs() >= tolerance;

    sketch
        .to_multipolygon()
        .0
        .iter()
        .filter_map(|poly| {
            let exterior = open_ring(poly.exterior().0.iter().map(|c| Point::new(c.x, c.y)));
            keep(&exterior).then(|| Polygon {
                exterior,
                holes: poly
                    .interiors()
                    .iter()
                    .map(|ls| open_ring(ls.0.iter().map(|c| Point::new(c.x, c.y))))
                    .filter(keep)
                    .collect(),
            })
        })
        .collect()
}

/// Collect ring points, dropping the repeated closing point.
fn open_ring(points: impl Iterator<Item = Point>) -> Ring {
    let mut ring: Ring = points.collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Encode polygons as SVG path data, one closed subpath per ring.
fn emit_path(polygons: &[Polygon]) -> Resolved<(String, Bounds)> {
    let mut path = BezPath::new();
    for ring in polygons
        .iter()
        .flat_map(|p| std::iter::once(&p.exterior).chain(p.holes.iter()))
    {
        let Some((first, rest)) = ring.split_first() else {
            continue;
        };
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }

    if path.elements().is_empty() {
        return Ok((String::new(), Bounds::default()));
    }
    let rect = path.bounding_box();
    let bounds = Bounds::from_kurbo(rect);
    if !bounds.is_finite() {
        return Err(BooleanErrorCode::NumericalFailure);
    }
    Ok((path.to_svg(), bounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BooleanData, Size};
    use crate::vector::{VectorData, VectorPoint};

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Node {
        Node::new(
            NodeId::intern(id),
            NodeKind::Rectangle {
                corner_radius: None,
            },
        )
        .at(x, y, w, h)
    }

    fn boolean_doc(op: BooleanOp, operands: Vec<Node>) -> (Document, Node) {
        let mut doc = Document::new();
        let ids: Vec<NodeId> = operands.iter().map(|n| n.id).collect();
        let mut b = Node::new(
            NodeId::intern("bool_under_test"),
            NodeKind::Boolean {
                boolean_data: BooleanData::new(op, ids.clone()),
            },
        );
        b.size = Size::new(200.0, 200.0);
        b.children = Some(ids);
        for n in operands {
            doc.nodes.insert(n.id, n);
        }
        doc.nodes.insert(b.id, b.clone());
        (doc, b)
    }

    fn bounds_of(result: &ResolveResult) -> Bounds {
        match result {
            ResolveResult::Ok { bounds, .. } => *bounds,
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[test]
    fn union_of_disjoint_rects() {
        let (doc, b) = boolean_doc(
            BooleanOp::Union,
            vec![rect("u_a", 0.0, 0.0, 50.0, 50.0), rect("u_b", 100.0, 0.0, 50.0, 50.0)],
        );
        let result = resolve_boolean_node_path(&doc, &b);
        assert!(bounds_of(&result).approx_eq(&Bounds::new(0.0, 0.0, 150.0, 50.0), 1e-6));
    }

    #[test]
    fn subtract_is_order_sensitive() {
        let (doc, b) = boolean_doc(
            BooleanOp::Subtract,
            vec![rect("s_a", 0.0, 0.0, 100.0, 100.0), rect("s_b", 50.0, 0.0, 100.0, 100.0)],
        );
        let result = resolve_boolean_node_path(&doc, &b);
        assert!(bounds_of(&result).approx_eq(&Bounds::new(0.0, 0.0, 50.0, 100.0), 1e-6));
    }

    #[test]
    fn intersect_overlap() {
        let (doc, b) = boolean_doc(
            BooleanOp::Intersect,
            vec![rect("i_a", 0.0, 0.0, 100.0, 100.0), rect("i_b", 50.0, 50.0, 100.0, 100.0)],
        );
        let result = resolve_boolean_node_path(&doc, &b);
        assert!(bounds_of(&result).approx_eq(&Bounds::new(50.0, 50.0, 50.0, 50.0), 1e-6));
    }

    #[test]
    fn intersect_of_disjoint_is_empty() {
        let (doc, b) = boolean_doc(
            BooleanOp::Intersect,
            vec![rect("e_a", 0.0, 0.0, 10.0, 10.0), rect("e_b", 50.0, 50.0, 10.0, 10.0)],
        );
        match resolve_boolean_node_path(&doc, &b) {
            ResolveResult::Ok {
                path_data, bounds, ..
            } => {
                assert!(path_data.is_empty());
                assert_eq!(bounds, Bounds::default());
            }
            other => panic!("expected empty ok, got {other:?}"),
        }
    }

    #[test]
    fn single_operand_is_insufficient() {
        let (doc, b) = boolean_doc(BooleanOp::Union, vec![rect("one", 0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(
            resolve_boolean_node_path(&doc, &b).error_code(),
            Some(BooleanErrorCode::InsufficientOperands)
        );
    }

    #[test]
    fn zero_tolerance_is_rejected() {
        let (doc, mut b) = boolean_doc(
            BooleanOp::Union,
            vec![rect("t_a", 0.0, 0.0, 10.0, 10.0), rect("t_b", 5.0, 5.0, 10.0, 10.0)],
        );
        if let Some(data) = b.boolean_data_mut() {
            data.tolerance = 0.0;
        }
        assert_eq!(
            resolve_boolean_node_path(&doc, &b).error_code(),
            Some(BooleanErrorCode::InvalidTolerance)
        );
    }

    #[test]
    fn bowtie_operand_self_intersects() {
        let mut bowtie = Node::new(
            NodeId::intern("bowtie"),
            NodeKind::Path {
                vector: Some(VectorData::from_points(
                    vec![
                        VectorPoint::new("a", 0.0, 0.0),
                        VectorPoint::new("b", 40.0, 40.0),
                        VectorPoint::new("c", 40.0, 0.0),
                        VectorPoint::new("d", 0.0, 40.0),
                    ],
                    true,
                )),
                path_data: None,
                fill_rule: None,
            },
        );
        bowtie.size = Size::new(40.0, 40.0);
        let (doc, b) = boolean_doc(
            BooleanOp::Union,
            vec![bowtie, rect("bt_r", 0.0, 0.0, 10.0, 10.0)],
        );
        assert_eq!(
            resolve_boolean_node_path(&doc, &b).error_code(),
            Some(BooleanErrorCode::SelfIntersection)
        );
    }

    #[test]
    fn degenerate_path_is_invalid_geometry() {
        let line = Node::new(
            NodeId::intern("flat_line"),
            NodeKind::Path {
                vector: None,
                path_data: Some("M0 0 L10 0 Z".into()),
                fill_rule: None,
            },
        );
        let (doc, b) = boolean_doc(
            BooleanOp::Union,
            vec![line, rect("dg_r", 0.0, 0.0, 10.0, 10.0)],
        );
        assert_eq!(
            resolve_boolean_node_path(&doc, &b).error_code(),
            Some(BooleanErrorCode::InvalidGeometry)
        );
    }

    #[test]
    fn ellipse_bounds_follow_position() {
        let ellipse = Node::new(NodeId::intern("ell"), NodeKind::Ellipse).at(10.0, 10.0, 40.0, 20.0);
        let (doc, b) = boolean_doc(
            BooleanOp::Union,
            vec![ellipse, rect("ell_r", 0.0, 0.0, 5.0, 5.0)],
        );
        let bounds = bounds_of(&resolve_boolean_node_path(&doc, &b));
        assert!(bounds.approx_eq(&Bounds::new(0.0, 0.0, 50.0, 30.0), 0.2));
    }
}
