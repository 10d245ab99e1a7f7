//! Vector path model: points with optional bezier handles, derived segments.
//!
//! Handles are stored as absolute positions in the same node-local space as
//! their point. Every mutation is followed by [`VectorData::normalize`],
//! which re-anchors the geometry at the origin and reports the offset so the
//! caller can fold it into the owning node's `position`.

use crate::model::{Bounds, Point};
use kurbo::BezPath;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CornerMode {
    #[default]
    Sharp,
    /// Handles stay collinear and equal length.
    Mirrored,
    /// Handles stay collinear, lengths independent.
    Asymmetric,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub corner_mode: CornerMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_handle: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_handle: Option<Point>,
}

impl VectorPoint {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            corner_mode: CornerMode::Sharp,
            in_handle: None,
            out_handle: None,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        if let Some(h) = self.in_handle.as_mut() {
            *h = h.translate(dx, dy);
        }
        if let Some(h) = self.out_handle.as_mut() {
            *h = h.translate(dx, dy);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSegment {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
}

/// Which bezier handle of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandleSide {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorData {
    pub points: Vec<VectorPoint>,
    #[serde(default)]
    pub segments: Vec<VectorSegment>,
    #[serde(default)]
    pub closed: bool,
}

/// Sequential chain over `points`, plus a closing segment when `closed` and
/// there are at least three points.
pub fn derive_segments(points: &[VectorPoint], closed: bool) -> Vec<VectorSegment> {
    let link = |a: &VectorPoint, b: &VectorPoint| VectorSegment {
        id: format!("{}-{}", a.id, b.id),
        from_id: a.id.clone(),
        to_id: b.id.clone(),
    };
    let mut segments: Vec<VectorSegment> = points.windows(2).map(|w| link(&w[0], &w[1])).collect();
    if closed
        && points.len() >= 3
        && let (Some(last), Some(first)) = (points.last(), points.first())
    {
        segments.push(link(last, first));
    }
    segments
}

impl VectorData {
    pub fn from_points(points: Vec<VectorPoint>, closed: bool) -> Self {
        let closed = closed && points.len() >= 3;
        let segments = derive_segments(&points, closed);
        Self {
            points,
            segments,
            closed,
        }
    }

    pub fn point(&self, id: &str) -> Option<&VectorPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    fn point_mut(&mut self, id: &str) -> Option<&mut VectorPoint> {
        self.points.iter_mut().find(|p| p.id == id)
    }

    /// Segments whose endpoints don't resolve to a point.
    pub fn dangling_segments(&self) -> Vec<&VectorSegment> {
        self.segments
            .iter()
            .filter(|s| self.point(&s.from_id).is_none() || self.point(&s.to_id).is_none())
            .collect()
    }

    /// Tight box over every point and handle.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.points.iter().flat_map(|p| {
            std::iter::once(p.position())
                .chain(p.in_handle)
                .chain(p.out_handle)
        }))
    }

    /// First unused `pt_N` id.
    pub fn next_point_id(&self) -> String {
        (1..)
            .map(|n| format!("pt_{n}"))
            .find(|id| self.point(id).is_none())
            .unwrap_or_default()
    }

    /// Re-anchor at the origin and rebuild segments.
    ///
    /// Returns the translation removed from the points; the caller adds it
    /// to the node position so the path stays put in its parent.
    pub fn normalize(&mut self) -> Point {
        if self.points.len() < 3 {
            self.closed = false;
        }
        let offset = match self.bounds() {
            Some(b) if b.is_finite() => Point::new(b.x, b.y),
            _ => Point::default(),
        };
        if offset.x != 0.0 || offset.y != 0.0 {
            for p in &mut self.points {
                p.translate(-offset.x, -offset.y);
            }
        }
        self.segments = derive_segments(&self.points, self.closed);
        offset
    }

    /// Insert a point at `index` (clamped; appended when `None`). Returns its id.
    pub fn add_point(&mut self, index: Option<usize>, x: f64, y: f64) -> String {
        let id = self.next_point_id();
        let at = index.unwrap_or(self.points.len()).min(self.points.len());
        self.points.insert(at, VectorPoint::new(id.clone(), x, y));
        id
    }

    /// Move a point, carrying its handles along.
    pub fn move_point(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(p) = self.point_mut(id) else {
            return false;
        };
        let (dx, dy) = (x - p.x, y - p.y);
        p.translate(dx, dy);
        true
    }

    pub fn delete_point(&mut self, id: &str) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.id != id);
        self.points.len() != before
    }

    /// Set or clear one handle. A mirrored point reflects the change onto
    /// its opposite handle.
    pub fn set_handle(&mut self, id: &str, side: HandleSide, handle: Option<Point>) -> bool {
        let Some(p) = self.point_mut(id) else {
            return false;
        };
        let mirrored = handle.map(|h| Point::new(2.0 * p.x - h.x, 2.0 * p.y - h.y));
        let mirror = p.corner_mode == CornerMode::Mirrored;
        match side {
            HandleSide::In => {
                p.in_handle = handle;
                if mirror {
                    p.out_handle = mirrored;
                }
            }
            HandleSide::Out => {
                p.out_handle = handle;
                if mirror {
                    p.in_handle = mirrored;
                }
            }
        }
        true
    }

    /// Scale every point and handle about the origin.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        let s = |pt: Point| Point::new(pt.x * sx, pt.y * sy);
        for p in &mut self.points {
            p.x *= sx;
            p.y *= sy;
            p.in_handle = p.in_handle.map(s);
            p.out_handle = p.out_handle.map(s);
        }
    }

    /// Path geometry in node-local space. Segments with no handles are
    /// straight lines, otherwise cubic curves.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.points.first() else {
            return path;
        };
        path.move_to((first.x, first.y));

        let segments = if self.segments.is_empty() || !self.dangling_segments().is_empty() {
            derive_segments(&self.points, self.closed)
        } else {
            self.segments.clone()
        };

        let mut cursor = first.id.as_str();
        for seg in &segments {
            let (Some(from), Some(to)) = (self.point(&seg.from_id), self.point(&seg.to_id)) else {
                continue;
            };
            if from.id != cursor {
                path.move_to((from.x, from.y));
            }
            match (from.out_handle, to.in_handle) {
                (None, None) => path.line_to((to.x, to.y)),
                (c1, c2) => {
                    let c1 = c1.unwrap_or(from.position());
                    let c2 = c2.unwrap_or(to.position());
                    path.curve_to((c1.x, c1.y), (c2.x, c2.y), (to.x, to.y));
                }
            }
            cursor = to.id.as_str();
        }
        if self.closed {
            path.close_path();
        }
        path
    }

    /// SVG path data for this vector.
    pub fn to_path_data(&self) -> String {
        self.to_bez_path().to_svg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> VectorData {
        VectorData::from_points(
            vec![
                VectorPoint::new("a", 10.0, 10.0),
                VectorPoint::new("b", 60.0, 10.0),
                VectorPoint::new("c", 35.0, 50.0),
            ],
            true,
        )
    }

    #[test]
    fn segments_close_the_chain() {
        let v = triangle();
        let ids: Vec<_> = v.segments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a-b", "b-c", "c-a"]);
    }

    #[test]
    fn two_points_cannot_close() {
        let mut v = VectorData::from_points(
            vec![VectorPoint::new("a", 0.0, 0.0), VectorPoint::new("b", 5.0, 5.0)],
            true,
        );
        assert!(!v.closed);
        v.closed = true;
        v.normalize();
        assert!(!v.closed);
        assert_eq!(v.segments.len(), 1);
    }

    #[test]
    fn normalize_reanchors_and_is_stable() {
        let mut v = triangle();
        let offset = v.normalize();
        assert_eq!(offset, Point::new(10.0, 10.0));
        assert_eq!(v.points[0].position(), Point::new(0.0, 0.0));

        let snapshot = v.clone();
        let again = v.normalize();
        assert_eq!(again, Point::default());
        assert_eq!(v, snapshot);
    }

    #[test]
    fn handles_count_toward_bounds() {
        let mut v = triangle();
        v.set_handle("a", HandleSide::In, Some(Point::new(0.0, 5.0)));
        let b = v.bounds().unwrap();
        assert_eq!(b.x, 0.0);
        assert_eq!(b.y, 5.0);
    }

    #[test]
    fn mirrored_handles_reflect() {
        let mut v = triangle();
        v.points[1].corner_mode = CornerMode::Mirrored;
        v.set_handle("b", HandleSide::Out, Some(Point::new(70.0, 20.0)));
        assert_eq!(v.points[1].in_handle, Some(Point::new(50.0, 0.0)));
    }

    #[test]
    fn add_and_delete_points() {
        let mut v = triangle();
        let id = v.add_point(Some(1), 30.0, 0.0);
        assert_eq!(id, "pt_1");
        assert_eq!(v.points[1].id, "pt_1");
        assert!(v.delete_point("pt_1"));
        assert!(!v.delete_point("pt_1"));
    }

    #[test]
    fn move_point_carries_handles() {
        let mut v = triangle();
        v.set_handle("a", HandleSide::Out, Some(Point::new(20.0, 10.0)));
        assert!(v.move_point("a", 0.0, 0.0));
        assert_eq!(v.points[0].out_handle, Some(Point::new(10.0, 0.0)));
    }

    #[test]
    fn path_data_uses_lines_and_curves() {
        use kurbo::PathEl;

        let mut v = triangle();
        let els = v.to_bez_path().elements().to_vec();
        assert_eq!(els[0], PathEl::MoveTo((10.0, 10.0).into()));
        assert_eq!(els[1], PathEl::LineTo((60.0, 10.0).into()));
        assert_eq!(els.last(), Some(&PathEl::ClosePath));

        v.set_handle("b", HandleSide::Out, Some(Point::new(70.0, 20.0)));
        let els = v.to_bez_path().elements().to_vec();
        assert!(matches!(els[2], PathEl::CurveTo(..)));
        assert!(v.to_path_data().contains('C'));
    }
}
