//! Uniform-grid spatial index over a node bounds table.
//!
//! Every node is bucketed into each cell its bounding box overlaps. Cells
//! are keyed by `(floor(x / cell_size), floor(y / cell_size))`. Queries
//! enumerate the cells under the (expanded) query region and return the
//! deduplicated bucket contents. Results are *candidates*: a node that
//! overlaps the region is always returned, but a returned node may not.

use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};
use vellum_core::{Bounds, NodeId};

/// A node spanning more cells than this is kept on an overflow list that
/// every query returns.
const MAX_CELLS_PER_NODE: i64 = 4096;

type CellKey = (i64, i64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialIndexConfig {
    /// Side length of a grid cell in world units.
    pub cell_size: f64,
}

impl Default for SpatialIndexConfig {
    fn default() -> Self {
        Self { cell_size: 200.0 }
    }
}

/// Diagnostics gathered by the last build.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndexStats {
    pub node_count: usize,
    pub cell_count: usize,
    pub average_occupancy: f64,
    pub max_occupancy: usize,
    pub oversized: usize,
    pub build_duration: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    cell_size: f64,
    cells: HashMap<CellKey, SmallVec<[NodeId; 4]>>,
    oversized: Vec<NodeId>,
    bounds: BTreeMap<NodeId, Bounds>,
    stats: IndexStats,
}

impl SpatialIndex {
    /// Build an index with the default cell size.
    pub fn build(bounds: &BTreeMap<NodeId, Bounds>, exclude: &[NodeId]) -> Self {
        Self::build_with(bounds, exclude, SpatialIndexConfig::default())
    }

    /// Full rebuild from `bounds`, skipping `exclude` and any box with a
    /// non-finite coordinate.
    pub fn build_with(
        bounds: &BTreeMap<NodeId, Bounds>,
        exclude: &[NodeId],
        config: SpatialIndexConfig,
    ) -> Self {
        let started = Instant::now();
        let cell_size = if config.cell_size.is_finite() && config.cell_size > 0.0 {
            config.cell_size
        } else {
            log::debug!(
                "cell size {} is unusable, falling back to default",
                config.cell_size
            );
            SpatialIndexConfig::default().cell_size
        };

        let excluded: HashSet<NodeId> = exclude.iter().copied().collect();
        let mut index = SpatialIndex {
            cell_size,
            ..Default::default()
        };

        for (&id, b) in bounds {
            if excluded.contains(&id) {
                continue;
            }
            if !b.is_finite() {
                log::debug!("skipping `{id}`: non-finite bounds");
                continue;
            }
            let b = b.normalized();
            index.bounds.insert(id, b);

            let (min, max) = index.cell_span(&b);
            if cell_count(min, max) > MAX_CELLS_PER_NODE {
                index.oversized.push(id);
                continue;
            }
            for cx in min.0..=max.0 {
                for cy in min.1..=max.1 {
                    index.cells.entry((cx, cy)).or_default().push(id);
                }
            }
        }

        index.stats = index.collect_stats(started.elapsed());
        log::trace!(
            "spatial index: {} nodes in {} cells (avg {:.2}, max {}, {} oversized) in {:?}",
            index.stats.node_count,
            index.stats.cell_count,
            index.stats.average_occupancy,
            index.stats.max_occupancy,
            index.stats.oversized,
            index.stats.build_duration,
        );
        index
    }

    /// Candidates whose box lies within `tolerance` of `(x, y)`.
    pub fn query_point(&self, x: f64, y: f64, tolerance: f64) -> Vec<NodeId> {
        let t = if tolerance.is_finite() { tolerance.max(0.0) } else { 0.0 };
        self.query_region(Bounds::new(x - t, y - t, 2.0 * t, 2.0 * t))
    }

    /// Candidates whose box overlaps `rect`.
    pub fn query_rect(&self, rect: Bounds) -> Vec<NodeId> {
        self.query_region(rect.normalized())
    }

    /// Candidates within `radius` of `id`'s box, `id` itself excluded.
    /// Empty when `id` is not indexed.
    pub fn query_nearby(&self, id: NodeId, radius: f64) -> Vec<NodeId> {
        let Some(b) = self.bounds.get(&id) else {
            return Vec::new();
        };
        let r = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        let mut out = self.query_region(b.inflate(r));
        out.retain(|other| *other != id);
        out
    }

    /// Indexed box for `id`, as stored (normalized).
    pub fn bounds_of(&self, id: NodeId) -> Option<&Bounds> {
        self.bounds.get(&id)
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn cell_of(&self, x: f64, y: f64) -> CellKey {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    fn cell_span(&self, b: &Bounds) -> (CellKey, CellKey) {
        (self.cell_of(b.x, b.y), self.cell_of(b.max_x(), b.max_y()))
    }

    /// Sorted, deduplicated ids bucketed under `region`.
    fn query_region(&self, region: Bounds) -> Vec<NodeId> {
        if !region.is_finite() || self.bounds.is_empty() {
            return Vec::new();
        }
        let mut seen: HashSet<NodeId> = self.oversized.iter().copied().collect();
        let (min, max) = self.cell_span(&region);
        if cell_count(min, max) as usize > self.cells.len() {
            // Fewer occupied cells than cells under the region: scan them.
            for (&(cx, cy), ids) in &self.cells {
                if (min.0..=max.0).contains(&cx) && (min.1..=max.1).contains(&cy) {
                    seen.extend(ids.iter().copied());
                }
            }
        } else {
            for cx in min.0..=max.0 {
                for cy in min.1..=max.1 {
                    if let Some(ids) = self.cells.get(&(cx, cy)) {
                        seen.extend(ids.iter().copied());
                    }
                }
            }
        }

        let mut out: Vec<NodeId> = seen.into_iter().collect();
        out.sort();
        out
    }

    fn collect_stats(&self, build_duration: Duration) -> IndexStats {
        let cell_count = self.cells.len();
        let total: usize = self.cells.values().map(|ids| ids.len()).sum();
        IndexStats {
            node_count: self.bounds.len(),
            cell_count,
            average_occupancy: if cell_count == 0 {
                0.0
            } else {
                total as f64 / cell_count as f64
            },
            max_occupancy: self.cells.values().map(|ids| ids.len()).max().unwrap_or(0),
            oversized: self.oversized.len(),
            build_duration,
        }
    }
}

/// Number of cells in the inclusive span `min..=max`.
fn cell_count(min: CellKey, max: CellKey) -> i64 {
    let w = max.0.saturating_sub(min.0).saturating_add(1);
    let h = max.1.saturating_sub(min.1).saturating_add(1);
    w.saturating_mul(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn table(entries: &[(&str, Bounds)]) -> BTreeMap<NodeId, Bounds> {
        entries.iter().map(|(name, b)| (id(name), *b)).collect()
    }

    #[test]
    fn point_query_finds_candidates() {
        let bounds = table(&[
            ("g_a", Bounds::new(10.0, 10.0, 50.0, 50.0)),
            ("g_b", Bounds::new(500.0, 500.0, 20.0, 20.0)),
        ]);
        let index = SpatialIndex::build(&bounds, &[]);
        assert_eq!(index.query_point(20.0, 20.0, 0.0), vec![id("g_a")]);
        assert_eq!(index.query_point(510.0, 510.0, 0.0), vec![id("g_b")]);
        assert!(index.query_point(1000.0, 1000.0, 0.0).is_empty());
    }

    #[test]
    fn tolerance_reaches_into_neighbour_cells() {
        let bounds = table(&[("g_edge", Bounds::new(200.0, 0.0, 10.0, 10.0))]);
        let index = SpatialIndex::build(&bounds, &[]);
        assert!(index.query_point(195.0, 5.0, 0.0).is_empty());
        assert_eq!(index.query_point(195.0, 5.0, 10.0), vec![id("g_edge")]);
    }

    #[test]
    fn negative_coordinates_floor_correctly() {
        let bounds = table(&[("g_neg", Bounds::new(-250.0, -10.0, 20.0, 20.0))]);
        let index = SpatialIndex::build(&bounds, &[]);
        assert_eq!(index.query_point(-240.0, 0.0, 0.0), vec![id("g_neg")]);
        assert!(index.query_point(-100.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn spanning_node_is_returned_once() {
        let bounds = table(&[("g_wide", Bounds::new(0.0, 0.0, 900.0, 450.0))]);
        let index = SpatialIndex::build(&bounds, &[]);
        assert_eq!(index.stats().cell_count, 15);
        assert_eq!(
            index.query_rect(Bounds::new(-10.0, -10.0, 1000.0, 1000.0)),
            vec![id("g_wide")]
        );
    }

    #[test]
    fn excluded_and_non_finite_are_skipped() {
        let bounds = table(&[
            ("g_keep", Bounds::new(0.0, 0.0, 10.0, 10.0)),
            ("g_drop", Bounds::new(0.0, 0.0, 10.0, 10.0)),
            ("g_nan", Bounds::new(f64::NAN, 0.0, 10.0, 10.0)),
        ]);
        let index = SpatialIndex::build(&bounds, &[id("g_drop")]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.query_point(5.0, 5.0, 0.0), vec![id("g_keep")]);
    }

    #[test]
    fn nearby_excludes_self() {
        let bounds = table(&[
            ("g_me", Bounds::new(0.0, 0.0, 10.0, 10.0)),
            ("g_near", Bounds::new(15.0, 0.0, 10.0, 10.0)),
            ("g_far", Bounds::new(900.0, 900.0, 10.0, 10.0)),
        ]);
        let index = SpatialIndex::build(&bounds, &[]);
        assert_eq!(index.query_nearby(id("g_me"), 8.0), vec![id("g_near")]);
        assert!(index.query_nearby(id("g_unknown"), 8.0).is_empty());
    }

    #[test]
    fn oversized_nodes_are_always_candidates() {
        let bounds = table(&[("g_huge", Bounds::new(-1e9, -1e9, 2e9, 2e9))]);
        let index = SpatialIndex::build(&bounds, &[]);
        assert_eq!(index.stats().oversized, 1);
        assert_eq!(index.stats().cell_count, 0);
        assert_eq!(index.query_point(3.0, 4.0, 0.0), vec![id("g_huge")]);
    }

    #[test]
    fn unusable_cell_size_falls_back() {
        let index = SpatialIndex::build_with(
            &BTreeMap::new(),
            &[],
            SpatialIndexConfig { cell_size: 0.0 },
        );
        assert_eq!(index.cell_size(), 200.0);
        assert!(index.is_empty());
    }

    #[test]
    fn stats_report_occupancy() {
        let bounds = table(&[
            ("g_s1", Bounds::new(0.0, 0.0, 10.0, 10.0)),
            ("g_s2", Bounds::new(20.0, 20.0, 10.0, 10.0)),
            ("g_s3", Bounds::new(420.0, 20.0, 10.0, 10.0)),
        ]);
        let stats = *SpatialIndex::build(&bounds, &[]).stats();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.cell_count, 2);
        assert_eq!(stats.max_occupancy, 2);
        assert_eq!(stats.average_occupancy, 1.5);
    }
}
