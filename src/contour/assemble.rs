//! Stitches unordered cut segments into closed, oriented, hole-aware contours.

use crate::contour::{Contour, ContourPolygon, Orientation};
use crate::float_types::{Real, TAU, tolerance};
use crate::slice::Segment;
use geo::{Contains, Point, Polygon as GeoPolygon};
use nalgebra::Point2;

#[cfg(feature = "hashmap")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashmap"))]
use std::collections::HashMap;

/// Knobs for endpoint matching and chain repair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyOptions {
    /// Endpoints closer than this are the same node.
    pub snap_tolerance: Real,
    /// Open chains whose ends are at most this far apart are closed with a synthetic edge.
    pub max_gap: Real,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            snap_tolerance: tolerance(),
            max_gap: 1e-3,
        }
    }
}

/// What happened while assembling one layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub segments: usize,
    /// Closed loops found, before degenerate ones were dropped.
    pub loops: usize,
    /// Open chains closed across a small gap.
    pub closed_gaps: usize,
    /// Open chains that could not be closed and were dropped.
    pub discarded_chains: usize,
    /// Loops with fewer than three points or no enclosed area.
    pub degenerate_loops: usize,
    /// Clockwise loops not inside any outer boundary, promoted to outers.
    pub orphan_holes: usize,
}

/// Output of [`ContourAssembler::assemble`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub polygons: Vec<ContourPolygon>,
    pub report: AssemblyReport,
}

/// Endpoint graph with tolerance-snapped nodes.
struct SegmentGraph {
    nodes: Vec<Point2<Real>>,
    /// Directed edges `(from, to)` as produced by the intersector.
    edges: Vec<(usize, usize)>,
    incident: Vec<Vec<usize>>,
    cells: HashMap<(i64, i64), Vec<usize>>,
    cell_size: Real,
    snap: Real,
}

impl SegmentGraph {
    fn new(snap: Real, capacity: usize) -> Self {
        let snap = snap.max(Real::EPSILON);
        Self {
            nodes: Vec::with_capacity(capacity),
            edges: Vec::with_capacity(capacity),
            incident: Vec::with_capacity(capacity),
            cells: HashMap::with_capacity(capacity),
            cell_size: snap,
            snap,
        }
    }

    #[inline]
    fn cell_of(&self, p: &Point2<Real>) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Returns the node within snap distance of `p`, creating one if none exists.
    fn node_for(&mut self, p: Point2<Real>) -> usize {
        let (cx, cy) = self.cell_of(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(candidates) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &id in candidates {
                        if (self.nodes[id] - p).norm() <= self.snap {
                            return id;
                        }
                    }
                }
            }
        }
        let id = self.nodes.len();
        self.nodes.push(p);
        self.incident.push(Vec::new());
        self.cells.entry((cx, cy)).or_default().push(id);
        id
    }

    fn add_segment(&mut self, seg: &Segment) {
        let a = self.node_for(seg.start_xy());
        let b = self.node_for(seg.end_xy());
        if a == b {
            return;
        }
        let id = self.edges.len();
        self.edges.push((a, b));
        self.incident[a].push(id);
        self.incident[b].push(id);
    }

    #[inline]
    fn other_end(&self, edge: usize, node: usize) -> usize {
        let (a, b) = self.edges[edge];
        if a == node { b } else { a }
    }
}

/// A walked path through the graph.
struct Chain {
    nodes: Vec<usize>,
    forward: usize,
    backward: usize,
    closed: bool,
}

impl Chain {
    fn new(nodes: Vec<usize>, steps: &[bool], closed: bool) -> Self {
        let forward = steps.iter().filter(|&&f| f).count();
        Self {
            nodes,
            forward,
            backward: steps.len() - forward,
            closed,
        }
    }
}

/// Builds contours from the segments of one cut.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourAssembler {
    options: AssemblyOptions,
}

impl ContourAssembler {
    pub const fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Stitches `segments` into polygons.
    ///
    /// Orientation is decided by signed area, not by traversal order. Each
    /// clockwise loop is attached to the smallest counter-clockwise loop that
    /// contains it; a clockwise loop with no container becomes an outer
    /// boundary itself. Chains that cannot be closed are dropped and counted.
    pub fn assemble(&self, segments: &[Segment]) -> Assembly {
        let mut report = AssemblyReport {
            segments: segments.len(),
            ..Default::default()
        };

        let mut graph = SegmentGraph::new(self.options.snap_tolerance, segments.len());
        for seg in segments {
            graph.add_segment(seg);
        }

        let mut rings = Vec::new();
        for chain in walk_chains(&graph) {
            let mut points: Vec<Point2<Real>> = chain.nodes.iter().map(|&n| graph.nodes[n]).collect();
            if !chain.closed {
                let gap = match (points.first(), points.last()) {
                    (Some(first), Some(last)) => (last - first).norm(),
                    _ => Real::INFINITY,
                };
                if points.len() >= 3 && gap <= self.options.max_gap {
                    report.closed_gaps += 1;
                } else {
                    tracing::warn!(gap, points = points.len(), "discarding open contour chain");
                    report.discarded_chains += 1;
                    continue;
                }
            }
            report.loops += 1;
            if chain.backward > chain.forward {
                points.reverse();
            }

            let ring = Contour::new(points);
            let degenerate_area = self.options.snap_tolerance * self.options.snap_tolerance;
            if ring.len() < 3 || ring.area() <= degenerate_area {
                report.degenerate_loops += 1;
                continue;
            }
            rings.push(ring);
        }

        let polygons = nest_rings(rings, &mut report);
        tracing::debug!(
            segments = report.segments,
            polygons = polygons.len(),
            discarded = report.discarded_chains,
            "assembled contours"
        );
        Assembly { polygons, report }
    }
}

/// Walks every edge exactly once. Open chains are taken first, starting from
/// odd-degree nodes, so a broken loop comes out as one chain rather than two.
fn walk_chains(graph: &SegmentGraph) -> Vec<Chain> {
    let mut visited = vec![false; graph.edges.len()];
    let mut chains = Vec::new();

    for start in 0..graph.nodes.len() {
        if graph.incident[start].len() % 2 == 0 {
            continue;
        }
        while let Some(&edge) = graph.incident[start].iter().find(|&&e| !visited[e]) {
            chains.extend(walk_from(graph, start, edge, &mut visited));
        }
    }

    for edge in 0..graph.edges.len() {
        if !visited[edge] {
            let start = graph.edges[edge].0;
            chains.extend(walk_from(graph, start, edge, &mut visited));
        }
    }
    chains
}

/// Follows unvisited edges from `start` until it gets stuck.
///
/// Whenever the walk reaches a node already on its current path, the loop
/// just closed is split off as its own chain and the walk carries on from
/// that node. Two loops sharing a pinch vertex therefore never fuse into a
/// self-touching ring. Whatever is left when the walk stops is an open chain.
fn walk_from(graph: &SegmentGraph, start: usize, first_edge: usize, visited: &mut [bool]) -> Vec<Chain> {
    let mut chains = Vec::new();
    let mut nodes = vec![start];
    // `steps[i]` is true when the edge from `nodes[i]` was walked in its own direction
    let mut steps: Vec<bool> = Vec::new();
    let mut position: HashMap<usize, usize> = HashMap::new();
    position.insert(start, 0);

    let mut current = start;
    let mut edge = first_edge;
    loop {
        visited[edge] = true;
        steps.push(graph.edges[edge].0 == current);
        let previous = current;
        current = graph.other_end(edge, current);

        if let Some(&k) = position.get(&current) {
            let ring: Vec<usize> = nodes.drain(k..).collect();
            let ring_steps: Vec<bool> = steps.drain(k..).collect();
            for node in &ring[1..] {
                position.remove(node);
            }
            nodes.push(current);
            chains.push(Chain::new(ring, &ring_steps, true));
        } else {
            position.insert(current, nodes.len());
            nodes.push(current);
        }

        match next_edge(graph, previous, current, visited) {
            Some(e) => edge = e,
            None => break,
        }
    }

    if !steps.is_empty() {
        chains.push(Chain::new(nodes, &steps, false));
    }
    chains
}

/// Picks the unvisited edge at `here` making the sharpest left turn after
/// arriving from `from`. Edges that start at `here` win over edges that
/// would be walked against their direction.
fn next_edge(graph: &SegmentGraph, from: usize, here: usize, visited: &[bool]) -> Option<usize> {
    let origin = graph.nodes[here];
    let back = graph.nodes[from] - origin;
    // clockwise sweep from the incoming direction, in (0, TAU]
    let sweep = |e: usize| {
        let out = graph.nodes[graph.other_end(e, here)] - origin;
        let angle = -back.perp(&out).atan2(back.dot(&out));
        if angle <= 0.0 { angle + TAU } else { angle }
    };
    let sharpest = |outgoing: bool| {
        graph.incident[here]
            .iter()
            .copied()
            .filter(|&e| !visited[e] && (!outgoing || graph.edges[e].0 == here))
            .min_by(|&a, &b| sweep(a).total_cmp(&sweep(b)))
    };
    sharpest(true).or_else(|| sharpest(false))
}

/// Splits rings by orientation and attaches each hole to its innermost container.
fn nest_rings(rings: Vec<Contour>, report: &mut AssemblyReport) -> Vec<ContourPolygon> {
    let (outers, holes): (Vec<Contour>, Vec<Contour>) = rings
        .into_iter()
        .partition(|r| r.orientation() == Orientation::CounterClockwise);

    let outer_shapes: Vec<GeoPolygon<Real>> = outers.iter().map(Contour::to_geo_polygon).collect();
    let mut polygons: Vec<ContourPolygon> = outers
        .into_iter()
        .map(|outer| ContourPolygon::new(outer, Vec::new()))
        .collect();

    let mut orphans = Vec::new();
    for hole in holes {
        let hole_area = hole.area();
        let parent = outer_shapes
            .iter()
            .enumerate()
            .filter(|(i, shape)| {
                polygons[*i].outer.area() > hole_area
                    && hole
                        .points()
                        .iter()
                        .any(|p| shape.contains(&Point::new(p.x, p.y)))
            })
            .min_by(|(a, _), (b, _)| {
                polygons[*a]
                    .outer
                    .area()
                    .total_cmp(&polygons[*b].outer.area())
            })
            .map(|(i, _)| i);

        match parent {
            Some(i) => polygons[i].holes.push(hole),
            None => {
                report.orphan_holes += 1;
                orphans.push(ContourPolygon::new(
                    hole.with_orientation(Orientation::CounterClockwise),
                    Vec::new(),
                ));
            },
        }
    }
    polygons.extend(orphans);
    polygons
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point3;

    fn seg(a: (Real, Real), b: (Real, Real)) -> Segment {
        Segment::new(Point3::new(a.0, a.1, 0.0), Point3::new(b.0, b.1, 0.0))
    }

    fn ring_segments(points: &[(Real, Real)]) -> Vec<Segment> {
        (0..points.len())
            .map(|i| seg(points[i], points[(i + 1) % points.len()]))
            .collect()
    }

    #[test]
    fn shuffled_square_becomes_one_ccw_loop() {
        let mut segs = ring_segments(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        segs.swap(0, 2);
        let out = ContourAssembler::default().assemble(&segs);
        assert_eq!(out.polygons.len(), 1);
        assert_eq!(out.polygons[0].outer.len(), 4);
        assert_eq!(out.polygons[0].outer.signed_area(), 1.0);
        assert_eq!(out.report.discarded_chains, 0);
    }

    #[test]
    fn nearly_coincident_endpoints_snap() {
        let mut segs = ring_segments(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        segs[1].start.x += 1e-9;
        let out = ContourAssembler::default().assemble(&segs);
        assert_eq!(out.polygons.len(), 1);
        assert_eq!(out.report.closed_gaps, 0);
    }

    #[test]
    fn small_gap_is_closed_large_gap_discarded() {
        let opts = AssemblyOptions {
            snap_tolerance: 1e-9,
            max_gap: 0.1,
        };
        let segs = vec![seg((0.0, 0.0), (1.0, 0.0)), seg((1.0, 0.0), (1.0, 1.0)), seg((1.0, 1.0), (0.0, 0.05))];
        let out = ContourAssembler::new(opts).assemble(&segs);
        assert_eq!(out.report.closed_gaps, 1);
        assert_eq!(out.polygons.len(), 1);

        let wide = vec![seg((0.0, 0.0), (1.0, 0.0)), seg((1.0, 0.0), (1.0, 1.0))];
        let out = ContourAssembler::new(opts).assemble(&wide);
        assert!(out.polygons.is_empty());
        assert_eq!(out.report.discarded_chains, 1);
    }

    #[test]
    fn clockwise_loop_inside_outer_is_a_hole() {
        let mut segs = ring_segments(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        segs.extend(ring_segments(&[(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)]));
        let out = ContourAssembler::default().assemble(&segs);
        assert_eq!(out.polygons.len(), 1);
        assert_eq!(out.polygons[0].holes.len(), 1);
        assert_eq!(out.polygons[0].holes[0].orientation(), Orientation::Clockwise);
        assert_eq!(out.polygons[0].area(), 12.0);
    }

    #[test]
    fn orphan_hole_becomes_outer() {
        let segs = ring_segments(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        let out = ContourAssembler::default().assemble(&segs);
        assert_eq!(out.polygons.len(), 1);
        assert_eq!(out.report.orphan_holes, 1);
        assert_eq!(out.polygons[0].outer.orientation(), Orientation::CounterClockwise);
    }

    #[test]
    fn back_and_forth_edge_is_degenerate() {
        let segs = vec![seg((0.0, 0.0), (1.0, 0.0)), seg((1.0, 0.0), (0.0, 0.0))];
        let out = ContourAssembler::default().assemble(&segs);
        assert!(out.polygons.is_empty());
        assert_eq!(out.report.degenerate_loops, 1);
    }

    #[test]
    fn squares_sharing_a_corner_stay_separate() {
        let a = ring_segments(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let b = ring_segments(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)]);
        let segs: Vec<Segment> = a.into_iter().zip(b).flat_map(|(x, y)| [x, y]).collect();

        let out = ContourAssembler::default().assemble(&segs);
        assert_eq!(out.polygons.len(), 2);
        assert_eq!(out.report.loops, 2);
        for polygon in &out.polygons {
            assert_eq!(polygon.outer.len(), 4);
            assert!(polygon.outer.is_simple());
            assert_eq!(polygon.area(), 1.0);
        }
    }
}
