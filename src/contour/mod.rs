//! Closed 2D contours and their outer/hole grouping.
//!
//! A [`Contour`] stores its ring without repeating the first point; the
//! closing edge from the last point back to the first is implicit.
//! Outer boundaries run counter-clockwise and holes clockwise.

use crate::float_types::Real;
use crate::mesh::BoundingBox;
use geo::{Contains, Coord, LineString, Point, Polygon as GeoPolygon};
use nalgebra::Point2;

pub mod assemble;
pub mod process;

pub use assemble::{AssemblyOptions, AssemblyReport, ContourAssembler};
pub use process::{ContourProcessor, ProcessingOptions, WidthEstimate};

/// Winding direction seen from above (+z looking down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Positive signed area. Outer boundaries.
    CounterClockwise,
    /// Negative signed area. Holes.
    Clockwise,
}

/// An implicitly closed ring of planar points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    points: Vec<Point2<Real>>,
}

impl Contour {
    /// Builds a contour; an explicit closing point equal to the first is dropped.
    pub fn new(mut points: Vec<Point2<Real>>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[Point2<Real>] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<Point2<Real>> {
        self.points
    }

    /// The ring with its first point repeated at the end.
    pub fn closed_points(&self) -> Vec<Point2<Real>> {
        let mut out = self.points.clone();
        if let Some(&first) = self.points.first() {
            out.push(first);
        }
        out
    }

    /// Consecutive edges, including the closing one.
    pub fn edges(&self) -> impl Iterator<Item = (Point2<Real>, Point2<Real>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Shoelace area: positive for counter-clockwise rings.
    pub fn signed_area(&self) -> Real {
        if self.points.len() < 3 {
            return 0.0;
        }
        let twice: Real = self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum();
        twice * 0.5
    }

    #[inline]
    pub fn area(&self) -> Real {
        self.signed_area().abs()
    }

    pub fn perimeter(&self) -> Real {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.edges().map(|(a, b)| (b - a).norm()).sum()
    }

    pub fn orientation(&self) -> Orientation {
        if self.signed_area() >= 0.0 {
            Orientation::CounterClockwise
        } else {
            Orientation::Clockwise
        }
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Returns the contour wound in `orientation`, reversing only if needed.
    pub fn with_orientation(self, orientation: Orientation) -> Self {
        if self.orientation() == orientation {
            self
        } else {
            let mut points = self.points;
            points.reverse();
            Self { points }
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points_2d(self.points.iter())
    }

    /// Strict interior containment; points on the boundary are not contained.
    pub fn contains_point(&self, p: &Point2<Real>) -> bool {
        self.to_geo_polygon().contains(&Point::new(p.x, p.y))
    }

    /// `true` when no two non-adjacent edges intersect.
    pub fn is_simple(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let edges: Vec<_> = self.edges().collect();
        for i in 0..n {
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    continue;
                }
                if segments_intersect(edges[i], edges[j]) {
                    return false;
                }
            }
        }
        true
    }

    pub fn to_line_string(&self) -> LineString<Real> {
        LineString::from(
            self.closed_points()
                .iter()
                .map(|p| Coord { x: p.x, y: p.y })
                .collect::<Vec<_>>(),
        )
    }

    pub fn to_geo_polygon(&self) -> GeoPolygon<Real> {
        GeoPolygon::new(self.to_line_string(), Vec::new())
    }
}

fn cross(o: Point2<Real>, a: Point2<Real>, b: Point2<Real>) -> Real {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn on_segment(p: Point2<Real>, a: Point2<Real>, b: Point2<Real>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(
    (p1, p2): (Point2<Real>, Point2<Real>),
    (q1, q2): (Point2<Real>, Point2<Real>),
) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(p1, q1, q2))
        || (d2 == 0.0 && on_segment(p2, q1, q2))
        || (d3 == 0.0 && on_segment(q1, p1, p2))
        || (d4 == 0.0 && on_segment(q2, p1, p2))
}

/// An outer boundary with the holes it directly contains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourPolygon {
    pub outer: Contour,
    pub holes: Vec<Contour>,
}

impl ContourPolygon {
    pub const fn new(outer: Contour, holes: Vec<Contour>) -> Self {
        Self { outer, holes }
    }

    /// Outer area minus hole areas.
    pub fn area(&self) -> Real {
        self.outer.area() - self.holes.iter().map(Contour::area).sum::<Real>()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.outer.bounding_box()
    }

    /// Outer first, then holes.
    pub fn contours(&self) -> impl Iterator<Item = &Contour> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    pub fn point_count(&self) -> usize {
        self.contours().map(Contour::len).sum()
    }

    pub fn to_geo(&self) -> GeoPolygon<Real> {
        GeoPolygon::new(
            self.outer.to_line_string(),
            self.holes.iter().map(Contour::to_line_string).collect(),
        )
    }
}

/// Bounds of every outer boundary in `polygons`.
pub fn polygons_bounding_box(polygons: &[ContourPolygon]) -> Option<BoundingBox> {
    polygons
        .iter()
        .filter_map(ContourPolygon::bounding_box)
        .reduce(|a, b| a.union(&b))
}

#[cfg(test)]
mod test {
    use super::*;

    fn square(size: Real) -> Contour {
        Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ])
    }

    #[test]
    fn explicit_closing_point_is_dropped() {
        let c = Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ]);
        assert_eq!(c.len(), 3);
        let closed = c.closed_points();
        assert_eq!(closed.first(), closed.last());
    }

    #[test]
    fn shoelace_sign_follows_winding() {
        let ccw = square(2.0);
        assert_eq!(ccw.signed_area(), 4.0);
        assert_eq!(ccw.orientation(), Orientation::CounterClockwise);
        let cw = ccw.reversed();
        assert_eq!(cw.signed_area(), -4.0);
        assert_eq!(cw.clone().with_orientation(Orientation::CounterClockwise), ccw);
        assert_eq!(ccw.perimeter(), 8.0);
    }

    #[test]
    fn containment_and_simplicity() {
        let s = square(2.0);
        assert!(s.contains_point(&Point2::new(1.0, 1.0)));
        assert!(!s.contains_point(&Point2::new(3.0, 1.0)));
        assert!(s.is_simple());

        let bowtie = Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ]);
        assert!(!bowtie.is_simple());
    }

    #[test]
    fn polygon_area_subtracts_holes() {
        let hole = Contour::new(vec![
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 1.0),
        ]);
        let poly = ContourPolygon::new(square(3.0), vec![hole]);
        assert_eq!(poly.area(), 8.0);
        assert_eq!(poly.point_count(), 8);
    }
}
