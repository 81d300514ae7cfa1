//! Plane/mesh intersection: the raw segments of one horizontal cut.

use crate::float_types::{Real, tolerance};
use crate::mesh::{Mesh, Triangle};
use nalgebra::{Point2, Point3};

/// Vertex lies on the plane (within epsilon).
pub const ON_PLANE: u8 = 0;
/// Vertex lies above the plane.
pub const ABOVE: u8 = 1;
/// Vertex lies below the plane.
pub const BELOW: u8 = 2;
/// Bitwise OR of `ABOVE` and `BELOW`: the triangle crosses the plane.
pub const SPANNING: u8 = 3;

/// One piece of a cut: where a single triangle crosses the plane.
///
/// Segments are oriented so that the solid lies to their left when viewed
/// from above. Chained together they run counter-clockwise around outer
/// boundaries and clockwise around holes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3<Real>,
    pub end: Point3<Real>,
}

impl Segment {
    pub const fn new(start: Point3<Real>, end: Point3<Real>) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn start_xy(&self) -> Point2<Real> {
        Point2::new(self.start.x, self.start.y)
    }

    #[inline]
    pub fn end_xy(&self) -> Point2<Real> {
        Point2::new(self.end.x, self.end.y)
    }

    /// Planar length.
    #[inline]
    pub fn length(&self) -> Real {
        (self.end_xy() - self.start_xy()).norm()
    }

    pub const fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }
}

/// Computes the segments where a mesh surface crosses a horizontal plane.
///
/// Per triangle:
/// - all three vertices on one side: nothing
/// - vertices on both sides: one segment through the two crossing edges, or from the
///   on-plane vertex to the crossing of the opposite edge
/// - two vertices on the plane: the shared edge, but only if the third vertex lies below,
///   so a flat top cut exactly at its height contributes its outline once
/// - all three on the plane: skipped
#[derive(Debug, Clone, Copy)]
pub struct PlaneIntersector {
    epsilon: Real,
}

impl Default for PlaneIntersector {
    fn default() -> Self {
        Self::new(tolerance())
    }
}

impl PlaneIntersector {
    /// `epsilon` is the distance within which a vertex counts as on the plane.
    pub fn new(epsilon: Real) -> Self {
        Self {
            epsilon: epsilon.abs(),
        }
    }

    pub const fn epsilon(&self) -> Real {
        self.epsilon
    }

    /// Classifies a height against the plane at `plane_z`.
    #[inline]
    pub fn classify(&self, z: Real, plane_z: Real) -> u8 {
        let d = z - plane_z;
        if d > self.epsilon {
            ABOVE
        } else if d < -self.epsilon {
            BELOW
        } else {
            ON_PLANE
        }
    }

    /// Returns the unordered segments of the cut at `plane_z`.
    ///
    /// Invalid triangles are skipped; an empty mesh gives an empty list.
    pub fn intersect(&self, mesh: &Mesh, plane_z: Real) -> Vec<Segment> {
        mesh.valid_triangles()
            .filter_map(|tri| self.intersect_triangle(mesh, tri, plane_z))
            .collect()
    }

    fn intersect_triangle(&self, mesh: &Mesh, tri: &Triangle, plane_z: Real) -> Option<Segment> {
        let idx = tri.indices;
        let pos = mesh.corners(tri)?;
        let types = pos.map(|p| self.classify(p.z, plane_z));

        let triangle_type = types.iter().fold(ON_PLANE, |acc, &t| acc | t);
        let on_count = types.iter().filter(|&&t| t == ON_PLANE).count();

        let mut points: Vec<Point3<Real>> = Vec::with_capacity(2);
        match (triangle_type, on_count) {
            (ON_PLANE, _) => return None,
            (SPANNING, _) => {
                for i in 0..3 {
                    let j = (i + 1) % 3;
                    if types[i] == ON_PLANE {
                        points.push(Point3::new(pos[i].x, pos[i].y, plane_z));
                    }
                    if (types[i] | types[j]) == SPANNING {
                        points.push(self.crossing((idx[i], &pos[i]), (idx[j], &pos[j]), plane_z));
                    }
                }
            },
            (BELOW, 2) => {
                for i in 0..3 {
                    if types[i] == ON_PLANE {
                        points.push(Point3::new(pos[i].x, pos[i].y, plane_z));
                    }
                }
            },
            _ => return None,
        }

        let [start, end] = <[Point3<Real>; 2]>::try_from(points).ok()?;
        let seg = Segment::new(start, end);
        if seg.length() <= self.epsilon {
            return None;
        }

        // Orient along z × n so the solid lies to the left.
        let n = (pos[1] - pos[0]).cross(&(pos[2] - pos[0]));
        let dir = (seg.end_xy() - seg.start_xy()).dot(&nalgebra::Vector2::new(-n.y, n.x));
        Some(if dir < 0.0 { seg.reversed() } else { seg })
    }

    /// Edge/plane crossing, always interpolated from the lower vertex index so
    /// both triangles sharing an edge produce bit-identical points.
    fn crossing(&self, a: (u32, &Point3<Real>), b: (u32, &Point3<Real>), plane_z: Real) -> Point3<Real> {
        let (a, b) = if a.0 <= b.0 { (a.1, b.1) } else { (b.1, a.1) };
        let dz = b.z - a.z;
        if dz.abs() > self.epsilon {
            let t = (plane_z - a.z) / dz;
            Point3::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y), plane_z)
        } else {
            Point3::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5, plane_z)
        }
    }
}

impl Mesh {
    /// Segments of the cut at `plane_z` using the default tolerance.
    pub fn slice_segments(&self, plane_z: Real) -> Vec<Segment> {
        PlaneIntersector::default().intersect(self, plane_z)
    }
}
