//! Indexed triangle mesh shared read-only by slicing and export.

use crate::errors::{SliceError, SliceResult};
use crate::float_types::{NORMAL_EPSILON, Real};
use nalgebra::{Point3, Vector3};

pub mod bbox;
pub mod manifold;
pub mod shapes;

pub use bbox::BoundingBox;

/// A mesh vertex: a position in projected linear units (usually metres).
pub type Vertex = Point3<Real>;

/// Three vertex indices in counter-clockwise order when viewed from outside.
///
/// A triangle holding [`Triangle::INVALID`] in any slot has been removed and is
/// skipped by every consumer, as is a triangle referencing a vertex past the end
/// of the vertex list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle {
    pub indices: [u32; 3],
}

impl Triangle {
    /// Sentinel index marking a removed or degenerate triangle.
    pub const INVALID: u32 = u32::MAX;

    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }

    /// A triangle that every consumer will skip.
    pub const fn invalid() -> Self {
        Self {
            indices: [Self::INVALID; 3],
        }
    }

    /// Whether all three indices address one of `vertex_count` vertices.
    #[inline]
    pub fn is_valid_for(&self, vertex_count: usize) -> bool {
        self.indices
            .iter()
            .all(|&i| i != Self::INVALID && (i as usize) < vertex_count)
    }
}

/// Vertices plus triangles. Built once per generation run and never mutated
/// while slicing or exporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub const fn new(vertices: Vec<Vertex>, triangles: Vec<Triangle>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// A mesh with no vertices and no triangles.
    pub const fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// Marks triangle `index` as removed. Out of range indices are ignored.
    pub fn invalidate_triangle(&mut self, index: usize) {
        if let Some(tri) = self.triangles.get_mut(index) {
            *tri = Triangle::invalid();
        }
    }

    /// Resolves a triangle to its three corner positions, or `None` if it is invalid.
    #[inline]
    pub fn corners(&self, tri: &Triangle) -> Option<[Vertex; 3]> {
        if !tri.is_valid_for(self.vertices.len()) {
            return None;
        }
        let [a, b, c] = tri.indices;
        Some([
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ])
    }

    /// Iterates over the triangles that reference existing vertices, in storage order.
    pub fn valid_triangles(&self) -> impl Iterator<Item = &Triangle> + '_ {
        let vertex_count = self.vertices.len();
        self.triangles
            .iter()
            .filter(move |tri| tri.is_valid_for(vertex_count))
    }

    /// Corner positions of every valid triangle, in storage order.
    pub fn valid_faces(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        self.triangles.iter().filter_map(|tri| self.corners(tri))
    }

    /// Number of triangles an exporter will actually write.
    pub fn valid_triangle_count(&self) -> usize {
        self.valid_triangles().count()
    }

    /// Axis-aligned bounds of all vertices, or `None` for a mesh without vertices.
    ///
    /// Computed on demand; callers that mutate the mesh simply ask again.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter())
    }

    /// Unit right-hand normal of the face `(a, b, c)`.
    ///
    /// Returns `None` when the face is degenerate (cross product length at most 1e-12).
    pub fn face_normal(a: &Vertex, b: &Vertex, c: &Vertex) -> Option<Vector3<Real>> {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len > NORMAL_EPSILON {
            Some(n / len)
        } else {
            None
        }
    }

    /// Returns a copy with every vertex translated by `offset`.
    pub fn translated(&self, offset: Vector3<Real>) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| v + offset).collect(),
            triangles: self.triangles.clone(),
        }
    }

    /// Appends `other`, re-indexing its triangles. Invalid triangles stay invalid.
    ///
    /// Fails without touching `self` when a shifted index would not fit in a
    /// `u32` or would collide with [`Triangle::INVALID`].
    pub fn append(&mut self, other: &Mesh) -> SliceResult<()> {
        let overflow = || {
            SliceError::InvalidInput(format!(
                "appending {} vertices to a mesh of {} overflows the triangle index range",
                other.vertices.len(),
                self.vertices.len()
            ))
        };
        let offset = u32::try_from(self.vertices.len()).map_err(|_| overflow())?;
        self.vertices
            .len()
            .checked_add(other.vertices.len())
            .and_then(|total| u32::try_from(total).ok())
            .ok_or_else(overflow)?;

        let triangles = other
            .triangles
            .iter()
            .map(|tri| {
                if tri.indices.contains(&Triangle::INVALID) {
                    return Ok(Triangle::invalid());
                }
                match tri
                    .indices
                    .map(|i| i.checked_add(offset).filter(|&j| j != Triangle::INVALID))
                {
                    [Some(a), Some(b), Some(c)] => Ok(Triangle::new(a, b, c)),
                    _ => Err(overflow()),
                }
            })
            .collect::<SliceResult<Vec<_>>>()?;

        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(triangles);
        Ok(())
    }
}
