//! Closed reference solids and heightmap solids.

use crate::errors::{SliceError, SliceResult};
use crate::float_types::{Real, TAU};
use crate::mesh::{Mesh, Triangle, Vertex};
use nalgebra::Point3;

/// Triangle indices of a hexahedron whose corners are ordered
/// bottom ring (0..4) then top ring (4..8), both counter-clockwise from above.
const HEXAHEDRON_FACES: [[u32; 3]; 12] = [
    // bottom (-z)
    [0, 2, 1],
    [0, 3, 2],
    // top (+z)
    [4, 5, 6],
    [4, 6, 7],
    // front (-y)
    [0, 1, 5],
    [0, 5, 4],
    // back (+y)
    [3, 7, 6],
    [3, 6, 2],
    // left (-x)
    [0, 4, 7],
    [0, 7, 3],
    // right (+x)
    [1, 2, 6],
    [1, 6, 5],
];

impl Mesh {
    fn hexahedron(bottom: [Vertex; 4], top: [Vertex; 4]) -> Mesh {
        let mut vertices = Vec::with_capacity(8);
        vertices.extend_from_slice(&bottom);
        vertices.extend_from_slice(&top);
        let triangles = HEXAHEDRON_FACES
            .iter()
            .map(|&[a, b, c]| Triangle::new(a, b, c))
            .collect();
        Mesh::new(vertices, triangles)
    }

    /// Axis-aligned box spanning `(0,0,0)..(width, depth, height)`.
    /// 8 vertices, 12 outward-facing triangles.
    pub fn cuboid(width: Real, depth: Real, height: Real) -> Mesh {
        let ring = |z: Real| {
            [
                Point3::new(0.0, 0.0, z),
                Point3::new(width, 0.0, z),
                Point3::new(width, depth, z),
                Point3::new(0.0, depth, z),
            ]
        };
        Self::hexahedron(ring(0.0), ring(height))
    }

    /// Cube spanning `(0,0,0)..(size, size, size)`.
    pub fn cube(size: Real) -> Mesh {
        Self::cuboid(size, size, size)
    }

    /// Square frustum centered on the z axis with a flat top.
    ///
    /// The base spans `±bottom_half` at `z = 0`, the plateau spans `±top_half` at `z = height`.
    pub fn frustum(bottom_half: Real, top_half: Real, height: Real) -> Mesh {
        let ring = |h: Real, z: Real| {
            [
                Point3::new(-h, -h, z),
                Point3::new(h, -h, z),
                Point3::new(h, h, z),
                Point3::new(-h, h, z),
            ]
        };
        Self::hexahedron(ring(bottom_half, 0.0), ring(top_half, height))
    }

    /// Closed cone with its base disc at `z = 0` and apex at `(0, 0, height)`.
    pub fn cone(radius: Real, height: Real, segments: usize) -> Mesh {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(segments + 2);
        vertices.push(Point3::origin());
        vertices.push(Point3::new(0.0, 0.0, height));
        for i in 0..segments {
            let theta = TAU * (i as Real) / (segments as Real);
            vertices.push(Point3::new(radius * theta.cos(), radius * theta.sin(), 0.0));
        }

        let ring = |i: usize| (2 + i % segments) as u32;
        let mut triangles = Vec::with_capacity(segments * 2);
        for i in 0..segments {
            triangles.push(Triangle::new(ring(i), ring(i + 1), 1));
            triangles.push(Triangle::new(0, ring(i + 1), ring(i)));
        }
        Mesh::new(vertices, triangles)
    }

    /// Builds a watertight solid from a row-major height grid.
    ///
    /// The top surface follows `heights` with `cell_size` spacing in x and y,
    /// four vertical walls drop to `base_z`, and a flat base closes the solid.
    /// Sample `(col, row)` lands at `(col * cell_size, row * cell_size)`.
    pub fn from_heightmap(
        heights: &[Real],
        cols: usize,
        rows: usize,
        cell_size: Real,
        base_z: Real,
    ) -> SliceResult<Mesh> {
        if cols < 2 || rows < 2 {
            return Err(SliceError::InvalidInput(format!(
                "heightmap needs at least 2x2 samples, got {cols}x{rows}"
            )));
        }
        if heights.len() != cols * rows {
            return Err(SliceError::InvalidInput(format!(
                "heightmap has {} samples, expected {cols}x{rows}",
                heights.len()
            )));
        }
        if !(cell_size > 0.0) {
            return Err(SliceError::InvalidInput(format!(
                "cell size must be positive, got {cell_size}"
            )));
        }

        let n = cols * rows;
        let mut vertices = Vec::with_capacity(n * 2);
        for (i, &h) in heights.iter().enumerate() {
            let (c, r) = (i % cols, i / cols);
            vertices.push(Point3::new(c as Real * cell_size, r as Real * cell_size, h));
        }
        for i in 0..n {
            let (c, r) = (i % cols, i / cols);
            vertices.push(Point3::new(c as Real * cell_size, r as Real * cell_size, base_z));
        }

        let top = |c: usize, r: usize| (r * cols + c) as u32;
        let bottom = |c: usize, r: usize| (n + r * cols + c) as u32;
        let mut triangles = Vec::with_capacity(4 * (cols - 1) * (rows - 1) + 4 * (cols + rows));

        for r in 0..rows - 1 {
            for c in 0..cols - 1 {
                let (t00, t10, t11, t01) = (top(c, r), top(c + 1, r), top(c + 1, r + 1), top(c, r + 1));
                triangles.push(Triangle::new(t00, t10, t11));
                triangles.push(Triangle::new(t00, t11, t01));

                let (b00, b10, b11, b01) =
                    (bottom(c, r), bottom(c + 1, r), bottom(c + 1, r + 1), bottom(c, r + 1));
                triangles.push(Triangle::new(b00, b11, b10));
                triangles.push(Triangle::new(b00, b01, b11));
            }
        }

        // front (-y) and back (+y) walls
        let last_row = rows - 1;
        for c in 0..cols - 1 {
            let (b0, b1, t0, t1) = (bottom(c, 0), bottom(c + 1, 0), top(c, 0), top(c + 1, 0));
            triangles.push(Triangle::new(b0, b1, t1));
            triangles.push(Triangle::new(b0, t1, t0));

            let (b0, b1, t0, t1) = (
                bottom(c, last_row),
                bottom(c + 1, last_row),
                top(c, last_row),
                top(c + 1, last_row),
            );
            triangles.push(Triangle::new(b1, b0, t0));
            triangles.push(Triangle::new(b1, t0, t1));
        }

        // left (-x) and right (+x) walls
        let last_col = cols - 1;
        for r in 0..rows - 1 {
            let (b0, b1, t0, t1) = (bottom(0, r), bottom(0, r + 1), top(0, r), top(0, r + 1));
            triangles.push(Triangle::new(b1, b0, t0));
            triangles.push(Triangle::new(b1, t0, t1));

            let (b0, b1, t0, t1) = (
                bottom(last_col, r),
                bottom(last_col, r + 1),
                top(last_col, r),
                top(last_col, r + 1),
            );
            triangles.push(Triangle::new(b0, b1, t1));
            triangles.push(Triangle::new(b0, t1, t0));
        }

        Ok(Mesh::new(vertices, triangles))
    }
}
