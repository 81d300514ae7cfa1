//! Stacked model: each layer's polygons extruded into a slab.

use crate::contour::{Contour, ContourPolygon, Orientation};
use crate::errors::SliceResult;
use crate::float_types::Real;
use crate::layer::Layer;
use crate::mesh::{Mesh, Triangle};
use geo::TriangulateEarcut;
use nalgebra::{Point2, Point3};

/// Extrudes `polygon` between `bottom` and `top`.
///
/// Caps are ear-cut triangulations of the polygon (holes respected), the top
/// facing +z and the bottom -z. Every ring edge gets an outward-facing wall quad.
/// Returns an empty mesh for rings with fewer than three points or a
/// non-positive thickness.
pub fn extrude_polygon(polygon: &ContourPolygon, bottom: Real, top: Real) -> Mesh {
    let mut mesh = Mesh::empty();
    if polygon.outer.len() < 3 || !(top > bottom) {
        return mesh;
    }

    let shape = ContourPolygon::new(
        polygon.outer.clone().with_orientation(Orientation::CounterClockwise),
        polygon
            .holes
            .iter()
            .filter(|h| h.len() >= 3)
            .cloned()
            .map(|h| h.with_orientation(Orientation::Clockwise))
            .collect(),
    );

    let triangulation = shape.to_geo().earcut_triangles_raw();
    let flat = triangulation.vertices;
    let n = flat.len() / 2;
    let xy = |i: usize| Point2::new(flat[2 * i], flat[2 * i + 1]);

    mesh.vertices.reserve(2 * n);
    for z in [bottom, top] {
        mesh.vertices
            .extend((0..n).map(|i| Point3::new(flat[2 * i], flat[2 * i + 1], z)));
    }

    for tri in triangulation.triangle_indices.chunks_exact(3) {
        let (a, mut b, mut c) = (tri[0], tri[1], tri[2]);
        let (pa, pb, pc) = (xy(a), xy(b), xy(c));
        let cross = (pb - pa).perp(&(pc - pa));
        if cross == 0.0 {
            continue;
        }
        if cross < 0.0 {
            std::mem::swap(&mut b, &mut c);
        }
        let top_offset = n as u32;
        mesh.triangles.push(Triangle::new(
            a as u32 + top_offset,
            b as u32 + top_offset,
            c as u32 + top_offset,
        ));
        mesh.triangles.push(Triangle::new(a as u32, c as u32, b as u32));
    }

    for ring in shape.contours() {
        push_walls(&mut mesh, ring, bottom, top);
    }
    mesh
}

/// Outward walls for a ring wound counter-clockwise (outer) or clockwise (hole).
fn push_walls(mesh: &mut Mesh, ring: &Contour, bottom: Real, top: Real) {
    for (p, q) in ring.edges() {
        if p == q {
            continue;
        }
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend([
            Point3::new(p.x, p.y, bottom),
            Point3::new(q.x, q.y, bottom),
            Point3::new(q.x, q.y, top),
            Point3::new(p.x, p.y, top),
        ]);
        mesh.triangles.push(Triangle::new(base, base + 1, base + 2));
        mesh.triangles.push(Triangle::new(base, base + 2, base + 3));
    }
}

/// Stacks every layer as a slab from its elevation up to `elevation + thickness`.
///
/// Fails when the stacked mesh outgrows `u32` vertex indices.
pub fn stack_layers(layers: &[Layer], thickness: Real) -> SliceResult<Mesh> {
    let mut mesh = Mesh::empty();
    for layer in layers {
        for polygon in &layer.polygons {
            mesh.append(&extrude_polygon(polygon, layer.elevation, layer.elevation + thickness))?;
        }
    }
    tracing::debug!(
        layers = layers.len(),
        vertices = mesh.vertices.len(),
        triangles = mesh.triangles.len(),
        "stacked layers"
    );
    Ok(mesh)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn ring(points: &[(Real, Real)]) -> Contour {
        Contour::new(points.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    #[test]
    fn square_slab_has_outward_normals() {
        let square = ContourPolygon::new(ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]), Vec::new());
        let slab = extrude_polygon(&square, 1.0, 1.5);
        assert_eq!(slab.valid_triangle_count(), 2 + 2 + 4 * 2);
        assert!(slab.is_closed());

        let center = Point3::new(1.0, 1.0, 1.25);
        for [a, b, c] in slab.valid_faces() {
            let n = Mesh::face_normal(&a, &b, &c).unwrap();
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            assert!(n.dot(&(centroid - center)) > 0.0);
        }
        let bb = slab.bounding_box().unwrap();
        assert_relative_eq!(bb.depth().unwrap(), 0.5);
    }

    #[test]
    fn hole_walls_face_into_the_hole() {
        let outer = ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hole = ring(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let slab = extrude_polygon(&ContourPolygon::new(outer, vec![hole]), 0.0, 1.0);
        assert!(slab.is_closed());

        let hole_center = Point2::new(2.0, 2.0);
        let mut hole_walls = 0;
        for [a, b, c] in slab.valid_faces() {
            let n = Mesh::face_normal(&a, &b, &c).unwrap();
            let mid = Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
            let inside_hole = (1.0..=3.0).contains(&mid.x) && (1.0..=3.0).contains(&mid.y);
            if n.z.abs() < 1e-9 && inside_hole {
                hole_walls += 1;
                assert!(n.x * (hole_center.x - mid.x) + n.y * (hole_center.y - mid.y) > 0.0);
            }
        }
        assert_eq!(hole_walls, 8);
    }

    #[test]
    fn stacking_skips_empty_layers_and_bad_thickness() {
        let square = ContourPolygon::new(ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]), Vec::new());
        let layers = vec![
            Layer::new(0, 0.0, vec![square.clone()]),
            Layer::new(1, 1.0, Vec::new()),
            Layer::new(2, 2.0, vec![square]),
        ];
        let stacked = stack_layers(&layers, 1.0).unwrap();
        assert_eq!(stacked.valid_triangle_count(), 2 * 12);
        assert_eq!(stacked.bounding_box().unwrap().max_z, Some(3.0));
        assert!(stack_layers(&layers, 0.0).unwrap().is_empty());
    }
}
