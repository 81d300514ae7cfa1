mod support;

use approx::assert_relative_eq;
use nalgebra::Vector3;
use proptest::prelude::*;
use support::{framed_square, plateau_heightmap, saddle_heightmap, slice_exact};
use topo_slicer::{
    Mesh, Orientation, Real, Triangle, contour::ContourAssembler, contour::AssemblyOptions,
    extrude::extrude_polygon, slice::PlaneIntersector,
};

#[test]
fn unit_cube_mid_cut_is_one_square() {
    let layers = slice_exact(&Mesh::cube(1.0), &[0.5]);
    assert_eq!(layers.len(), 1);
    let layer = &layers[0];
    assert_eq!(layer.polygons.len(), 1);
    assert!(layer.polygons[0].holes.is_empty());
    assert_relative_eq!(layer.area(), 1.0, epsilon = 1e-9);
    assert_eq!(layer.polygons[0].outer.orientation(), Orientation::CounterClockwise);
    assert!(layer.polygons[0].outer.is_simple());
    assert_eq!(layer.discarded_chains, 0);
}

#[test]
fn planes_outside_the_mesh_give_empty_layers() {
    let cone = Mesh::cone(5.0, 10.0, 32);
    let layers = slice_exact(&cone, &[-1.0, 10.5, 20.0]);
    assert!(layers.iter().all(|l| l.is_empty()));
    assert!(cone.slice_segments(11.0).is_empty());
}

#[test]
fn cone_sections_shrink_with_height() {
    let cone = Mesh::cone(5.0, 10.0, 48);
    let layers = slice_exact(&cone, &[2.0, 5.0, 8.0]);
    let areas: Vec<Real> = layers.iter().map(|l| l.area()).collect();
    assert!(areas[0] > areas[1] && areas[1] > areas[2]);
    // radius at half height is 2.5
    let expected = std::f64::consts::PI as Real * 2.5 * 2.5;
    assert_relative_eq!(areas[1], expected, max_relative = 0.01);
}

#[test]
fn flat_top_cut_at_its_height_yields_plateau_once() {
    let frustum = Mesh::frustum(3.0, 1.0, 2.0);
    let layers = slice_exact(&frustum, &[2.0]);
    let layer = &layers[0];
    assert_eq!(layer.polygons.len(), 1);
    assert_relative_eq!(layer.area(), 4.0, epsilon = 1e-9);
    assert_eq!(layer.discarded_chains, 0);
}

#[test]
fn slicing_an_extruded_frame_recovers_its_hole() {
    let slab = extrude_polygon(&framed_square(4.0, 2.0), 0.0, 1.0);
    assert!(slab.is_closed());

    let layers = slice_exact(&slab, &[0.5]);
    let layer = &layers[0];
    assert_eq!(layer.polygons.len(), 1);
    let polygon = &layer.polygons[0];
    assert_eq!(polygon.holes.len(), 1);
    assert_eq!(polygon.outer.orientation(), Orientation::CounterClockwise);
    assert_eq!(polygon.holes[0].orientation(), Orientation::Clockwise);
    assert_relative_eq!(polygon.area(), 12.0, epsilon = 1e-9);
}

#[test]
fn heightmap_island_appears_above_the_plain() {
    let terrain = plateau_heightmap();
    assert!(terrain.is_closed());

    let layers = slice_exact(&terrain, &[-5.0, 2.5, 6.0]);
    // below the plain: the whole footprint
    assert_relative_eq!(layers[0].area(), 900.0, epsilon = 1e-6);
    // halfway up the island flanks: one smaller ring
    assert_eq!(layers[1].polygons.len(), 1);
    assert!(layers[1].area() > 100.0 && layers[1].area() < 900.0);
    // above the summit
    assert!(layers[2].is_empty());
}

#[test]
fn shared_edges_produce_identical_crossings() {
    let cube = Mesh::cube(1.0).translated(Vector3::new(0.25, -0.5, 0.0));
    let segments = PlaneIntersector::default().intersect(&cube, 0.3);
    let assembly = ContourAssembler::new(AssemblyOptions {
        snap_tolerance: 1e-12,
        max_gap: 0.0,
    })
    .assemble(&segments);
    assert_eq!(assembly.report.discarded_chains, 0);
    assert_eq!(assembly.report.closed_gaps, 0);
    assert_eq!(assembly.polygons.len(), 1);
}

#[test]
fn invalid_triangles_never_reach_the_cut() {
    let mut cube = Mesh::cube(1.0);
    for i in 4..8 {
        cube.invalidate_triangle(i);
    }
    let segments = cube.slice_segments(0.5);
    assert_eq!(segments.len(), 4);
}

/// Same surface, triangles listed in `order` with each one's corners rotated
/// `turns[i]` places (winding kept).
fn reordered(mesh: &Mesh, order: &[usize], turns: &[usize]) -> Mesh {
    let triangles = order
        .iter()
        .zip(turns)
        .map(|(&i, &k)| {
            let mut indices = mesh.triangles[i].indices;
            indices.rotate_left(k);
            Triangle::new(indices[0], indices[1], indices[2])
        })
        .collect();
    Mesh::new(mesh.vertices.clone(), triangles)
}

/// Sorted region areas of the saddle cut, or `None` if any ring self-touches.
fn saddle_regions(mesh: &Mesh) -> Option<Vec<Real>> {
    let layers = slice_exact(mesh, &[5.0]);
    let polygons = &layers[0].polygons;
    let simple = polygons
        .iter()
        .all(|p| p.outer.is_simple() && p.holes.iter().all(|h| h.is_simple()));
    if !simple {
        return None;
    }
    let mut areas: Vec<Real> = polygons.iter().map(|p| p.area()).collect();
    areas.sort_by(|a, b| a.total_cmp(b));
    Some(areas)
}

#[test]
fn saddle_point_splits_into_two_simple_regions() {
    let mesh = saddle_heightmap();
    let n = mesh.triangles.len();
    let forward: Vec<usize> = (0..n).collect();
    let backward: Vec<usize> = (0..n).rev().collect();
    let still = vec![0; n];
    let spun: Vec<usize> = (0..n).map(|i| i % 3).collect();

    for (order, turns) in [(&forward, &still), (&backward, &still), (&forward, &spun), (&backward, &spun)] {
        let areas = saddle_regions(&reordered(&mesh, order, turns)).expect("rings stay simple");
        assert_eq!(areas.len(), 2);
        assert_relative_eq!(areas[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(areas[1], 1.75, epsilon = 1e-9);
    }
}

fn arb_saddle_order() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    let n = saddle_heightmap().triangles.len();
    (
        Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        prop::collection::vec(0..3usize, n),
    )
}

proptest! {
    #[test]
    fn saddle_cut_ignores_triangle_order((order, turns) in arb_saddle_order()) {
        let mesh = reordered(&saddle_heightmap(), &order, &turns);
        let areas = saddle_regions(&mesh);
        prop_assert!(areas.is_some(), "a ring touches itself");
        let areas = areas.unwrap_or_default();
        prop_assert_eq!(areas.len(), 2);
        prop_assert!((areas[0] - 0.5).abs() < 1e-9);
        prop_assert!((areas[1] - 1.75).abs() < 1e-9);
    }
}
