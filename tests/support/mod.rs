//! Test support library
//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use nalgebra::Point2;
use topo_slicer::{
    Contour, ContourPolygon, GenerationControl, GenerationOptions, Layer, Mesh, Real,
    contour::{AssemblyOptions, ProcessingOptions},
    generate_layers,
};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Options that keep assembled loops exactly as cut.
pub fn exact_options() -> GenerationOptions {
    GenerationOptions {
        assembly: AssemblyOptions::default(),
        processing: ProcessingOptions::passthrough(),
        ..GenerationOptions::default()
    }
}

/// Slices `mesh` at `elevations` with [`exact_options`] and no cancellation.
pub fn slice_exact(mesh: &Mesh, elevations: &[Real]) -> Vec<Layer> {
    generate_layers(mesh, elevations, &exact_options(), &GenerationControl::default())
        .expect("generation without cancellation succeeds")
}

pub fn ring(points: &[(Real, Real)]) -> Contour {
    Contour::new(points.iter().map(|&(x, y)| Point2::new(x, y)).collect())
}

/// Axis-aligned square with its lower-left corner at `(x0, y0)`, counter-clockwise.
pub fn square(x0: Real, y0: Real, side: Real) -> Contour {
    ring(&[
        (x0, y0),
        (x0 + side, y0),
        (x0 + side, y0 + side),
        (x0, y0 + side),
    ])
}

/// A square plate with a square hole in the middle.
pub fn framed_square(side: Real, hole: Real) -> ContourPolygon {
    let inset = (side - hole) / 2.0;
    ContourPolygon::new(
        square(0.0, 0.0, side),
        vec![square(inset, inset, hole).reversed()],
    )
}

/// Regular polygon approximating a circle, counter-clockwise.
pub fn circle_points(radius: Real, segments: usize) -> Vec<Point2<Real>> {
    (0..segments)
        .map(|i| {
            let t = topo_slicer::float_types::TAU * i as Real / segments as Real;
            Point2::new(radius * t.cos(), radius * t.sin())
        })
        .collect()
}

/// A 4x4 heightmap with a single raised centre block.
pub fn plateau_heightmap() -> Mesh {
    #[rustfmt::skip]
    let heights = [
        0.0, 0.0, 0.0, 0.0,
        0.0, 5.0, 5.0, 0.0,
        0.0, 5.0, 5.0, 0.0,
        0.0, 0.0, 0.0, 0.0,
    ];
    Mesh::from_heightmap(&heights, 4, 4, 10.0, -10.0).expect("valid heightmap")
}

/// A 3x3 heightmap whose centre sample sits exactly at 5.0 between a high
/// corner block and a high opposite corner. Cut at 5.0 it gives two regions
/// touching at a single point, (1, 1).
pub fn saddle_heightmap() -> Mesh {
    #[rustfmt::skip]
    let heights = [
        10.0, 10.0, 0.0,
        10.0, 5.0, 0.0,
        0.0, 0.0, 10.0,
    ];
    Mesh::from_heightmap(&heights, 3, 3, 1.0, -10.0).expect("valid heightmap")
}
