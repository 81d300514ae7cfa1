mod support;

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use std::path::Path;
use topo_slicer::{
    ColorScheme, FormatResult, GlobalOptions, Mesh, MultiFormatExporter, Real, SliceError, Triangle,
    io::{ScaleOptions, auto_scale_factor},
};

fn exporter_in(dir: &Path) -> MultiFormatExporter {
    MultiFormatExporter::new(GlobalOptions {
        output_directory: dir.to_path_buf(),
        base_filename: "model".into(),
        filename_pattern: None,
    })
}

#[cfg(not(feature = "stl-io"))]
#[test]
fn binary_stl_without_the_feature_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = exporter_in(dir.path());
    exporter.stl.binary = true;
    let report = exporter.export_all(&Mesh::cube(1.0), None, &["stl"]);
    assert!(matches!(report.get("stl"), Some(FormatResult::Failed(SliceError::Unsupported { .. }))));
    assert!(!dir.path().join("model.stl").exists());
}

#[test]
fn ascii_stl_uses_true_normals_and_six_decimals() {
    let text = Mesh::cube(1.0).to_stl_ascii("block");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("solid block"));
    assert_eq!(lines.next(), Some("  facet normal 0.000000 0.000000 -1.000000"));
    assert_eq!(lines.next(), Some("    outer loop"));
    assert_eq!(lines.next(), Some("      vertex 0.000000 0.000000 0.000000"));
    assert!(text.ends_with("endsolid block\n"));
    assert_eq!(text.matches("facet normal").count(), 12);
}

#[test]
fn ascii_stl_through_exporter_is_centred_and_scaled() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = exporter_in(dir.path());
    exporter.stl.binary = false;
    exporter.stl.solid_name = String::new();
    let report = exporter.export_all(&Mesh::cube(10.0), None, &["stl"]);
    assert!(report.success());

    let text = std::fs::read_to_string(dir.path().join("model.stl")).unwrap();
    assert!(text.starts_with("solid topographic_model\n"));
    // 200 mm bed at 90 % fill: a 10 unit cube spans -90..90
    assert!(text.contains("vertex -90.000000 -90.000000 -90.000000"));
    assert!(text.contains("vertex 90.000000 90.000000 90.000000"));
}

#[cfg(all(feature = "svg-io", feature = "stl-io"))]
#[test]
fn mesh_only_call_skips_svg_but_writes_stl() {
    let dir = tempfile::tempdir().unwrap();
    let report = exporter_in(dir.path()).export_all(&Mesh::cube(1.0), None, &["svg", "stl"]);
    assert!(report.success());
    assert!(matches!(report.get("svg"), Some(FormatResult::Skipped(_))));
    assert!(matches!(report.get("stl"), Some(FormatResult::Written(paths)) if paths.len() == 1));
    assert_eq!(report.files(), vec![dir.path().join("model.stl").as_path()]);
    assert!(dir.path().join("model.stl").exists());
}

#[test]
fn filename_pattern_names_the_stl() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = exporter_in(dir.path());
    exporter.stl.binary = false;
    exporter.global.filename_pattern = Some("%{b}_stack_%{l}".into());
    let report = exporter.export_all(&Mesh::cube(1.0), None, &["stl", "ply"]);
    assert!(report.success());
    assert!(dir.path().join("model_stack_00.stl").exists());
    assert!(dir.path().join("model.ply").exists());
}

#[test]
fn coloured_obj_writes_material_library() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = exporter_in(dir.path());
    exporter.obj.color = Some(ColorScheme::Terrain);
    exporter.obj.material_count = 4;
    let report = exporter.export_all(&support::plateau_heightmap(), None, &["obj"]);
    assert!(report.success());
    assert_eq!(report.files().len(), 2);

    let obj = std::fs::read_to_string(dir.path().join("model.obj")).unwrap();
    let mtl = std::fs::read_to_string(dir.path().join("model.mtl")).unwrap();
    assert!(obj.contains("mtllib model.mtl"));
    assert_eq!(mtl.matches("newmtl ").count(), 4);
    for line in obj.lines().filter(|l| l.starts_with("usemtl ")) {
        let name = line.trim_start_matches("usemtl ");
        assert!(mtl.contains(&format!("newmtl {name}")));
    }
    let faces = obj.lines().filter(|l| l.starts_with("f ")).count();
    assert_eq!(faces, support::plateau_heightmap().valid_triangle_count());
}

#[test]
fn plain_ply_has_matching_counts() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = exporter_in(dir.path());
    exporter.ply.color = Some(ColorScheme::Grayscale);
    let mesh = Mesh::cone(1.0, 1.0, 8);
    let report = exporter.export_all(&mesh, None, &["ply"]);
    assert!(report.success());

    let text = std::fs::read_to_string(dir.path().join("model.ply")).unwrap();
    assert!(text.contains(&format!("element vertex {}\n", mesh.vertices.len())));
    assert!(text.contains(&format!("element face {}\n", mesh.valid_triangle_count())));
    assert!(text.contains("property uchar red\n"));
    let body = text.split("end_header\n").nth(1).unwrap();
    assert_eq!(body.lines().count(), mesh.vertices.len() + mesh.valid_triangle_count());
}

#[test]
fn unusable_output_directory_fails_every_format() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();

    let exporter = exporter_in(&blocker.join("out"));
    let report = exporter.export_all(&Mesh::cube(1.0), None, &["stl", "obj"]);
    assert!(!report.success());
    for (_, result) in &report.results {
        assert!(matches!(result, FormatResult::Failed(SliceError::Io { .. })));
    }
}

#[test]
fn degenerate_extent_scales_by_one() {
    let flat = Mesh::new(
        vec![Point3::new(3.0, 3.0, 0.0), Point3::new(3.0, 3.0, 1.0), Point3::new(3.0, 3.0, 2.0)],
        vec![Triangle::new(0, 1, 2)],
    );
    assert_eq!(auto_scale_factor(flat.bounding_box().as_ref(), 200.0), 1.0);
    assert_eq!(auto_scale_factor(None, 200.0), 1.0);
}

fn arb_mesh() -> impl Strategy<Value = Mesh> {
    (
        prop::collection::vec(prop::array::uniform3(-50.0..50.0f64), 3..24),
        -1000.0..1000.0f64,
    )
        .prop_map(|(coords, shift)| {
            let vertices: Vec<_> = coords
                .into_iter()
                .map(|[x, y, z]| Point3::new(x as Real, y as Real, (z + shift) as Real))
                .collect();
            let n = vertices.len() as u32;
            let triangles = (0..n - 2).map(|i| Triangle::new(i, i + 1, i + 2)).collect();
            Mesh::new(vertices, triangles)
        })
}

proptest! {
    #[test]
    fn auto_scaled_output_ignores_input_scale(mesh in arb_mesh(), k in 0.01..100.0f64) {
        let k = k as Real;
        let scaled = Mesh::new(mesh.vertices.iter().map(|v| Point3::from(v.coords * k)).collect(), mesh.triangles.clone());
        let options = ScaleOptions::default();
        let a = options.transform_for(&mesh).apply_mesh(&mesh);
        let b = options.transform_for(&scaled).apply_mesh(&scaled);
        for (p, q) in a.vertices.iter().zip(&b.vertices) {
            prop_assert!((p - q).norm() < 1e-6);
        }
    }

    #[test]
    fn centring_is_idempotent(mesh in arb_mesh(), offset in prop::array::uniform3(-10.0..10.0f64)) {
        let moved = mesh.translated(Vector3::new(offset[0] as Real, offset[1] as Real, offset[2] as Real));
        let once = ScaleOptions::unscaled().transform_for(&moved).apply_mesh(&moved);
        let twice = ScaleOptions::unscaled().transform_for(&once).apply_mesh(&once);
        for (p, q) in once.vertices.iter().zip(&twice.vertices) {
            prop_assert!((p - q).norm() < 1e-9);
        }
        let center = once.bounding_box().unwrap().center();
        prop_assert!(center.coords.norm() < 1e-9);
    }

    #[test]
    fn auto_scale_fills_ninety_percent_of_the_bed(mesh in arb_mesh()) {
        let bb = mesh.bounding_box().unwrap();
        prop_assume!(bb.width().max(bb.height()) > 1e-3);
        let out = ScaleOptions::default().transform_for(&mesh).apply_mesh(&mesh);
        let obb = out.bounding_box().unwrap();
        assert_relative_eq!(obb.width().max(obb.height()), 180.0, epsilon = 1e-6);
    }
}
