//! Wavefront OBJ with optional per-face elevation materials.

use crate::color::{ColorMapper, ColorScheme, Material};
use crate::errors::SliceResult;
use crate::io::scaling::{MeshTransform, ScaleOptions};
use crate::io::write_file;
use crate::mesh::Mesh;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct ObjOptions {
    /// Colour faces by elevation band and write a companion `.mtl`.
    pub color: Option<ColorScheme>,
    /// Number of elevation bands (materials) when colouring.
    pub material_count: usize,
    pub scale: ScaleOptions,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self {
            color: None,
            material_count: 10,
            scale: ScaleOptions::default(),
        }
    }
}

/// Elevation bands used to colour faces.
pub struct ObjMaterials<'a> {
    pub mapper: &'a ColorMapper,
    pub materials: &'a [Material],
    /// File name written on the `mtllib` line.
    pub library: &'a str,
}

/// Writes OBJ text: a header comment, every vertex (`v x y z`, six decimals)
/// and one `f a b c` line (1-based) per valid triangle.
///
/// With `materials`, faces are grouped by the band of their centroid elevation,
/// lowest band first, each group introduced by `usemtl`. Faces keep storage
/// order within a band. Returns the number of faces written.
pub fn write_obj<W: Write>(
    mesh: &Mesh,
    transform: &MeshTransform,
    materials: Option<&ObjMaterials<'_>>,
    out: &mut W,
) -> std::io::Result<usize> {
    writeln!(out, "# Topographic model")?;
    writeln!(out, "# Vertices: {}", mesh.vertices.len())?;
    writeln!(out, "# Faces: {}", mesh.valid_triangle_count())?;
    if let Some(m) = materials {
        writeln!(out, "mtllib {}", m.library)?;
    }
    writeln!(out)?;

    for v in &mesh.vertices {
        let p = transform.apply(v);
        writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }
    writeln!(out)?;

    let mut written = 0;
    let mut face_line = |out: &mut W, idx: [u32; 3]| -> std::io::Result<()> {
        writeln!(out, "f {} {} {}", idx[0] + 1, idx[1] + 1, idx[2] + 1)?;
        written += 1;
        Ok(())
    };

    match materials {
        None => {
            for tri in mesh.valid_triangles() {
                face_line(out, tri.indices)?;
            }
        },
        Some(m) if !m.materials.is_empty() => {
            let bands = m.materials.len();
            let mut grouped: Vec<Vec<[u32; 3]>> = vec![Vec::new(); bands];
            for tri in mesh.valid_triangles() {
                if let Some([a, b, c]) = mesh.corners(tri) {
                    let z = (a.z + b.z + c.z) / 3.0;
                    grouped[m.mapper.band_index(z, bands)].push(tri.indices);
                }
            }
            for (material, faces) in m.materials.iter().zip(&grouped) {
                if faces.is_empty() {
                    continue;
                }
                writeln!(out, "usemtl {}", material.name)?;
                for &idx in faces {
                    face_line(out, idx)?;
                }
            }
        },
        Some(_) => {
            for tri in mesh.valid_triangles() {
                face_line(out, tri.indices)?;
            }
        },
    }
    Ok(written)
}

/// Writes an MTL material library.
pub fn write_mtl<W: Write>(materials: &[Material], out: &mut W) -> std::io::Result<()> {
    writeln!(out, "# Elevation materials")?;
    for m in materials {
        writeln!(out)?;
        writeln!(out, "newmtl {}", m.name)?;
        writeln!(out, "Ka {:.6} {:.6} {:.6}", m.ambient.r, m.ambient.g, m.ambient.b)?;
        writeln!(out, "Kd {:.6} {:.6} {:.6}", m.diffuse.r, m.diffuse.g, m.diffuse.b)?;
        writeln!(out, "Ks {:.6} {:.6} {:.6}", m.specular.r, m.specular.g, m.specular.b)?;
        writeln!(out, "Ns {:.6}", m.shininess)?;
        writeln!(out, "illum 2")?;
    }
    Ok(())
}

/// Writes `mesh` to `path`, plus a `.mtl` next to it when colouring is on.
/// Returns every file written.
pub fn export_obj(mesh: &Mesh, options: &ObjOptions, path: &Path) -> SliceResult<Vec<PathBuf>> {
    let transform = options.scale.transform_for(mesh);
    let mut files = Vec::with_capacity(2);

    let palette = options.color.as_ref().map(|scheme| {
        let (lo, hi) = mesh
            .bounding_box()
            .and_then(|bb| bb.min_z.zip(bb.max_z))
            .unwrap_or((0.0, 0.0));
        let mapper = ColorMapper::new(scheme, lo, hi);
        let materials = mapper.generate_elevation_materials(options.material_count);
        (mapper, materials)
    });

    let mtl_path = path.with_extension("mtl");
    let library = mtl_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some((_, materials)) = &palette {
        write_file(&mtl_path, |w| write_mtl(materials, w))?;
    }

    let obj_materials = palette.as_ref().map(|(mapper, materials)| ObjMaterials {
        mapper,
        materials,
        library: &library,
    });
    let mut faces = 0;
    write_file(path, |w| {
        faces = write_obj(mesh, &transform, obj_materials.as_ref(), w)?;
        Ok(())
    })?;
    files.push(path.to_path_buf());
    if palette.is_some() {
        files.push(mtl_path);
    }

    tracing::info!(path = %path.display(), faces, colored = palette.is_some(), "wrote OBJ");
    Ok(files)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_obj_lists_vertices_and_one_based_faces() {
        let mut out = Vec::new();
        let n = write_obj(&Mesh::cube(1.0), &MeshTransform::identity(), None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(n, 12);
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 8);
        assert!(text.contains("f 1 3 2"));
        assert!(!text.contains("usemtl"));
    }

    #[test]
    fn coloured_obj_groups_faces_by_band() {
        let mesh = Mesh::cube(1.0);
        let mapper = ColorMapper::new(&ColorScheme::Terrain, 0.0, 1.0);
        let materials = mapper.generate_elevation_materials(2);
        let m = ObjMaterials {
            mapper: &mapper,
            materials: &materials,
            library: "cube.mtl",
        };
        let mut out = Vec::new();
        let n = write_obj(&mesh, &MeshTransform::identity(), Some(&m), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(n, 12);
        assert!(text.contains("mtllib cube.mtl"));
        assert_eq!(text.matches("usemtl elevation_0m").count(), 1);
        assert_eq!(text.matches("usemtl elevation_1m").count(), 1);

        let mut mtl = Vec::new();
        write_mtl(&materials, &mut mtl).unwrap();
        let mtl = String::from_utf8(mtl).unwrap();
        assert_eq!(mtl.matches("newmtl").count(), 2);
        assert!(mtl.contains("Ns 10.000000"));
    }
}
