//! Stanford PLY, ASCII or little-endian binary, with optional vertex colours.

use crate::color::{ColorMapper, ColorScheme};
use crate::errors::SliceResult;
use crate::io::scaling::{MeshTransform, ScaleOptions};
use crate::io::write_file;
use crate::mesh::Mesh;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlyOptions {
    pub binary: bool,
    /// Colour vertices by their elevation.
    pub color: Option<ColorScheme>,
    pub scale: ScaleOptions,
}

fn write_header<W: Write>(
    out: &mut W,
    binary: bool,
    vertices: usize,
    faces: usize,
    colored: bool,
) -> std::io::Result<()> {
    writeln!(out, "ply")?;
    if binary {
        writeln!(out, "format binary_little_endian 1.0")?;
    } else {
        writeln!(out, "format ascii 1.0")?;
    }
    writeln!(out, "comment Topographic model")?;
    writeln!(out, "element vertex {vertices}")?;
    writeln!(out, "property float x")?;
    writeln!(out, "property float y")?;
    writeln!(out, "property float z")?;
    if colored {
        writeln!(out, "property uchar red")?;
        writeln!(out, "property uchar green")?;
        writeln!(out, "property uchar blue")?;
    }
    writeln!(out, "element face {faces}")?;
    writeln!(out, "property list uchar int vertex_indices")?;
    writeln!(out, "end_header")
}

/// Binary faces store indices as `int`.
fn ply_index(i: u32) -> std::io::Result<i32> {
    i32::try_from(i).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("vertex index {i} does not fit a PLY int"),
        )
    })
}

/// Writes a PLY body for `mesh`.
///
/// Every vertex is written; faces are limited to valid triangles. Colours are
/// sampled at each vertex's untransformed elevation. Returns the face count
/// declared in the header.
pub fn write_ply<W: Write>(
    mesh: &Mesh,
    transform: &MeshTransform,
    colors: Option<&ColorMapper>,
    binary: bool,
    out: &mut W,
) -> std::io::Result<usize> {
    let faces = mesh.valid_triangle_count();
    write_header(out, binary, mesh.vertices.len(), faces, colors.is_some())?;

    for v in &mesh.vertices {
        let p = transform.apply(v);
        let rgb = colors.map(|m| m.color_at(v.z).to_u8());
        if binary {
            for c in [p.x, p.y, p.z] {
                out.write_all(&(c as f32).to_le_bytes())?;
            }
            if let Some(rgb) = rgb {
                out.write_all(&rgb)?;
            }
        } else {
            write!(out, "{:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
            if let Some([r, g, b]) = rgb {
                write!(out, " {r} {g} {b}")?;
            }
            writeln!(out)?;
        }
    }

    for tri in mesh.valid_triangles() {
        let [a, b, c] = tri.indices;
        if binary {
            out.write_all(&[3u8])?;
            for i in [a, b, c] {
                out.write_all(&ply_index(i)?.to_le_bytes())?;
            }
        } else {
            writeln!(out, "3 {a} {b} {c}")?;
        }
    }
    Ok(faces)
}

pub fn export_ply(mesh: &Mesh, options: &PlyOptions, path: &Path) -> SliceResult<()> {
    let transform = options.scale.transform_for(mesh);
    let mapper = options.color.as_ref().map(|scheme| {
        let (lo, hi) = mesh
            .bounding_box()
            .and_then(|bb| bb.min_z.zip(bb.max_z))
            .unwrap_or((0.0, 0.0));
        ColorMapper::new(scheme, lo, hi)
    });

    let mut faces = 0;
    write_file(path, |w| {
        faces = write_ply(mesh, &transform, mapper.as_ref(), options.binary, w)?;
        Ok(())
    })?;
    tracing::info!(path = %path.display(), faces, binary = options.binary, "wrote PLY");
    Ok(())
}
