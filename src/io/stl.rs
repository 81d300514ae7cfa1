use crate::errors::SliceResult;
use crate::io::scaling::{MeshTransform, ScaleOptions};
use crate::io::write_file;
use crate::mesh::Mesh;
use std::io::Write;
use std::path::Path;

/// Text placed at the start of the 80-byte binary header, zero padded.
pub const BINARY_HEADER_TEXT: &str = "Binary STL - Topographic Generator";
/// Solid name used when none is configured.
pub const DEFAULT_SOLID_NAME: &str = "topographic_model";
/// Header plus triangle count.
pub const BINARY_PREAMBLE_LEN: usize = 84;
/// Normal, three vertices and the attribute word.
pub const BINARY_RECORD_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct StlOptions {
    /// Binary output needs the `stl-io` feature and is the default when it is enabled.
    pub binary: bool,
    /// Name on the `solid`/`endsolid` lines of ASCII output. Empty means [`DEFAULT_SOLID_NAME`].
    pub solid_name: String,
    pub scale: ScaleOptions,
}

impl Default for StlOptions {
    fn default() -> Self {
        Self {
            binary: cfg!(feature = "stl-io"),
            solid_name: DEFAULT_SOLID_NAME.to_string(),
            scale: ScaleOptions::default(),
        }
    }
}

impl StlOptions {
    pub fn solid_name(&self) -> &str {
        if self.solid_name.is_empty() {
            DEFAULT_SOLID_NAME
        } else {
            &self.solid_name
        }
    }
}

/// Writes **binary STL**: 80-byte header, little-endian `u32` triangle count,
/// then a 50-byte record per valid triangle.
///
/// Every record carries the placeholder normal `(0, 0, 1)`; readers recompute
/// normals from the vertex winding. The records are encoded by `stl_io`, and the
/// header then gets [`BINARY_HEADER_TEXT`]. Returns the number of triangles
/// written, which always equals the count in the header.
#[cfg(feature = "stl-io")]
pub fn write_stl_binary<W: Write>(mesh: &Mesh, transform: &MeshTransform, out: &mut W) -> std::io::Result<u32> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    let mut triangles = Vec::<Triangle>::with_capacity(mesh.valid_triangle_count());
    for face in mesh.valid_faces() {
        #[allow(clippy::unnecessary_cast)]
        {
            triangles.push(Triangle {
                normal: Normal::new([0.0, 0.0, 1.0]),
                vertices: face.map(|v| {
                    let p = transform.apply(&v);
                    Vertex::new([p.x as f32, p.y as f32, p.z as f32])
                }),
            });
        }
    }

    let mut bytes = Vec::with_capacity(BINARY_PREAMBLE_LEN + BINARY_RECORD_LEN * triangles.len());
    write_stl(&mut bytes, triangles.iter())?;

    let text = BINARY_HEADER_TEXT.as_bytes();
    let len = text.len().min(79);
    bytes[..len].copy_from_slice(&text[..len]);
    out.write_all(&bytes)?;

    u32::try_from(triangles.len())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "too many triangles for binary STL"))
}

/// Writes **ASCII STL** with six decimal places.
///
/// Facet normals come from the untransformed edges and are normalized when
/// their length exceeds 1e-12. Returns the number of facets written.
pub fn write_stl_ascii<W: Write>(
    mesh: &Mesh,
    transform: &MeshTransform,
    name: &str,
    out: &mut W,
) -> std::io::Result<usize> {
    writeln!(out, "solid {name}")?;
    let mut written = 0;
    for face in mesh.valid_faces() {
        let [a, b, c] = face;
        let n = Mesh::face_normal(&a, &b, &c).unwrap_or_else(|| (b - a).cross(&(c - a)));
        writeln!(out, "  facet normal {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
        writeln!(out, "    outer loop")?;
        for v in face.map(|v| transform.apply(&v)) {
            writeln!(out, "      vertex {:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
        written += 1;
    }
    writeln!(out, "endsolid {name}")?;
    Ok(written)
}

/// Writes `mesh` to `path` as configured by `options`.
pub fn export_stl(mesh: &Mesh, options: &StlOptions, path: &Path) -> SliceResult<()> {
    let transform = options.scale.transform_for(mesh);
    let mut count = 0;
    if options.binary {
        #[cfg(feature = "stl-io")]
        write_file(path, |w| {
            count = write_stl_binary(mesh, &transform, w)? as usize;
            Ok(())
        })?;
        #[cfg(not(feature = "stl-io"))]
        return Err(crate::errors::SliceError::Unsupported {
            format: "binary stl".to_string(),
        });
    } else {
        write_file(path, |w| {
            count = write_stl_ascii(mesh, &transform, options.solid_name(), w)?;
            Ok(())
        })?;
    }
    tracing::info!(
        path = %path.display(),
        triangles = count,
        binary = options.binary,
        scale = transform.scale,
        "wrote STL"
    );
    Ok(())
}

impl Mesh {
    /// Convert this mesh to an **ASCII STL** string with the given `name`, without scaling.
    pub fn to_stl_ascii(&self, name: &str) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = write_stl_ascii(self, &MeshTransform::identity(), name, &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

}

#[cfg(feature = "stl-io")]
impl Mesh {
    /// Convert this mesh to a **binary STL** byte vector, without scaling.
    pub fn to_stl_binary(&self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(BINARY_PREAMBLE_LEN + BINARY_RECORD_LEN * self.triangles.len());
        write_stl_binary(self, &MeshTransform::identity(), &mut out)?;
        Ok(out)
    }

    /// Reads an ASCII or binary STL. Identical vertex positions are welded.
    pub fn from_stl(data: &[u8]) -> SliceResult<Mesh> {
        use crate::errors::SliceError;
        use crate::float_types::Real;
        use crate::mesh::Triangle;
        use crate::mesh::manifold::quantize_point;
        use nalgebra::Point3;

        #[cfg(feature = "hashmap")]
        use hashbrown::HashMap;
        #[cfg(not(feature = "hashmap"))]
        use std::collections::HashMap;

        let mut cursor = std::io::Cursor::new(data);
        let stl = stl_io::read_stl(&mut cursor).map_err(SliceError::StlRead)?;

        let mut mesh = Mesh::default();
        let mut remap = Vec::with_capacity(stl.vertices.len());
        let mut welded = HashMap::new();
        for v in &stl.vertices {
            let p = Point3::new(v.0[0] as Real, v.0[1] as Real, v.0[2] as Real);
            let id = *welded.entry(quantize_point(&p)).or_insert_with(|| {
                mesh.vertices.push(p);
                (mesh.vertices.len() - 1) as u32
            });
            remap.push(id);
        }

        for face in &stl.faces {
            let [a, b, c] = face.vertices.map(|i| remap.get(i).copied().unwrap_or(Triangle::INVALID));
            if a != b && b != c && a != c {
                mesh.triangles.push(Triangle::new(a, b, c));
            }
        }
        tracing::debug!(
            vertices = mesh.vertices.len(),
            triangles = mesh.triangles.len(),
            "read STL"
        );
        Ok(mesh)
    }
}
