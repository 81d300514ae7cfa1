//! Scale-to-bed and centering shared by the 3D exporters.

use crate::float_types::Real;
use crate::mesh::{BoundingBox, Mesh};
use nalgebra::Point3;

/// Fraction of the bed the larger planar extent is scaled to fill.
pub const BED_FILL: Real = 0.9;

/// Uniform scale factor that makes the larger of the xy extents fill
/// [`BED_FILL`] of `target_bed_mm`.
///
/// Returns exactly `1.0` when there is no box or its xy extent is not positive.
pub fn auto_scale_factor(bbox: Option<&BoundingBox>, target_bed_mm: Real) -> Real {
    let Some(bb) = bbox else {
        return 1.0;
    };
    let max_range = bb.width().max(bb.height());
    if !(max_range > 0.0) {
        tracing::warn!("degenerate mesh extent, using scale factor 1.0");
        return 1.0;
    }
    target_bed_mm * BED_FILL / max_range
}

/// How a 3D export is sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOptions {
    /// Fit the larger xy extent to [`BED_FILL`] of `target_bed_mm`.
    pub auto_scale: bool,
    pub target_bed_mm: Real,
    /// Used instead of auto-scaling when `auto_scale` is off.
    pub scale_factor: Real,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            auto_scale: true,
            target_bed_mm: 200.0,
            scale_factor: 1.0,
        }
    }
}

impl ScaleOptions {
    /// Centred on the bounding box but not resized.
    pub fn unscaled() -> Self {
        Self {
            auto_scale: false,
            scale_factor: 1.0,
            ..Self::default()
        }
    }

    pub fn transform_for(&self, mesh: &Mesh) -> MeshTransform {
        MeshTransform::for_mesh(mesh, self.auto_scale, self.target_bed_mm, self.scale_factor)
    }
}

/// Centre-then-scale transform. The same factor applies to x, y and z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshTransform {
    pub scale: Real,
    pub center: Point3<Real>,
}

impl Default for MeshTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl MeshTransform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            center: Point3::origin(),
        }
    }

    /// Transform for `mesh`: centred on its bounding box, scaled either to fit
    /// `target_bed_mm` (`auto_scale`) or by `manual_scale`.
    pub fn for_mesh(mesh: &Mesh, auto_scale: bool, target_bed_mm: Real, manual_scale: Real) -> Self {
        let bbox = mesh.bounding_box();
        let scale = if auto_scale {
            auto_scale_factor(bbox.as_ref(), target_bed_mm)
        } else {
            manual_scale
        };
        Self {
            scale,
            center: bbox.map_or_else(Point3::origin, |bb| bb.center()),
        }
    }

    #[inline]
    pub fn apply(&self, p: &Point3<Real>) -> Point3<Real> {
        Point3::from((p - self.center) * self.scale)
    }

    /// A transformed copy of `mesh`. Triangles are copied unchanged.
    pub fn apply_mesh(&self, mesh: &Mesh) -> Mesh {
        Mesh::new(
            mesh.vertices.iter().map(|v| self.apply(v)).collect(),
            mesh.triangles.clone(),
        )
    }
}
