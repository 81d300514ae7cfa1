use crate::float_types::Real;
use nalgebra::{Point2, Point3};

/// Axis-aligned bounds. The z range is only present for 3D input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: Real,
    pub max_x: Real,
    pub min_y: Real,
    pub max_y: Real,
    pub min_z: Option<Real>,
    pub max_z: Option<Real>,
}

impl BoundingBox {
    /// A 2D box without a z range.
    #[inline]
    pub const fn planar(min_x: Real, min_y: Real, max_x: Real, max_y: Real) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z: None,
            max_z: None,
        }
    }

    /// Bounds of a set of 3D points, or `None` when the iterator is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<Real>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bb = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
            min_z: Some(first.z),
            max_z: Some(first.z),
        };
        for p in iter {
            bb.min_x = bb.min_x.min(p.x);
            bb.max_x = bb.max_x.max(p.x);
            bb.min_y = bb.min_y.min(p.y);
            bb.max_y = bb.max_y.max(p.y);
            bb.min_z = bb.min_z.map(|z| z.min(p.z));
            bb.max_z = bb.max_z.map(|z| z.max(p.z));
        }
        Some(bb)
    }

    /// Bounds of a set of 2D points, or `None` when the iterator is empty.
    pub fn from_points_2d<'a>(points: impl IntoIterator<Item = &'a Point2<Real>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bb = Self::planar(first.x, first.y, first.x, first.y);
        for p in iter {
            bb.include_xy(p.x, p.y);
        }
        Some(bb)
    }

    #[inline]
    fn include_xy(&mut self, x: Real, y: Real) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Smallest box containing both. The z range survives only if both have one.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.include_xy(other.min_x, other.min_y);
        out.include_xy(other.max_x, other.max_y);
        out.min_z = self.min_z.zip(other.min_z).map(|(a, b)| a.min(b));
        out.max_z = self.max_z.zip(other.max_z).map(|(a, b)| a.max(b));
        out
    }

    #[inline]
    pub fn width(&self) -> Real {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> Real {
        self.max_y - self.min_y
    }

    /// The z extent, when known.
    pub fn depth(&self) -> Option<Real> {
        Some(self.max_z? - self.min_z?)
    }

    /// Midpoint. The z coordinate is the z midpoint when both z bounds exist, otherwise 0.
    pub fn center(&self) -> Point3<Real> {
        let cz = match (self.min_z, self.max_z) {
            (Some(lo), Some(hi)) => (lo + hi) * 0.5,
            _ => 0.0,
        };
        Point3::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
            cz,
        )
    }

    /// Whether the xy footprints overlap (touching counts).
    #[inline]
    pub fn intersects_xy(&self, other: &Self) -> bool {
        self.max_x >= other.min_x
            && self.min_x <= other.max_x
            && self.max_y >= other.min_y
            && self.min_y <= other.max_y
    }

    /// Grows a zero-extent axis by `pad` on each side so the box can be used as a divisor.
    pub fn padded_if_degenerate(&self, pad: Real) -> Self {
        let mut out = *self;
        if out.width() <= 0.0 {
            out.min_x -= pad;
            out.max_x += pad;
        }
        if out.height() <= 0.0 {
            out.min_y -= pad;
            out.max_y += pad;
        }
        out
    }
}
