//! Layers and the elevations they are cut at.

use crate::contour::{ContourPolygon, polygons_bounding_box};
use crate::float_types::Real;
use crate::mesh::BoundingBox;

/// One horizontal slice with its processed contours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    /// Position in the requested elevation list.
    pub index: usize,
    /// Elevation the plane was placed at.
    pub elevation: Real,
    /// Processed polygons; empty when the plane misses the mesh.
    pub polygons: Vec<ContourPolygon>,
    /// Open chains dropped while assembling this layer.
    pub discarded_chains: usize,
}

impl Layer {
    pub const fn new(index: usize, elevation: Real, polygons: Vec<ContourPolygon>) -> Self {
        Self {
            index,
            elevation,
            polygons,
            discarded_chains: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn contour_count(&self) -> usize {
        self.polygons.iter().map(|p| 1 + p.holes.len()).sum()
    }

    pub fn area(&self) -> Real {
        self.polygons.iter().map(ContourPolygon::area).sum()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        polygons_bounding_box(&self.polygons)
    }
}

/// Shared bounds of every layer, so all sheets register against each other.
pub fn layers_bounding_box(layers: &[Layer]) -> Option<BoundingBox> {
    layers
        .iter()
        .filter_map(Layer::bounding_box)
        .reduce(|a, b| a.union(&b))
}

/// How elevations are spread across the range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelStrategy {
    #[default]
    Uniform,
    /// Evenly spaced in `ln(elevation)`, denser near the bottom.
    Logarithmic,
    /// Eased with `(e^{2t} - 1) / (e^2 - 1)`, denser near the bottom.
    Exponential,
}

/// Inputs for [`contour_levels`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelOptions {
    pub strategy: LevelStrategy,
    /// Raise the lower bound of the range.
    pub min_elevation: Option<Real>,
    /// Lower the upper bound of the range.
    pub max_elevation: Option<Real>,
    /// Positive: keep up to `min + threshold`. Negative: keep down to `max + threshold`. Zero: off.
    pub elevation_threshold: Real,
    /// Spacing used when no layer count is given.
    pub interval: Real,
    /// Elevation always cut, e.g. a water line.
    pub fixed_elevation: Option<Real>,
}

impl Default for LevelOptions {
    fn default() -> Self {
        Self {
            strategy: LevelStrategy::Uniform,
            min_elevation: None,
            max_elevation: None,
            elevation_threshold: 0.0,
            interval: 100.0,
            fixed_elevation: None,
        }
    }
}

/// Upper bound on the intervals [`contour_levels`] will split a range into.
pub const MAX_LEVEL_INTERVALS: usize = 10_000;

/// Elevations to slice at, in ascending order.
///
/// `layers` intervals produce `layers + 1` levels from the bottom to the top of the
/// (possibly clamped) range. With `layers == 0` the count is derived from
/// `options.interval`. An empty or inverted range falls back to ±50 around its midpoint.
/// Either way the count is capped at [`MAX_LEVEL_INTERVALS`].
pub fn contour_levels(min: Real, max: Real, layers: usize, options: &LevelOptions) -> Vec<Real> {
    let mut lo = min;
    let mut hi = max;
    if let Some(m) = options.min_elevation {
        lo = lo.max(m);
    }
    if let Some(m) = options.max_elevation {
        hi = hi.min(m);
    }
    if options.elevation_threshold > 0.0 {
        hi = hi.min(min + options.elevation_threshold);
    } else if options.elevation_threshold < 0.0 {
        lo = lo.max(max + options.elevation_threshold);
    }

    if !(lo < hi) {
        tracing::warn!(lo, hi, "invalid elevation range after filtering, using midpoint fallback");
        let mid = (min + max) * 0.5;
        lo = mid - 50.0;
        hi = mid + 50.0;
    }

    let requested = if layers > 0 {
        layers
    } else if options.interval > 0.0 {
        ((hi - lo) / options.interval).ceil().max(1.0) as usize
    } else {
        1
    };
    let count = requested.min(MAX_LEVEL_INTERVALS);
    if count < requested {
        tracing::warn!(requested, count, "too many contour levels requested, capping");
    }

    let mut levels: Vec<Real> = match options.strategy {
        LevelStrategy::Uniform => {
            let step = (hi - lo) / count as Real;
            (0..=count).map(|i| lo + i as Real * step).collect()
        },
        LevelStrategy::Logarithmic => {
            let log_min = lo.max(1.0).ln();
            let log_max = hi.max(lo + 1.0).ln();
            let step = (log_max - log_min) / count as Real;
            (0..=count).map(|i| (log_min + i as Real * step).exp()).collect()
        },
        LevelStrategy::Exponential => {
            let range = hi - lo;
            let denom = (2.0 as Real).exp() - 1.0;
            (0..=count)
                .map(|i| {
                    let t = i as Real / count as Real;
                    lo + ((t * 2.0).exp() - 1.0) / denom * range
                })
                .collect()
        },
    };

    if let Some(fixed) = options.fixed_elevation {
        if !levels.iter().any(|l| (l - fixed).abs() < 1e-6) {
            levels.push(fixed);
            levels.sort_by(|a, b| a.total_cmp(b));
        }
    }

    tracing::info!(
        count = levels.len(),
        first = ?levels.first(),
        last = ?levels.last(),
        "generated contour levels"
    );
    levels
}
