//! Contour cleanup: simplification, smoothing, small-feature filtering and hole policy.
//!
//! Every operation reads its input and returns new data, so the same assembled
//! contours can be reprocessed with different settings without re-slicing.

use crate::contour::{Contour, ContourPolygon, Orientation};
use crate::float_types::Real;
use nalgebra::Point2;
use std::borrow::Cow;

/// How the minimum feature width of a contour is estimated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WidthEstimate {
    /// Minor side of the axis-aligned bounding box.
    #[default]
    BoundingBox,
    /// `2 * area / perimeter`, which tracks the width of long thin shapes
    /// regardless of their rotation.
    AreaPerimeter,
}

/// Cleanup settings for one generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingOptions {
    /// Douglas–Peucker tolerance in world units. `0` disables simplification.
    pub simplify_tolerance: Real,
    /// Chaikin corner-cutting passes. `0` disables smoothing.
    pub smoothing_iterations: u32,
    /// Contours enclosing less than this (world units squared) are dropped.
    pub min_area: Real,
    /// Contours narrower than this, in millimetres on the output, are dropped.
    pub min_feature_width_mm: Real,
    /// Output millimetres per world unit, used by the width filter.
    pub mm_per_unit: Real,
    pub width_estimate: WidthEstimate,
    /// Keep only outer boundaries.
    pub remove_holes: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            simplify_tolerance: 5.0,
            smoothing_iterations: 1,
            min_area: 0.0,
            min_feature_width_mm: 0.0,
            mm_per_unit: 1.0,
            width_estimate: WidthEstimate::BoundingBox,
            remove_holes: true,
        }
    }
}

impl ProcessingOptions {
    /// Options that leave assembled contours untouched.
    pub fn passthrough() -> Self {
        Self {
            simplify_tolerance: 0.0,
            smoothing_iterations: 0,
            remove_holes: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContourProcessor {
    options: ProcessingOptions,
}

impl ContourProcessor {
    pub const fn new(options: ProcessingOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Applies the full cleanup to every polygon and returns the survivors in input order.
    pub fn process(&self, polygons: &[ContourPolygon]) -> Vec<ContourPolygon> {
        let out: Vec<ContourPolygon> = polygons
            .iter()
            .filter_map(|p| self.process_polygon(p))
            .collect();
        tracing::debug!(
            input = polygons.len(),
            output = out.len(),
            "processed contour polygons"
        );
        out
    }

    /// Cleans one polygon. `None` when its outer boundary does not survive the filters.
    pub fn process_polygon(&self, polygon: &ContourPolygon) -> Option<ContourPolygon> {
        let outer = self.clean_ring(&polygon.outer, Orientation::CounterClockwise)?;
        let holes = if self.options.remove_holes {
            Vec::new()
        } else {
            polygon
                .holes
                .iter()
                .filter_map(|h| self.clean_ring(h, Orientation::Clockwise))
                .collect()
        };
        Some(ContourPolygon::new(outer, holes))
    }

    /// Simplify, then smooth, then filter. Filtering last lets smoothing merge
    /// features that would otherwise fall under the thresholds.
    fn clean_ring(&self, ring: &Contour, orientation: Orientation) -> Option<Contour> {
        let simplified = simplify(ring.points(), self.options.simplify_tolerance);
        let smoothed = smooth(&simplified, self.options.smoothing_iterations);
        let contour = Contour::new(smoothed.into_owned());
        if contour.len() < 3 || !self.passes_filters(&contour) {
            return None;
        }
        Some(contour.with_orientation(orientation))
    }

    /// Whether `contour` meets the minimum area and width thresholds.
    pub fn passes_filters(&self, contour: &Contour) -> bool {
        if self.options.min_area > 0.0 && contour.area() < self.options.min_area {
            return false;
        }
        if self.options.min_feature_width_mm > 0.0
            && self.feature_width_mm(contour) < self.options.min_feature_width_mm
        {
            return false;
        }
        true
    }

    /// Estimated minimum width of `contour` in output millimetres.
    pub fn feature_width_mm(&self, contour: &Contour) -> Real {
        let width = match self.options.width_estimate {
            WidthEstimate::BoundingBox => contour
                .bounding_box()
                .map_or(0.0, |bb| bb.width().min(bb.height())),
            WidthEstimate::AreaPerimeter => {
                let perimeter = contour.perimeter();
                if perimeter > 0.0 {
                    2.0 * contour.area() / perimeter
                } else {
                    0.0
                }
            },
        };
        width * self.options.mm_per_unit
    }
}

fn perpendicular_distance(p: &Point2<Real>, a: &Point2<Real>, b: &Point2<Real>) -> Real {
    let ab = b - a;
    let len = ab.norm();
    if len <= Real::EPSILON {
        return (p - a).norm();
    }
    let ap = p - a;
    (ab.x * ap.y - ab.y * ap.x).abs() / len
}

/// Douglas–Peucker reduction of a closed ring.
///
/// The ring is split at its first point and the point farthest from it; both
/// are always kept. A point survives only if it lies more than `tolerance`
/// from the chord between its retained neighbours, so the result deviates from
/// the input by at most `tolerance` and never gains points as `tolerance` grows.
/// Rings of three points or fewer, and non-positive tolerances, are returned as is.
pub fn simplify(points: &[Point2<Real>], tolerance: Real) -> Vec<Point2<Real>> {
    let n = points.len();
    if n <= 3 || !(tolerance > 0.0) {
        return points.to_vec();
    }

    let origin = points[0];
    let (far, _) = points
        .iter()
        .enumerate()
        .skip(1)
        .fold((0, -1.0), |best, (i, p)| {
            let d = (p - origin).norm();
            if d > best.1 { (i, d) } else { best }
        });

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[far] = true;

    // Index `n` stands for the first point again, closing the ring.
    let mut stack = vec![(0usize, far), (far, n)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let a = points[start];
        let b = points[end % n];
        let (split, dmax) = ((start + 1)..end).fold((start, -1.0), |best, i| {
            let d = perpendicular_distance(&points[i], &a, &b);
            if d > best.1 { (i, d) } else { best }
        });
        if dmax > tolerance {
            keep[split] = true;
            stack.push((start, split));
            stack.push((split, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Chaikin corner cutting on a closed ring.
///
/// Each pass replaces every edge `(p, q)` with the points at 1/4 and 3/4 along it.
/// Zero iterations borrow the input unchanged.
pub fn smooth(points: &[Point2<Real>], iterations: u32) -> Cow<'_, [Point2<Real>]> {
    if iterations == 0 || points.len() < 3 {
        return Cow::Borrowed(points);
    }
    let mut current = points.to_vec();
    for _ in 0..iterations {
        let n = current.len();
        let mut next = Vec::with_capacity(n * 2);
        for i in 0..n {
            let p = current[i];
            let q = current[(i + 1) % n];
            next.push(p + (q - p) * 0.25);
            next.push(p + (q - p) * 0.75);
        }
        current = next;
    }
    Cow::Owned(current)
}

#[cfg(test)]
mod test {
    use super::*;

    fn wobbly_circle(n: usize) -> Vec<Point2<Real>> {
        (0..n)
            .map(|i| {
                let t = crate::float_types::TAU * i as Real / n as Real;
                let r = 10.0 + if i % 2 == 0 { 0.3 } else { -0.3 };
                Point2::new(r * t.cos(), r * t.sin())
            })
            .collect()
    }

    #[test]
    fn simplify_keeps_anchors_and_drops_noise() {
        let pts = wobbly_circle(64);
        let out = simplify(&pts, 1.0);
        assert!(out.len() < pts.len());
        assert!(out.len() >= 2);
        assert_eq!(out[0], pts[0]);
    }

    #[test]
    fn simplify_passes_small_rings_through() {
        let tri = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        assert_eq!(simplify(&tri, 100.0), tri);
    }

    #[test]
    fn zero_smoothing_borrows() {
        let pts = wobbly_circle(8);
        assert!(matches!(smooth(&pts, 0), Cow::Borrowed(_)));
        assert_eq!(smooth(&pts, 2).len(), 32);
    }

    #[test]
    fn width_estimates() {
        let strip = Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 1.0),
            Point2::new(0.0, 1.0),
        ]);
        let bbox = ContourProcessor::new(ProcessingOptions {
            mm_per_unit: 2.0,
            ..ProcessingOptions::default()
        });
        assert_eq!(bbox.feature_width_mm(&strip), 2.0);

        let ap = ContourProcessor::new(ProcessingOptions {
            width_estimate: WidthEstimate::AreaPerimeter,
            ..ProcessingOptions::default()
        });
        approx::assert_relative_eq!(ap.feature_width_mm(&strip), 20.0 / 22.0, epsilon = 1e-12);
    }
}
