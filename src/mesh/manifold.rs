use crate::float_types::Real;
use crate::mesh::Mesh;
use nalgebra::Point3;

#[cfg(feature = "hashmap")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashmap"))]
use std::collections::HashMap;

const QUANTIZATION_FACTOR: Real = 1e7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct QuantizedPoint(i64, i64, i64);

#[inline]
pub(crate) fn quantize_point(p: &Point3<Real>) -> QuantizedPoint {
    QuantizedPoint(
        (p.x * QUANTIZATION_FACTOR).round() as i64,
        (p.y * QUANTIZATION_FACTOR).round() as i64,
        (p.z * QUANTIZATION_FACTOR).round() as i64,
    )
}

impl Mesh {
    /// Checks whether the valid triangles form a closed surface.
    ///
    /// ### Returns
    /// Returns `true` if every edge appears exactly 2 times. A closed surface
    /// sliced by a plane that crosses it yields closed contour loops only.
    ///
    /// ### Notes:
    /// - Positions are compared after quantization, so duplicated but coincident
    ///   vertices count as the same corner.
    /// - An empty mesh is not closed.
    pub fn is_closed(&self) -> bool {
        let mut edge_counts: HashMap<(QuantizedPoint, QuantizedPoint), u32> = HashMap::new();

        for [a, b, c] in self.valid_faces() {
            let q = [quantize_point(&a), quantize_point(&b), quantize_point(&c)];
            for &(i0, i1) in &[(0, 1), (1, 2), (2, 0)] {
                let (p0, p1) = (q[i0], q[i1]);
                // Order them so (p0, p1) and (p1, p0) become the same key
                let key = if p0 < p1 { (p0, p1) } else { (p1, p0) };
                *edge_counts.entry(key).or_insert(0) += 1;
            }
        }

        !edge_counts.is_empty() && edge_counts.values().all(|&count| count == 2)
    }
}
