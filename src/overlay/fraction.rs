use geo::{Area, BooleanOps, MultiPolygon};
use ndarray::Array1;

use crate::geom::SourceIndex;

/// Share of each source polygon's area that lies inside one target polygon.
///
/// Only index candidates are stored; every other source is implicitly zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FractionVector {
    len: usize,
    entries: Vec<(usize, f64)>,
}

impl FractionVector {
    /// Number of sources (the dense length, not the number of stored entries).
    #[inline] pub fn len(&self) -> usize { self.len }

    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Fraction for source `i`; zero for sources outside the candidate set.
    pub fn get(&self, i: usize) -> f64 {
        self.entries.binary_search_by_key(&i, |&(j, _)| j)
            .map_or(0.0, |pos| self.entries[pos].1)
    }

    /// Candidate `(source, fraction)` pairs in ascending source order.
    /// Candidates whose geometry misses the target appear with fraction 0.
    #[inline] pub fn entries(&self) -> &[(usize, f64)] { &self.entries }

    /// Expand into a length-N vector.
    pub fn to_dense(&self) -> Array1<f64> {
        let mut dense = Array1::zeros(self.len);
        for &(i, fraction) in &self.entries {
            dense[i] = fraction;
        }
        dense
    }
}

/// Compute intersection-area fractions of `sources` inside `target`.
///
/// `source_areas[i]` must be the area of `sources[i]`. Zero-area sources get
/// fraction 0 rather than 0/0.
pub fn intersecting_fractions(
    target: &MultiPolygon<f64>,
    sources: &[MultiPolygon<f64>],
    source_areas: &[f64],
    index: &SourceIndex,
) -> FractionVector {
    let entries = index.candidates(target).into_iter()
        .map(|i| {
            let area = source_areas[i];
            let fraction = if area > 0.0 {
                sources[i].intersection(target).unsigned_area() / area
            } else {
                0.0
            };
            (i, fraction)
        })
        .collect();

    FractionVector { len: sources.len(), entries }
}
