use geo::{BoundingRect, MultiPolygon};
use rstar::RTree;

use super::bbox::{rect_envelope, SourceBox};

/// Bounding-box spatial index over the source polygons.
///
/// Lookups are over-inclusive: a candidate's box touches the query box but its
/// geometry may not overlap the query at all. Callers recheck exact geometry.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    rtree: RTree<SourceBox>,
    len: usize,
}

impl SourceIndex {
    /// Bulk-load an R-tree from the bounding boxes of `shapes`.
    /// Empty shapes have no box and are never returned as candidates.
    pub fn new(shapes: &[MultiPolygon<f64>]) -> Self {
        Self {
            rtree: RTree::bulk_load(shapes.iter().enumerate()
                .filter_map(|(i, shape)| SourceBox::from_shape(i, shape))
                .collect()),
            len: shapes.len(),
        }
    }

    /// Number of source shapes the index was built over, including empty ones.
    #[inline] pub fn len(&self) -> usize { self.len }

    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Positions of every source whose bounding box intersects the bounding
    /// box of `target`, in ascending order.
    pub fn candidates(&self, target: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(rect) = target.bounding_rect() else { return Vec::new() };

        let mut found = self.rtree
            .locate_in_envelope_intersecting(&rect_envelope(&rect))
            .map(SourceBox::source)
            .collect::<Vec<_>>();
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Intersects};

    fn square(x: f64, y: f64, side: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
            (x: x, y: y),
        ]])
    }

    /// An L-shaped polygon whose bounding box covers [0,2]x[0,2] but whose
    /// geometry leaves the upper-right quadrant empty.
    fn ell() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    #[test]
    fn finds_overlapping_boxes_in_order() {
        let sources = vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0), square(0.5, 0.5, 1.0)];
        let index = SourceIndex::new(&sources);
        assert_eq!(index.len(), 3);

        assert_eq!(index.candidates(&square(0.2, 0.2, 0.5)), vec![0, 2]);
        assert_eq!(index.candidates(&square(5.5, 5.5, 0.1)), vec![1]);
    }

    #[test]
    fn disjoint_target_has_no_candidates() {
        let index = SourceIndex::new(&[square(0.0, 0.0, 1.0)]);
        assert!(index.candidates(&square(10.0, 10.0, 1.0)).is_empty());
    }

    #[test]
    fn lookup_is_over_inclusive() {
        let index = SourceIndex::new(&[ell()]);
        let target = square(1.5, 1.5, 0.25);

        // Box hit, geometry miss: the false positive is expected.
        assert_eq!(index.candidates(&target), vec![0]);
        assert!(!ell().intersects(&target));
    }

    #[test]
    fn never_misses_a_true_overlap() {
        let sources = (0..10)
            .flat_map(|i| (0..10).map(move |j| square(i as f64, j as f64, 1.0)))
            .collect::<Vec<_>>();
        let index = SourceIndex::new(&sources);
        let target = square(2.5, 3.5, 2.2);

        let candidates = index.candidates(&target);
        for (i, source) in sources.iter().enumerate() {
            if source.intersects(&target) {
                assert!(candidates.contains(&i), "source {i} overlaps but was not returned");
            }
        }
    }

    #[test]
    fn empty_shapes_are_skipped() {
        let sources = vec![MultiPolygon::<f64>(vec![]), square(0.0, 0.0, 1.0)];
        let index = SourceIndex::new(&sources);
        assert_eq!(index.len(), 2);
        assert_eq!(index.candidates(&square(0.0, 0.0, 1.0)), vec![1]);
        assert!(index.candidates(&MultiPolygon(vec![])).is_empty());
    }
}
