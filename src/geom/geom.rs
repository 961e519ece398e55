use std::collections::HashSet;

use geo::{Area, BoundingRect, Coord, MultiPolygon, Polygon, Rect};

use crate::{error::{OverlayError, Result}, geom::Crs};

/// An ordered set of polygons, each with a stable identifier, in one CRS.
#[derive(Debug, Clone)]
pub struct PolygonSet {
    ids: Vec<String>,
    shapes: Vec<MultiPolygon<f64>>,
    crs: Option<Crs>,
}

impl PolygonSet {
    /// Construct a set from shapes; identifiers are the positions `"0"`, `"1"`, ...
    pub fn new(shapes: Vec<MultiPolygon<f64>>, crs: Option<Crs>) -> Self {
        Self {
            ids: (0..shapes.len()).map(|i| i.to_string()).collect(),
            shapes,
            crs,
        }
    }

    /// Construct a set from single-part polygons.
    pub fn from_polygons(polygons: Vec<Polygon<f64>>, crs: Option<Crs>) -> Self {
        Self::new(polygons.into_iter().map(|p| MultiPolygon(vec![p])).collect(), crs)
    }

    /// Replace the positional identifiers with explicit keys.
    /// Keys must be unique and there must be one per shape.
    pub fn with_ids(mut self, ids: Vec<String>) -> Result<Self> {
        if ids.len() != self.shapes.len() {
            return Err(OverlayError::LengthMismatch {
                collection: "polygon identifiers",
                expected: self.shapes.len(),
                found: ids.len(),
            })
        }

        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(OverlayError::DuplicateId { collection: "polygon identifiers", id: dup.clone() })
        }

        self.ids = ids;
        Ok(self)
    }

    /// Attach or replace the coordinate reference system without touching coordinates.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Get the number of polygons.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no polygons.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    #[inline] pub fn ids(&self) -> &[String] { &self.ids }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    #[inline] pub fn crs(&self) -> Option<&Crs> { self.crs.as_ref() }

    /// Position of the polygon with identifier `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    /// Planar area of every polygon, in squared CRS units.
    pub fn areas(&self) -> Vec<f64> {
        self.shapes.iter().map(|shape| shape.unsigned_area()).collect()
    }

    /// Compute the bounding rectangle of all polygons.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|shape| shape.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Rebuild the set around new shapes, keeping identifiers.
    pub(crate) fn with_shapes(&self, shapes: Vec<MultiPolygon<f64>>, crs: Crs) -> Self {
        Self { ids: self.ids.clone(), shapes, crs: Some(crs) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn unit_square(x: f64) -> Polygon<f64> {
        polygon![(x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0), (x: x, y: 1.0), (x: x, y: 0.0)]
    }

    #[test]
    fn positional_ids_by_default() {
        let set = PolygonSet::from_polygons(vec![unit_square(0.0), unit_square(2.0)], None);
        assert_eq!(set.ids(), &["0".to_string(), "1".to_string()]);
        assert_eq!(set.position("1"), Some(1));
        assert!(set.crs().is_none());
    }

    #[test]
    fn explicit_ids_are_checked() {
        let set = PolygonSet::from_polygons(vec![unit_square(0.0), unit_square(2.0)], None);

        let err = set.clone().with_ids(vec!["a".into()]).unwrap_err();
        assert!(matches!(err, OverlayError::LengthMismatch { expected: 2, found: 1, .. }));

        let err = set.clone().with_ids(vec!["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, OverlayError::DuplicateId { .. }));

        let set = set.with_ids(vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(set.position("b"), Some(1));
    }

    #[test]
    fn areas_and_bounds() {
        let set = PolygonSet::from_polygons(vec![unit_square(0.0), unit_square(2.0)], None);
        assert_eq!(set.areas(), vec![1.0, 1.0]);

        let bounds = set.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 3.0, y: 1.0 });
    }
}
