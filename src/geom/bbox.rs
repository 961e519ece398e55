use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{RTreeObject, AABB};

/// R-tree entry: the bounding rectangle of one source polygon and its position
/// in the source set.
#[derive(Debug, Clone)]
pub(super) struct SourceBox {
    source: usize,
    rect: Rect<f64>,
}

impl SourceBox {
    /// Box a source shape; `None` for empty shapes, which have no extent.
    pub(super) fn from_shape(source: usize, shape: &MultiPolygon<f64>) -> Option<Self> {
        shape.bounding_rect().map(|rect| Self { source, rect })
    }

    /// Position of the boxed shape in the source set.
    #[inline] pub(super) fn source(&self) -> usize { self.source }
}

impl RTreeObject for SourceBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        rect_envelope(&self.rect)
    }
}

/// Convert a `geo` rectangle into an R-tree envelope.
#[inline]
pub(super) fn rect_envelope(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(rect.min().into(), rect.max().into())
}
