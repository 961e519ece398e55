//! Error types for the overlay engine.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Overlay errors.
///
/// Every variant except [`OverlayError::Cancelled`] and [`OverlayError::Polars`]
/// is raised during input validation, before any geometry work starts, so a
/// failed run never leaves a partially filled output behind.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Two inputs that must line up row-for-row have different lengths.
    #[error("{collection} has {found} entries, expected {expected}")]
    LengthMismatch {
        collection: &'static str,
        expected: usize,
        found: usize,
    },

    /// An attribute column that cannot be aggregated.
    #[error("attribute column `{column}` is not numeric (dtype {dtype})")]
    NonNumericColumn { column: String, dtype: String },

    /// An attribute column with missing values.
    #[error("attribute column `{column}` has {count} null values")]
    NullValues { column: String, count: usize },

    /// A weight that is negative, NaN or infinite.
    #[error("weight at index {index} is {value}; weights must be finite and non-negative")]
    InvalidWeight { index: usize, value: f64 },

    /// Two polygons in the same set share an identifier.
    #[error("{collection} contains duplicate identifier `{id}`")]
    DuplicateId { collection: &'static str, id: String },

    /// A polygon set has no coordinate reference system attached.
    #[error("{collection} have no coordinate reference system")]
    MissingCrs { collection: &'static str },

    /// A CRS string that could not be understood.
    #[error("unknown coordinate reference system: {0}")]
    UnknownCrs(String),

    /// Building a projection or transforming a coordinate failed.
    #[error("failed to project {collection}: {message}")]
    Projection {
        collection: &'static str,
        message: String,
    },

    /// The caller's cancellation flag was raised between targets.
    #[error("overlay cancelled after {completed} of {total} targets")]
    Cancelled { completed: usize, total: usize },

    /// Building the output table failed.
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl OverlayError {
    /// Mismatched shapes, bad weights or non-numeric attributes.
    pub fn is_input_shape(&self) -> bool {
        matches!(self,
            Self::LengthMismatch { .. }
            | Self::NonNumericColumn { .. }
            | Self::NullValues { .. }
            | Self::InvalidWeight { .. }
            | Self::DuplicateId { .. })
    }

    /// Missing or unusable coordinate reference systems.
    pub fn is_projection(&self) -> bool {
        matches!(self,
            Self::MissingCrs { .. }
            | Self::UnknownCrs(_)
            | Self::Projection { .. })
    }
}

/// Result type for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;
