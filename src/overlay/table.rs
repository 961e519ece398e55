use ndarray::{Array2, ArrayView1};
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PlSmallStr};

use crate::error::{OverlayError, Result};

/// Attribute columns pulled out of a `DataFrame` into an `N x C` matrix.
#[derive(Debug, Clone)]
pub(crate) struct AttributeMatrix {
    names: Vec<PlSmallStr>,
    values: Array2<f64>,
}

impl AttributeMatrix {
    /// Validate and convert every column of `df` to `f64`.
    /// Fails on non-numeric dtypes and on nulls.
    pub(crate) fn from_frame(df: &DataFrame) -> Result<Self> {
        let mut values = Array2::zeros((df.height(), df.width()));
        let mut names = Vec::with_capacity(df.width());

        for (j, column) in df.get_columns().iter().enumerate() {
            if !is_numeric(column.dtype()) {
                return Err(OverlayError::NonNumericColumn {
                    column: column.name().to_string(),
                    dtype: column.dtype().to_string(),
                })
            }
            if column.null_count() > 0 {
                return Err(OverlayError::NullValues {
                    column: column.name().to_string(),
                    count: column.null_count(),
                })
            }

            let cast = column.cast(&DataType::Float64)?;
            values.column_mut(j).iter_mut()
                .zip(cast.f64()?.into_no_null_iter())
                .for_each(|(slot, value)| *slot = value);
            names.push(column.name().clone());
        }

        Ok(Self { names, values })
    }

    #[inline] pub(crate) fn rows(&self) -> usize { self.values.nrows() }

    #[inline] pub(crate) fn cols(&self) -> usize { self.values.ncols() }

    /// Attribute values of source `i`, one per column.
    #[inline]
    pub(crate) fn row(&self, i: usize) -> ArrayView1<'_, f64> { self.values.row(i) }

    /// Build an output frame with the same column names from an `M x C` matrix.
    pub(crate) fn frame_like(&self, output: &Array2<f64>) -> Result<DataFrame> {
        let columns = self.names.iter().enumerate()
            .map(|(j, name)| Column::new(name.clone(), output.column(j).to_vec()))
            .collect::<Vec<_>>();
        Ok(DataFrame::new(columns)?)
    }
}

/// Integer and floating point dtypes; booleans, strings and temporals are rejected.
fn is_numeric(dtype: &DataType) -> bool {
    matches!(dtype,
        DataType::Int32 | DataType::Int64
        | DataType::UInt32 | DataType::UInt64
        | DataType::Float32 | DataType::Float64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::series::Series;

    #[test]
    fn converts_mixed_numeric_columns() {
        let df = DataFrame::new(vec![
            Column::new("count".into(), &[1i64, 2, 3]),
            Column::new("rate".into(), &[0.5f32, 0.25, 0.125]),
        ]).unwrap();

        let matrix = AttributeMatrix::from_frame(&df).unwrap();
        assert_eq!((matrix.rows(), matrix.cols()), (3, 2));
        assert_eq!(matrix.row(1).to_vec(), vec![2.0, 0.25]);
    }

    #[test]
    fn rejects_strings() {
        let df = DataFrame::new(vec![
            Column::new("count".into(), &[1i64, 2]),
            Column::new("name".into(), &["a", "b"]),
        ]).unwrap();

        let err = AttributeMatrix::from_frame(&df).unwrap_err();
        assert!(matches!(err, OverlayError::NonNumericColumn { ref column, .. } if column == "name"));
    }

    #[test]
    fn rejects_nulls() {
        let df = DataFrame::new(vec![
            Series::new("pop".into(), &[Some(1.0), None, Some(3.0)]).into(),
        ]).unwrap();

        let err = AttributeMatrix::from_frame(&df).unwrap_err();
        assert!(matches!(err, OverlayError::NullValues { count: 1, .. }));
    }

    #[test]
    fn output_keeps_column_names() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[1.0, 2.0]),
            Column::new("b".into(), &[3.0, 4.0]),
        ]).unwrap();
        let matrix = AttributeMatrix::from_frame(&df).unwrap();

        let out = matrix.frame_like(&Array2::from_shape_vec((1, 2), vec![7.0, 8.0]).unwrap()).unwrap();
        assert_eq!(out.get_column_names(), &["a", "b"]);
        assert_eq!(out.height(), 1);
    }
}
